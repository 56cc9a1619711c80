//! Request composition: what goes to the backend versus what goes into the
//! log for one submission.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use shared::conversation::{non_empty_parts, InlineData, Part, PLACEHOLDER_TEXT};
use shared::session::{DocumentAttachment, ImageAttachment};

/// One submission, split into its backend and display payloads
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedRequest {
    /// Trimmed user text, possibly empty
    pub text: String,
    pub image: Option<InlineData>,
    /// Text, image, document block; empty parts filtered out
    pub submission: Vec<Part>,
    /// Text and image only. The document never shows up in the log.
    pub display: Vec<Part>,
}

impl ComposedRequest {
    /// `None` when there is nothing to send at all.
    pub fn compose(
        text: &str,
        image: Option<&ImageAttachment>,
        document: Option<&DocumentAttachment>,
    ) -> Option<Self> {
        let text = text.trim().to_string();
        let image = image.map(|image| InlineData {
            mime_type: image.mime_type.clone(),
            data: BASE64.encode(&image.bytes),
        });

        let text_part = Part::Text(text.clone());
        let image_part = image.clone().map(Part::InlineData);
        let submission = non_empty_parts(
            std::iter::once(text_part.clone())
                .chain(image_part.clone())
                .chain(document.map(DocumentAttachment::to_part)),
        );
        if submission.is_empty() {
            return None;
        }

        let mut display = non_empty_parts(std::iter::once(text_part).chain(image_part));
        if display.is_empty() {
            display.push(Part::text(PLACEHOLDER_TEXT));
        }

        Some(Self {
            text,
            image,
            submission,
            display,
        })
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// A single text part and no attachments.
    pub fn is_plain_text(&self) -> bool {
        matches!(self.submission.as_slice(), [Part::Text(_)])
    }

    /// Image together with text, which goes to the image editor.
    pub fn is_image_with_text(&self) -> bool {
        self.image.is_some() && self.has_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> ImageAttachment {
        ImageAttachment {
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
            mime_type: "image/png".into(),
        }
    }

    fn doc() -> DocumentAttachment {
        DocumentAttachment {
            name: "notes.txt".into(),
            text_content: "meeting at noon".into(),
        }
    }

    #[test]
    fn test_nothing_to_send() {
        assert!(ComposedRequest::compose("   ", None, None).is_none());
    }

    #[test]
    fn test_plain_text() {
        let request = ComposedRequest::compose(" hello ", None, None).unwrap();
        assert_eq!(request.text, "hello");
        assert!(request.is_plain_text());
        assert_eq!(request.display, vec![Part::text("hello")]);
    }

    #[test]
    fn test_document_is_sent_but_not_displayed() {
        let request = ComposedRequest::compose("what time?", None, Some(&doc())).unwrap();
        assert_eq!(request.submission.len(), 2);
        assert!(request.submission[1]
            .as_text()
            .unwrap()
            .contains("--- Document Content: notes.txt ---"));
        assert_eq!(request.display, vec![Part::text("what time?")]);
        assert!(!request.is_plain_text());
    }

    #[test]
    fn test_document_only_displays_placeholder() {
        let request = ComposedRequest::compose("", None, Some(&doc())).unwrap();
        assert_eq!(request.submission.len(), 1);
        assert_eq!(request.display, vec![Part::text(PLACEHOLDER_TEXT)]);
        assert!(!request.has_text());
    }

    #[test]
    fn test_image_is_base64_encoded() {
        let request = ComposedRequest::compose("make it blue", Some(&png()), None).unwrap();
        let image = request.image.as_ref().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw==");
        assert!(request.is_image_with_text());
        assert_eq!(request.display.len(), 2);
    }

    #[test]
    fn test_image_without_text() {
        let request = ComposedRequest::compose("", Some(&png()), None).unwrap();
        assert!(!request.is_image_with_text());
        assert!(!request.is_plain_text());
        assert_eq!(request.display.len(), 1);
        assert!(request.display[0].is_image());
    }
}
