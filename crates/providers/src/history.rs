//! Conversion of the turn log into backend contents.

use shared::conversation::Turn;

use crate::gemini::{GeminiContent, GeminiPart};

/// Turns without sendable parts are skipped and consecutive turns of the
/// same role are merged into one content entry.
pub(crate) fn to_contents(turns: &[Turn]) -> Vec<GeminiContent> {
    let mut contents: Vec<GeminiContent> = Vec::new();
    for turn in turns.iter().filter(|t| !t.is_transient) {
        let parts: Vec<GeminiPart> = turn.parts.iter().filter_map(GeminiPart::from_part).collect();
        if parts.is_empty() {
            continue;
        }
        let role = turn.role.as_str();
        match contents.last_mut() {
            Some(last) if last.role.as_deref() == Some(role) => last.parts.extend(parts),
            _ => contents.push(GeminiContent {
                role: Some(role.to_string()),
                parts,
            }),
        }
    }
    contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::conversation::Part;

    #[test]
    fn test_merges_consecutive_roles() {
        let turns = vec![
            Turn::banner("Activating mode: Recipe generator"),
            Turn::model_text("What's in your fridge?"),
            Turn::user(vec![Part::text("eggs"), Part::inline("image/png", "AAAA")]),
            Turn::model_text("Omelette!"),
        ];
        let contents = to_contents(&turns);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role.as_deref(), Some("model"));
        assert_eq!(contents[0].parts.len(), 2);
        assert_eq!(contents[1].parts.len(), 2);
        assert!(contents[1].parts[1].inline_data.is_some());
    }

    #[test]
    fn test_skips_empty_and_video_only_turns() {
        let turns = vec![
            Turn::user(vec![Part::text("")]),
            Turn::model(vec![Part::video("https://files.example/v.mp4")]),
            Turn::user(vec![Part::text("hello")]),
            Turn::transient("Processing..."),
        ];
        let contents = to_contents(&turns);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].parts[0].text.as_deref(), Some("hello"));
    }
}
