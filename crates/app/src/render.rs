//! Plain-text rendering of conversation turns, driven by session events.

use std::fmt::Write as _;
use std::sync::Arc;

use orchestrator::Orchestrator;
use shared::conversation::{InteractiveElement, Part, Role, Turn};
use shared::events::SessionEvent;
use tokio::sync::mpsc;

/// Approximate decoded size of a base64 payload
fn decoded_len(data: &str) -> usize {
    data.len() / 4 * 3
}

fn describe_part(part: &Part) -> Option<String> {
    match part {
        Part::Text(text) if text.is_empty() => None,
        Part::Text(text) => Some(text.clone()),
        Part::InlineData(inline) => Some(format!(
            "[{} attachment, {} KB]",
            inline.mime_type,
            decoded_len(&inline.data).div_ceil(1024)
        )),
        Part::VideoRef(uri) => Some(format!("[video] {}", uri)),
    }
}

/// One turn, numbered 1-based as the commands expect.
pub fn format_turn(index: usize, turn: &Turn) -> String {
    let mut out = String::new();
    if turn.is_transient {
        for part in turn.parts.iter().filter_map(describe_part) {
            let _ = writeln!(out, "  ... {}", part);
        }
        return out;
    }

    let speaker = match turn.role {
        Role::User => "You",
        Role::Model if turn.is_capability_activation => "--",
        Role::Model => "AIVAN",
    };
    let body: Vec<String> = turn.parts.iter().filter_map(describe_part).collect();
    let _ = writeln!(out, "[{}] {}: {}", index + 1, speaker, body.join("\n    "));

    if let Some(grounding) = &turn.grounding {
        let _ = writeln!(out, "    Sources:");
        for (n, source) in grounding.sources.iter().enumerate() {
            let _ = writeln!(out, "      {}. {} <{}>", n + 1, source.title, source.uri);
        }
    }
    if let Some(pages) = &turn.story_pages {
        for (n, page) in pages.iter().enumerate() {
            let illustrated = if page.is_resolved() { " [illustrated]" } else { "" };
            let _ = writeln!(out, "    Page {}: {}{}", n + 1, page.text, illustrated);
        }
    }
    if let Some(story) = &turn.story {
        for (n, choice) in story.choices.iter().enumerate() {
            let _ = writeln!(out, "    {}) {}", n + 1, choice);
        }
    }
    match turn.interactive_element {
        Some(InteractiveElement::StoryChoice) => {
            let _ = writeln!(out, "    (pick one with /choose <n>)");
        }
        Some(InteractiveElement::UploadImage) => {
            let _ = writeln!(out, "    (attach an image with /attach <path>)");
        }
        Some(InteractiveElement::SurpriseMeStory) => {
            let _ = writeln!(out, "    (or /surprise for a random story)");
        }
        None => {}
    }
    out
}

fn print_turn(orchestrator: &Orchestrator, event: &SessionEvent) {
    let SessionEvent::TurnAppended { created_at } = event else {
        return;
    };
    let snapshot = orchestrator.snapshot();
    if let Some((index, turn)) = snapshot
        .turns
        .iter()
        .enumerate()
        .find(|(_, t)| t.created_at == *created_at)
    {
        // Own turns are already on screen as typed input
        if turn.role != Role::User {
            print!("{}", format_turn(index, turn));
        }
    }
}

/// Print turns as they land until the channel closes.
pub async fn run(orchestrator: Arc<Orchestrator>, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        match &event {
            SessionEvent::TurnAppended { .. } => print_turn(&orchestrator, &event),
            SessionEvent::LogTruncated { len } => {
                println!("  (conversation cut back to {} turns)", len)
            }
            SessionEvent::CapabilityChanged { active: None } => println!("  (mode off)"),
            SessionEvent::SessionReset => println!("  (new conversation)"),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::conversation::{Citations, StoryGraph, WebSource};

    #[test]
    fn test_format_model_turn_with_sources() {
        let turn = Turn::model_text("Rust 1.80 is out").with_grounding(Some(Citations {
            sources: vec![WebSource {
                uri: "https://blog.rust-lang.org".into(),
                title: "Rust Blog".into(),
            }],
        }));
        let text = format_turn(2, &turn);
        assert!(text.starts_with("[3] AIVAN: Rust 1.80 is out"));
        assert!(text.contains("1. Rust Blog <https://blog.rust-lang.org>"));
    }

    #[test]
    fn test_format_story_choices() {
        let turn = Turn::model_text("You reach a fork.")
            .with_story(Some(StoryGraph {
                text: "You reach a fork.".into(),
                choices: vec!["Left".into(), "Right".into(), "Back".into()],
            }))
            .with_interactive(Some(InteractiveElement::StoryChoice));
        let text = format_turn(0, &turn);
        assert!(text.contains("    2) Right"));
        assert!(text.contains("/choose"));
    }

    #[test]
    fn test_format_media_and_banner() {
        let image = Turn::model(vec![Part::inline("image/png", "A".repeat(4096))]);
        assert!(format_turn(0, &image).contains("[image/png attachment, 3 KB]"));

        let banner = Turn::banner("Activating mode: Web Search");
        assert_eq!(format_turn(4, &banner), "[5] --: Activating mode: Web Search\n");

        let working = Turn::transient("Processing...");
        assert_eq!(format_turn(0, &working), "  ... Processing...\n");
    }
}
