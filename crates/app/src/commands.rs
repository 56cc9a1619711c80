//! Slash-command parsing for the terminal session.

use std::path::PathBuf;

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text, submitted as-is
    Send(String),
    Capabilities,
    Activate(String),
    CancelCapability,
    /// Abort the running request
    Stop,
    Attach(PathBuf),
    Detach,
    /// Switch model, or list the catalog when no name is given
    Model(Option<String>),
    Shorten(usize),
    Summarize(usize),
    Edit(usize),
    Choose(usize),
    Surprise,
    New,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  /caps              list capability modes
  /cap <id>          activate a capability mode
  /cancel            leave the current mode (and persona)
  /stop              abort the running request
  /attach <path>     attach an image or a .txt/.md document
  /detach            remove attachments
  /model [name]      switch model, or list models
  /shorten <n>       shorten turn n
  /summarize <n>     summarize turn n
  /edit <n>          drop turn n and everything after it, to re-send it
  /choose <n>        pick choice n of the current story
  /surprise          start a random story
  /new               start a new conversation
  /quit              exit
Anything else is sent as a message.";

/// Turn numbers are shown 1-based; return the 0-based index.
fn turn_number(command: &str, arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("usage: /{} <number>", command)),
    }
}

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Send(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "caps" => Ok(Command::Capabilities),
        "cap" if !arg.is_empty() => Ok(Command::Activate(arg.to_string())),
        "cap" => Err("usage: /cap <id>".into()),
        "cancel" => Ok(Command::CancelCapability),
        "stop" => Ok(Command::Stop),
        "attach" if !arg.is_empty() => Ok(Command::Attach(PathBuf::from(arg))),
        "attach" => Err("usage: /attach <path>".into()),
        "detach" => Ok(Command::Detach),
        "model" => Ok(Command::Model((!arg.is_empty()).then(|| arg.to_string()))),
        "shorten" => turn_number(name, arg).map(Command::Shorten),
        "summarize" => turn_number(name, arg).map(Command::Summarize),
        "edit" => turn_number(name, arg).map(Command::Edit),
        "choose" => turn_number(name, arg).map(Command::Choose),
        "surprise" => Ok(Command::Surprise),
        "new" => Ok(Command::New),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command /{} (try /help)", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_sent() {
        assert_eq!(
            parse("  what's new?  "),
            Ok(Command::Send("what's new?".into()))
        );
        assert_eq!(parse(""), Ok(Command::Send(String::new())));
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(
            parse("/cap web_search"),
            Ok(Command::Activate("web_search".into()))
        );
        assert_eq!(
            parse("/attach ~/Pictures/cat one.png"),
            Ok(Command::Attach(PathBuf::from("~/Pictures/cat one.png")))
        );
        assert_eq!(
            parse("/model AIVAN Pro"),
            Ok(Command::Model(Some("AIVAN Pro".into())))
        );
        assert_eq!(parse("/model"), Ok(Command::Model(None)));
    }

    #[test]
    fn test_turn_numbers_are_one_based() {
        assert_eq!(parse("/edit 3"), Ok(Command::Edit(2)));
        assert_eq!(parse("/choose 1"), Ok(Command::Choose(0)));
        assert!(parse("/shorten 0").is_err());
        assert!(parse("/summarize x").is_err());
    }

    #[test]
    fn test_unknown_and_incomplete() {
        assert!(parse("/cap").is_err());
        assert!(parse("/fly").unwrap_err().contains("unknown command"));
        assert_eq!(parse("/exit"), Ok(Command::Quit));
    }
}
