//! Parsing of interactive input lines.

use tutor_primitives::{ExerciseKind, Topic};

pub const HELP: &str = "\
Commands:
  /new <kind> [topic]   start an exercise (kinds: fill-blank, qa, conversation, vocab-match)
  /help                 show this help
  /quit                 leave the tutor
Any other line is sent to the tutor as your answer or message.";

/// One line typed by the learner.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Start a new exercise.
    New { kind: ExerciseKind, topic: Topic },
    /// Forward the text to the session.
    Say(&'a str),
    /// Print the command list.
    Help,
    /// Leave the tutor.
    Quit,
    /// Nothing to do.
    Blank,
    /// A slash command that could not be understood.
    Invalid(String),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Blank;
        }
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Say(line.trim_end_matches(['\r', '\n']));
        };

        let (name, args) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(name, args)| (name, args.trim()));

        match name.to_ascii_lowercase().as_str() {
            "quit" | "exit" => Self::Quit,
            "help" => Self::Help,
            "new" => parse_new(args),
            other => Self::Invalid(format!("unknown command `/{other}`, try /help")),
        }
    }
}

fn parse_new(args: &str) -> Command<'static> {
    let (kind, topic) = args
        .split_once(char::is_whitespace)
        .unwrap_or((args, ""));

    if kind.is_empty() {
        return Command::Invalid("usage: /new <kind> [topic]".to_owned());
    }
    match kind.parse() {
        Ok(kind) => Command::New {
            kind,
            topic: Topic::new(topic),
        },
        Err(err) => Command::Invalid(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_with_topic() {
        assert_eq!(
            Command::parse("/new fill-blank  Paris travel "),
            Command::New {
                kind: ExerciseKind::FillBlank,
                topic: Topic::new("Paris travel"),
            }
        );
    }

    #[test]
    fn new_without_topic_is_open() {
        let Command::New { kind, topic } = Command::parse("/NEW conversation") else {
            panic!("expected /new");
        };
        assert_eq!(kind, ExerciseKind::Conversation);
        assert!(topic.is_open());
    }

    #[test]
    fn new_rejects_unknown_kind() {
        assert!(matches!(Command::parse("/new dictation"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/new"), Command::Invalid(_)));
    }

    #[test]
    fn plain_text_is_forwarded_untrimmed() {
        assert_eq!(Command::parse("  je suis\n"), Command::Say("  je suis"));
        assert_eq!(Command::parse("quit"), Command::Say("quit"));
    }

    #[test]
    fn control_commands() {
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("   "), Command::Blank);
        assert!(matches!(Command::parse("/reset"), Command::Invalid(_)));
    }
}
