//! Stdin command grammar.
//!
//! One command per line:
//!
//! ```text
//! open <chat|notifications|quiz> <id>
//! send <text>
//! upload <path> [text]
//! read <item-id>
//! read-all
//! start <question-index>
//! refresh
//! dismiss
//! close
//! quit
//! ```

use std::path::{Path, PathBuf};

use aryu_app::Intent;
use aryu_proto::{AttachmentKind, Resource, ResourceId, ResourceKind};
use thiserror::Error;

/// Reasons a line was not understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// First word is not a command.
    #[error("unknown command {0:?}")]
    Unknown(String),

    /// A required argument is missing.
    #[error("{command}: missing {argument}")]
    MissingArgument {
        /// Command name.
        command: &'static str,
        /// Missing argument.
        argument: &'static str,
    },

    /// An argument should have been a number.
    #[error("not a number: {0:?}")]
    InvalidNumber(String),

    /// Resource kind or id is invalid.
    #[error("invalid resource: {0}")]
    InvalidResource(String),
}

/// A parsed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Forwarded to the runtime as is.
    Intent(Intent),
    /// Needs the file read before it becomes [`Intent::Send`].
    Upload {
        /// File to attach.
        path: PathBuf,
        /// Optional message text.
        body: String,
    },
}

/// Parse one line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let intent = match word {
        "open" => Intent::Open(parse_resource(rest)?),
        "send" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument { command: "send", argument: "text" });
            }
            Intent::Send(aryu_app::Draft::text(rest))
        },
        "upload" => {
            let (path, body) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if path.is_empty() {
                return Err(CommandError::MissingArgument { command: "upload", argument: "path" });
            }
            return Ok(Some(Command::Upload { path: PathBuf::from(path), body: body.trim().into() }));
        },
        "read" => Intent::MarkRead(number(rest, "read", "item id")?),
        "read-all" => Intent::MarkAllRead,
        "start" => Intent::StartQuestion(number(rest, "start", "question index")?),
        "refresh" => Intent::Refresh,
        "dismiss" => Intent::DismissNotice,
        "close" => Intent::Close,
        "quit" | "exit" => Intent::Quit,
        other => return Err(CommandError::Unknown(other.to_owned())),
    };
    Ok(Some(Command::Intent(intent)))
}

/// Parse `<kind> <id>`.
pub fn parse_resource(args: &str) -> Result<Resource, CommandError> {
    let mut words = args.split_whitespace();
    let kind = words
        .next()
        .ok_or(CommandError::MissingArgument { command: "open", argument: "kind" })?;
    let id = words.next().ok_or(CommandError::MissingArgument { command: "open", argument: "id" })?;

    let kind: ResourceKind = kind.parse().map_err(CommandError::InvalidResource)?;
    let id = ResourceId::new(id).map_err(|e| CommandError::InvalidResource(e.to_string()))?;
    Ok(Resource::new(kind, id))
}

fn number<T: std::str::FromStr>(
    raw: &str,
    command: &'static str,
    argument: &'static str,
) -> Result<T, CommandError> {
    if raw.is_empty() {
        return Err(CommandError::MissingArgument { command, argument });
    }
    raw.parse().map_err(|_| CommandError::InvalidNumber(raw.to_owned()))
}

/// Attachment kind from a file extension.
pub fn attachment_kind(path: &Path) -> AttachmentKind {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "webm" | "mp3" | "wav" | "ogg" | "m4a" => AttachmentKind::Audio,
        "png" | "jpg" | "jpeg" | "gif" | "webp" => AttachmentKind::Image,
        _ => AttachmentKind::File,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(line: &str) -> Intent {
        match parse(line) {
            Ok(Some(Command::Intent(intent))) => intent,
            other => panic!("{line:?} parsed as {other:?}"),
        }
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(intent("read-all"), Intent::MarkAllRead);
        assert_eq!(intent("read 12"), Intent::MarkRead(12));
        assert_eq!(intent("start 0"), Intent::StartQuestion(0));
        assert_eq!(intent("  quit  "), Intent::Quit);
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn send_keeps_whole_text() {
        assert_eq!(intent("send hello   there"), Intent::Send(aryu_app::Draft::text("hello   there")));
        assert_eq!(
            parse("send"),
            Err(CommandError::MissingArgument { command: "send", argument: "text" })
        );
    }

    #[test]
    fn open_parses_resource() {
        assert_eq!(intent("open quiz 42"), Intent::Open(Resource::quiz(42)));
        assert!(matches!(parse("open lobby 1"), Err(CommandError::InvalidResource(_))));
        assert!(matches!(parse("open chat"), Err(CommandError::MissingArgument { .. })));
    }

    #[test]
    fn upload_splits_path_and_text() {
        assert_eq!(
            parse("upload notes.pdf see attached"),
            Ok(Some(Command::Upload { path: "notes.pdf".into(), body: "see attached".into() }))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse("read x"), Err(CommandError::InvalidNumber("x".into())));
        assert_eq!(parse("dance"), Err(CommandError::Unknown("dance".into())));
    }

    #[test]
    fn infers_attachment_kind() {
        assert_eq!(attachment_kind(Path::new("note.WEBM")), AttachmentKind::Audio);
        assert_eq!(attachment_kind(Path::new("a.png")), AttachmentKind::Image);
        assert_eq!(attachment_kind(Path::new("syllabus")), AttachmentKind::File);
    }
}
