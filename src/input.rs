//! Interactive command surface
//!
//! One recognized line form: `send <message>`. Anything else — including a
//! bare `send` with no space — is rejected and the input loop continues.

use bytes::Bytes;

/// A parsed stdin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Transmit `message` to the peer, one data unit per character
    Send(String),
}

/// Parse one input line.
///
/// The command word is everything before the first space; the message is
/// everything after it, verbatim (it may be empty).
pub fn parse_command(line: &str) -> Option<Command> {
    let (command, message) = line.split_once(' ')?;
    if command != "send" {
        return None;
    }
    Some(Command::Send(message.to_string()))
}

/// Split a message into the ordered data units admitted to the window —
/// one unit per character, in input order.
pub fn packetize(message: &str) -> Vec<Bytes> {
    message
        .chars()
        .map(|c| Bytes::from(c.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_line_parses() {
        assert_eq!(
            parse_command("send hello"),
            Some(Command::Send("hello".into()))
        );
    }

    #[test]
    fn message_kept_verbatim() {
        assert_eq!(
            parse_command("send two  spaces "),
            Some(Command::Send("two  spaces ".into()))
        );
    }

    #[test]
    fn empty_message_allowed() {
        assert_eq!(parse_command("send "), Some(Command::Send(String::new())));
    }

    #[test]
    fn unrecognized_lines_rejected() {
        assert_eq!(parse_command("send"), None);
        assert_eq!(parse_command("sendx hi"), None);
        assert_eq!(parse_command("recv hi"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn packetize_is_per_character() {
        let units = packetize("hi!");
        assert_eq!(units, vec![Bytes::from("h"), Bytes::from("i"), Bytes::from("!")]);
        assert!(packetize("").is_empty());
    }
}
