//! # Wire Protocol Module
//!
//! The HC-06 firmware reads newline-terminated ASCII commands:
//!
//! ```text
//! E,500,250\n   play E for 500 ms, next command follows after 250 ms
//! PAUSE\n       toggle pause/resume on the device
//! ```
//!
//! There are no acknowledgements; a command is fire-and-forget.

use std::fmt;
use std::io::Write;

use crate::error::{Error, Result};
use crate::melody::MelodyEvent;

/// Control line that toggles playback on the device.
pub const PAUSE_LINE: &str = "PAUSE";

/// A single line on the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Note(MelodyEvent),
    Pause,
}

impl Command {
    /// Encodes the command as it goes on the wire, including the trailing newline.
    pub fn encode(&self) -> String {
        format!("{self}\n")
    }

    /// Writes the encoded command to `writer` in a single call.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.encode().as_bytes())
    }

    /// Parses a line (with or without its newline) back into a command.
    pub fn parse_line(line: &str) -> Result<Command> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line == PAUSE_LINE {
            return Ok(Command::Pause);
        }

        let malformed = || Error::MalformedCommand(line.to_string());
        let mut fields = line.split(',');
        let (Some(note), Some(duration), Some(delay), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed());
        };

        Ok(Command::Note(MelodyEvent {
            note: note.parse().map_err(|_| malformed())?,
            duration_ms: duration.parse().map_err(|_| malformed())?,
            delay_ms: delay.parse().map_err(|_| malformed())?,
        }))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Note(event) => write!(f, "{},{},{}", event.note, event.duration_ms, event.delay_ms),
            Command::Pause => f.write_str(PAUSE_LINE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;

    fn event(note: Note, duration_ms: u32, delay_ms: u64) -> MelodyEvent {
        MelodyEvent {
            note,
            duration_ms,
            delay_ms,
        }
    }

    #[test]
    fn note_line_is_comma_separated_with_newline() {
        let cmd = Command::Note(event(Note::E, 500, 250));
        assert_eq!(cmd.encode(), "E,500,250\n");
    }

    #[test]
    fn pause_line() {
        assert_eq!(Command::Pause.encode(), "PAUSE\n");
    }

    #[test]
    fn write_to_emits_exact_bytes() {
        let mut buf = Vec::new();
        Command::Note(event(Note::B, 1, 0)).write_to(&mut buf).unwrap();
        Command::Pause.write_to(&mut buf).unwrap();
        assert_eq!(buf, b"B,1,0\nPAUSE\n");
    }

    #[test]
    fn parses_device_lines() {
        assert_eq!(
            Command::parse_line("G,857,500\n").unwrap(),
            Command::Note(event(Note::G, 857, 500))
        );
        assert_eq!(Command::parse_line("PAUSE\r\n").unwrap(), Command::Pause);
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in ["", "G,857", "G,857,500,1", "H,1,1", "C,-1,5", "C,1,x", "pause"] {
            assert!(
                matches!(Command::parse_line(line), Err(Error::MalformedCommand(_))),
                "accepted {line:?}"
            );
        }
    }
}
