//! # Transmission Module
//!
//! Streams a melody over an already-open connection. Each event is written
//! as one protocol line, then the sender waits for the event's delay before
//! moving on. There is no acknowledgement and no flow control: the first
//! failed write aborts everything that follows.
//!
//! How the wait happens is up to a [`Pacer`]. [`SleepPacer`] simply blocks
//! the calling thread; the player worker uses a pacer that keeps listening
//! for commands while it waits.

use std::io::Write;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::melody::{Melody, MelodyEvent};
use crate::protocol::Command;

/// Whether a transmission should keep going after a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Outcome of a transmission that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transmission {
    /// Number of note lines written.
    pub sent: usize,
    /// True when the pacer stopped the melody before its end.
    pub stopped: bool,
}

/// Decides how the sender waits between notes.
pub trait Pacer<W: Write + ?Sized> {
    /// Called after each note line has been written.
    fn note_sent(&mut self, _index: usize, _event: &MelodyEvent) {}

    /// Waits out `delay`. The connection is lent so the pacer can write
    /// out-of-band commands (PAUSE) while waiting.
    fn wait(&mut self, writer: &mut W, delay: Duration) -> Result<Flow>;
}

/// Blocks the calling thread for the whole delay.
#[derive(Debug, Default, Clone, Copy)]
pub struct SleepPacer;

impl<W: Write + ?Sized> Pacer<W> for SleepPacer {
    fn wait(&mut self, _writer: &mut W, delay: Duration) -> Result<Flow> {
        std::thread::sleep(delay);
        Ok(Flow::Continue)
    }
}

/// Writes every event of `melody` to `writer`, pacing with `pacer`.
///
/// # Errors
/// * `Write { index, .. }` on the first failed write. Notes after `index`
///   are never sent.
/// * Whatever the pacer returns from `wait`.
pub fn send_melody<W, P>(writer: &mut W, melody: &Melody, pacer: &mut P) -> Result<Transmission>
where
    W: Write + ?Sized,
    P: Pacer<W> + ?Sized,
{
    let mut sent = 0;
    for (index, event) in melody.iter().enumerate() {
        Command::Note(*event)
            .write_to(writer)
            .and_then(|_| writer.flush())
            .map_err(|source| Error::Write { index, source })?;
        sent += 1;
        tracing::trace!("Sent note {}: {}", index, Command::Note(*event));
        pacer.note_sent(index, event);

        if pacer.wait(writer, Duration::from_millis(event.delay_ms))? == Flow::Stop {
            tracing::debug!("Transmission stopped after {} of {} notes", sent, melody.len());
            return Ok(Transmission { sent, stopped: true });
        }
    }
    Ok(Transmission { sent, stopped: false })
}

/// Sends the out-of-band pause/resume toggle.
pub fn send_pause<W: Write + ?Sized>(writer: &mut W) -> Result<()> {
    Command::Pause.write_to(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;
    use std::io;

    /// Accepts a fixed number of writes, then fails every one after.
    struct FailingWriter {
        written: Vec<u8>,
        writes_left: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.writes_left == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link dropped"));
            }
            self.writes_left -= 1;
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingPacer {
        waits: Vec<Duration>,
        stop_after: Option<usize>,
        pause_on_wait: Option<usize>,
    }

    impl<W: Write + ?Sized> Pacer<W> for RecordingPacer {
        fn wait(&mut self, writer: &mut W, delay: Duration) -> Result<Flow> {
            self.waits.push(delay);
            if self.pause_on_wait == Some(self.waits.len()) {
                send_pause(writer)?;
            }
            match self.stop_after {
                Some(n) if self.waits.len() >= n => Ok(Flow::Stop),
                _ => Ok(Flow::Continue),
            }
        }
    }

    fn melody(notes: &[Note], delay_ms: u64) -> Melody {
        Melody::new(
            notes
                .iter()
                .map(|&note| MelodyEvent {
                    note,
                    duration_ms: 500,
                    delay_ms,
                })
                .collect(),
        )
    }

    #[test]
    fn writes_one_line_per_note_and_waits_each_delay() {
        let mut out = Vec::new();
        let mut pacer = RecordingPacer::default();
        let result = send_melody(&mut out, &melody(&[Note::C, Note::G, Note::A], 250), &mut pacer).unwrap();

        assert_eq!(result, Transmission { sent: 3, stopped: false });
        assert_eq!(String::from_utf8(out).unwrap(), "C,500,250\nG,500,250\nA,500,250\n");
        assert_eq!(pacer.waits, vec![Duration::from_millis(250); 3]);
    }

    #[test]
    fn aborts_on_first_write_error() {
        let mut out = FailingWriter {
            written: Vec::new(),
            writes_left: 2,
        };
        let mut pacer = RecordingPacer::default();
        let err = send_melody(&mut out, &melody(&[Note::C, Note::D, Note::E, Note::F], 10), &mut pacer)
            .unwrap_err();

        assert!(matches!(err, Error::Write { index: 2, .. }));
        assert_eq!(String::from_utf8(out.written).unwrap(), "C,500,10\nD,500,10\n");
        // no wait after the failed note
        assert_eq!(pacer.waits.len(), 2);
    }

    #[test]
    fn pacer_can_stop_early() {
        let mut out = Vec::new();
        let mut pacer = RecordingPacer {
            stop_after: Some(1),
            ..Default::default()
        };
        let result = send_melody(&mut out, &melody(&[Note::B, Note::B, Note::B], 0), &mut pacer).unwrap();

        assert_eq!(result, Transmission { sent: 1, stopped: true });
        assert_eq!(out, b"B,500,0\n");
    }

    #[test]
    fn pacer_can_interleave_pause() {
        let mut out = Vec::new();
        let mut pacer = RecordingPacer {
            pause_on_wait: Some(1),
            ..Default::default()
        };
        send_melody(&mut out, &melody(&[Note::E, Note::F], 0), &mut pacer).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "E,500,0\nPAUSE\nF,500,0\n");
    }

    #[test]
    fn empty_melody_sends_nothing() {
        let mut out = Vec::new();
        let result = send_melody(&mut out, &Melody::default(), &mut SleepPacer).unwrap();
        assert_eq!(result.sent, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn sleep_pacer_sends_everything() {
        let mut out = Vec::new();
        let result = send_melody(&mut out, &melody(&[Note::C, Note::D], 1), &mut SleepPacer).unwrap();
        assert_eq!(result.sent, 2);
    }
}
