//! # Note Module
//!
//! The fixed set of natural notes the HC-06 firmware understands.
//! Notes travel over the wire as their bare letter, so `Display` and
//! `FromStr` are the wire representation.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A natural note of the C major scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Note {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Note {
    /// Every note a melody can be built from, in scale order.
    pub const ALL: [Note; 7] = [Note::C, Note::D, Note::E, Note::F, Note::G, Note::A, Note::B];

    /// The letter sent over the serial link.
    pub fn letter(self) -> &'static str {
        match self {
            Note::C => "C",
            Note::D => "D",
            Note::E => "E",
            Note::F => "F",
            Note::G => "G",
            Note::A => "A",
            Note::B => "B",
        }
    }

    /// Position in the scale (0 for C through 6 for B).
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for Note {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Note::ALL
            .iter()
            .copied()
            .find(|note| note.letter() == s)
            .ok_or_else(|| Error::invalid("note", s, "expected one of C D E F G A B"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_parse_back_to_the_same_note() {
        for note in Note::ALL {
            assert_eq!(note.to_string().parse::<Note>().unwrap(), note);
        }
    }

    #[test]
    fn index_follows_scale_order() {
        let indices: Vec<usize> = Note::ALL.iter().map(|n| n.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn sharps_and_lowercase_are_rejected() {
        assert!("C#".parse::<Note>().is_err());
        assert!("c".parse::<Note>().is_err());
        assert!("".parse::<Note>().is_err());
    }
}
