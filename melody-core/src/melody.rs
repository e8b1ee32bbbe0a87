//! # Melody Generation Module
//!
//! Builds the note sequences that get streamed to the device. A melody is
//! a flat list of `(note, duration, delay)` triples: notes are picked
//! uniformly at random from [`Note::ALL`], every note shares the duration
//! derived from tempo and speed factor, and every note is followed by the
//! same fixed delay.
//!
//! Melodies are throwaway values; they are generated for a single send
//! and dropped afterwards.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};
use crate::note::Note;

/// Milliseconds in one minute, the numerator of the beat length formula.
const MS_PER_MINUTE: f64 = 60_000.0;

/// Longest melody [`generate_with_rng`] will build, in notes.
pub const MAX_MELODY_LENGTH: u32 = 10_000;

/// One note command: which note, how long it sounds, how long to wait after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MelodyEvent {
    pub note: Note,
    pub duration_ms: u32,
    pub delay_ms: u64,
}

/// Parameters for a single melody.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MelodyParams {
    /// Number of notes to generate.
    pub length: u32,
    /// Tempo in beats per minute.
    pub tempo: u32,
    /// Pause after every note, in milliseconds.
    pub delay_ms: u64,
    /// Multiplier applied to the tempo before the beat length is computed.
    pub speed_factor: f64,
}

impl Default for MelodyParams {
    fn default() -> Self {
        Self {
            length: 10,
            tempo: 120,
            delay_ms: 500,
            speed_factor: 1.0,
        }
    }
}

/// An ordered sequence of note events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Melody {
    events: Vec<MelodyEvent>,
}

impl Melody {
    pub fn new(events: Vec<MelodyEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[MelodyEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MelodyEvent> {
        self.events.iter()
    }

    /// Total wall-clock time the melody occupies on the link (sum of delays).
    pub fn total_delay_ms(&self) -> u64 {
        self.events.iter().map(|e| e.delay_ms).sum()
    }
}

impl<'a> IntoIterator for &'a Melody {
    type Item = &'a MelodyEvent;
    type IntoIter = std::slice::Iter<'a, MelodyEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Calculates the note duration for a tempo and speed factor.
///
/// The duration is one beat at the effective tempo:
/// `round(60000 / (tempo * speed_factor))` milliseconds.
///
/// # Errors
/// * `InvalidInput` for a zero tempo, a speed factor that is not a positive
///   finite number, or a duration too long to express in `u32` milliseconds.
pub fn note_duration_ms(tempo: u32, speed_factor: f64) -> Result<u32> {
    if tempo == 0 {
        return Err(Error::invalid("tempo", "0", "must be greater than zero"));
    }
    if !speed_factor.is_finite() || speed_factor <= 0.0 {
        return Err(Error::invalid(
            "speed factor",
            speed_factor.to_string(),
            "must be a positive number",
        ));
    }

    let duration = (MS_PER_MINUTE / (f64::from(tempo) * speed_factor)).round();
    if duration > f64::from(u32::MAX) {
        return Err(Error::invalid(
            "speed factor",
            speed_factor.to_string(),
            "note duration is too long",
        ));
    }
    Ok(duration as u32)
}

/// Generates a melody using the thread-local RNG.
///
/// Note selection is unseeded; two calls with the same parameters will
/// almost certainly produce different melodies.
pub fn generate(params: &MelodyParams) -> Result<Melody> {
    generate_with_rng(params, &mut rand::thread_rng())
}

/// Generates a melody drawing notes from the supplied RNG.
///
/// # Errors
/// * `InvalidInput` for a length above [`MAX_MELODY_LENGTH`], or any
///   error from [`note_duration_ms`].
pub fn generate_with_rng<R: Rng + ?Sized>(params: &MelodyParams, rng: &mut R) -> Result<Melody> {
    if params.length > MAX_MELODY_LENGTH {
        return Err(Error::invalid(
            "length",
            params.length.to_string(),
            format!("at most {MAX_MELODY_LENGTH} notes"),
        ));
    }
    let duration_ms = note_duration_ms(params.tempo, params.speed_factor)?;

    let events = (0..params.length)
        .map(|_| MelodyEvent {
            // ALL is a non-empty constant, so choose always yields a note
            note: *Note::ALL.choose(rng).unwrap_or(&Note::C),
            duration_ms,
            delay_ms: params.delay_ms,
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        "Generated melody: {} notes, {} ms each, {} ms apart",
        events.len(),
        duration_ms,
        params.delay_ms
    );

    Ok(Melody::new(events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn params(length: u32, tempo: u32, delay_ms: u64, speed_factor: f64) -> MelodyParams {
        MelodyParams {
            length,
            tempo,
            delay_ms,
            speed_factor,
        }
    }

    #[test]
    fn melody_length_matches_requested_count() {
        for length in [0, 1, 7, 64] {
            let melody = generate(&params(length, 120, 500, 1.0)).unwrap();
            assert_eq!(melody.len(), length as usize);
        }
    }

    #[test]
    fn every_event_shares_duration_and_delay() {
        let melody = generate(&params(32, 90, 250, 1.5)).unwrap();
        let expected = (60_000.0_f64 / (90.0 * 1.5)).round() as u32;
        assert_eq!(expected, 444);
        for event in &melody {
            assert_eq!(event.duration_ms, expected);
            assert_eq!(event.delay_ms, 250);
        }
    }

    #[test]
    fn duration_rounds_to_nearest_millisecond() {
        assert_eq!(note_duration_ms(120, 1.0).unwrap(), 500);
        assert_eq!(note_duration_ms(7, 1.0).unwrap(), 8571); // 8571.43
        assert_eq!(note_duration_ms(110, 1.0).unwrap(), 545); // 545.45
        assert_eq!(note_duration_ms(70, 1.0).unwrap(), 857); // 857.14
        assert_eq!(note_duration_ms(160, 1.5).unwrap(), 250);
        assert_eq!(note_duration_ms(90, 0.7).unwrap(), 952); // 952.38
        assert_eq!(note_duration_ms(180, 0.7).unwrap(), 476); // 476.19
        assert_eq!(note_duration_ms(130, 1.0).unwrap(), 462); // 461.54
    }

    #[test]
    fn zero_tempo_is_rejected() {
        assert!(matches!(
            note_duration_ms(0, 1.0),
            Err(Error::InvalidInput { field: "tempo", .. })
        ));
    }

    #[test]
    fn non_positive_speed_factor_is_rejected() {
        for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                note_duration_ms(120, factor),
                Err(Error::InvalidInput { field: "speed factor", .. })
            ));
        }
    }

    #[test]
    fn absurdly_slow_speed_factor_is_rejected() {
        assert!(note_duration_ms(1, 1e-9).is_err());
    }

    #[test]
    fn huge_length_is_rejected_before_allocating() {
        let err = generate(&params(4_000_000_000, 120, 500, 1.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { field: "length", .. }), "{err:?}");
        assert_eq!(
            err.to_string(),
            "Invalid length '4000000000': at most 10000 notes"
        );
    }

    #[test]
    fn longest_allowed_melody_is_generated() {
        let melody = generate(&params(MAX_MELODY_LENGTH, 120, 0, 1.0)).unwrap();
        assert_eq!(melody.len(), MAX_MELODY_LENGTH as usize);
    }

    #[test]
    fn notes_come_from_the_fixed_scale() {
        let mut rng = StdRng::seed_from_u64(7);
        let melody = generate_with_rng(&params(500, 120, 0, 1.0), &mut rng).unwrap();
        let allowed: HashSet<Note> = Note::ALL.into_iter().collect();
        let seen: HashSet<Note> = melody.iter().map(|e| e.note).collect();
        assert!(seen.is_subset(&allowed));
        // 500 uniform draws over 7 notes cover the whole scale
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn same_seed_gives_same_melody() {
        let p = params(20, 120, 100, 1.0);
        let a = generate_with_rng(&p, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = generate_with_rng(&p, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn total_delay_sums_every_gap() {
        let melody = generate(&params(4, 120, 250, 1.0)).unwrap();
        assert_eq!(melody.total_delay_ms(), 1000);
    }
}
