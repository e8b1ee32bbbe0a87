// melody-core/src/lib.rs

//! The core logic for the melody sender.
//! This crate is responsible for melody generation, the serial wire
//! protocol, and driving an HC-06 Bluetooth serial module. It is
//! completely headless and contains no GUI code.

pub mod error;
pub mod link;
pub mod melody;
pub mod note;
pub mod player;
pub mod protocol;
pub mod settings;
pub mod transmit;

pub use error::{Error, Result};
pub use melody::{Melody, MelodyEvent, MelodyParams};
pub use note::Note;
