//! # UI Module
//!
//! This module contains all UI components for the Melody Generator application.

pub mod main_display;
pub mod note_strip;
