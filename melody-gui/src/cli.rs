//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use melody_core::settings::{DEFAULT_SETTINGS_PATH, Settings};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Melody Generator")]
#[command(about = "Generates random melodies and streams them to an HC-06 Bluetooth module", long_about = None)]
pub struct Args {
    /// Serial device of the HC-06 (e.g. COM5 or /dev/rfcomm0)
    #[arg(long, value_name = "ADDRESS")]
    pub port: Option<String>,

    /// Baud rate of the serial link
    #[arg(long, value_name = "RATE")]
    pub baud: Option<u32>,

    /// Settings file used by Save/Load and read at startup
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SETTINGS_PATH)]
    pub settings: PathBuf,
}

impl Args {
    /// Lets explicit flags win over whatever the settings file said.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(port) = &self.port {
            tracing::info!("Address from command line: {}", port);
            settings.address = port.clone();
        }
        if let Some(baud) = self.baud {
            tracing::info!("Baud rate from command line: {}", baud);
            settings.baud_rate = baud;
        }
    }
}
