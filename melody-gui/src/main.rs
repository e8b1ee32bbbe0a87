//! # Melody Generator - HC-06 Melody Sender GUI
//!
//! This module contains the main GUI application. It lets the user connect
//! to an HC-06 Bluetooth serial module, generate a random melody from the
//! form values, and stream it to the device.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Player Thread**: owns the serial connection and plays melodies
//! - **Communication**: Crossbeam channels wrapped by `PlayerHandle`
//! - **Updates**: 60 FPS timer subscription polls player events

mod cli;
mod ui;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use iced::{Element, Subscription, Task, Theme};
use melody_core::link::{self, SerialConnector};
use melody_core::player::{Action, PlayerCommand, PlayerEvent, PlayerHandle};
use melody_core::settings::{MelodyForm, Settings};
use melody_core::{Error, Note, melody};
use ui::main_display::create_main_view;

/// Main entry point for the Melody Generator application.
pub fn main() -> iced::Result {
    tracing_subscriber::fmt::init();
    let args = cli::Args::parse();

    tracing::info!("Starting Melody Generator...");
    let result = iced::application("Melody Generator", MelodyApp::update, MelodyApp::view)
        .subscription(MelodyApp::subscription)
        .theme(MelodyApp::theme)
        .run_with(move || (MelodyApp::new(&args), Task::none()));
    tracing::info!("Application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    // Form edits
    AddressChanged(String),
    LengthChanged(String),
    TempoChanged(String),
    DelayChanged(String),
    SpeedFactorChanged(String),

    // Connection
    Connect,
    Disconnect,
    FindHc06,

    // Melody
    GenerateAndSend,
    PauseResume,

    // Settings file
    SaveSettings,
    LoadSettings,

    DismissPopup,

    // Continuous update message
    Tick,
}

/// A modal message box.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub message: String,
}

/// Progress of the melody currently on the link.
#[derive(Debug, Clone, PartialEq)]
pub enum Playback {
    Idle,
    Playing {
        sent: usize,
        total: usize,
        /// Toggled by every PAUSE sent; the device owns the real state.
        paused: bool,
    },
}

/// UI-specific data needed for rendering the interface.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub address: String,
    pub form: MelodyForm,
    pub connected_to: Option<String>,
    pub playback: Playback,
    pub last_note: Option<Note>,
    /// Shown one at a time, oldest first.
    pub popups: VecDeque<Popup>,
}

/// Main application state.
#[derive(Debug)]
struct MelodyApp {
    player: Option<PlayerHandle>,
    baud_rate: u32,
    settings_path: PathBuf,

    // Single source of truth for all display data
    display_data: AppDisplayData,
}

impl MelodyApp {
    /// Builds the initial state: settings file, command line overrides,
    /// then the player thread.
    fn new(args: &cli::Args) -> Self {
        let mut popups = VecDeque::new();

        let mut settings = match load_initial_settings(&args.settings) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("{:#}", e);
                popups.push_back(Popup {
                    title: "Settings".to_string(),
                    message: format!("{e:#}"),
                });
                Settings::default()
            }
        };
        args.apply_overrides(&mut settings);

        tracing::info!("Starting player thread...");
        let player = match PlayerHandle::spawn(SerialConnector::default())
            .context("Could not start the player thread")
        {
            Ok(player) => Some(player),
            Err(e) => {
                tracing::error!("{:#}", e);
                popups.push_back(Popup {
                    title: "Error".to_string(),
                    message: format!("{e:#}"),
                });
                None
            }
        };

        Self {
            player,
            baud_rate: settings.baud_rate,
            settings_path: args.settings.clone(),
            display_data: AppDisplayData {
                address: settings.address.clone(),
                form: MelodyForm::from_params(&settings.params()),
                connected_to: None,
                playback: Playback::Idle,
                last_note: None,
                popups,
            },
        }
    }

    /// Handles application state updates based on incoming messages.
    fn update(&mut self, message: Message) {
        if !matches!(message, Message::Tick) {
            tracing::debug!("Received message: {:?}", message);
        }

        match message {
            Message::AddressChanged(value) => self.display_data.address = value,
            Message::LengthChanged(value) => self.display_data.form.length = value,
            Message::TempoChanged(value) => self.display_data.form.tempo = value,
            Message::DelayChanged(value) => self.display_data.form.delay = value,
            Message::SpeedFactorChanged(value) => self.display_data.form.speed_factor = value,
            Message::Connect => {
                if self.is_connected() {
                    self.popup("Error", Error::AlreadyConnected.to_string());
                    return;
                }
                let address = self.display_data.address.trim().to_string();
                self.send(PlayerCommand::Connect {
                    address,
                    baud_rate: self.baud_rate,
                });
            }
            Message::Disconnect => {
                if !self.is_connected() {
                    self.popup("Error", Error::NoConnection.to_string());
                    return;
                }
                self.send(PlayerCommand::Disconnect);
            }
            Message::FindHc06 => match link::find_hc06() {
                Ok(Some(device)) => {
                    tracing::info!("Found HC-06 at {}", device);
                    self.display_data.address = device;
                }
                Ok(None) => self.popup("HC-06 not found", "No serial port reports an HC-06 module"),
                Err(e) => self.popup("Error", e.to_string()),
            },
            Message::GenerateAndSend => {
                if !self.is_connected() {
                    self.popup("Error", Error::NotConnected.to_string());
                    return;
                }
                if self.display_data.playback != Playback::Idle {
                    self.popup("Error", Error::Busy.to_string());
                    return;
                }
                match self.display_data.form.parse().and_then(|params| melody::generate(&params)) {
                    Ok(melody) => self.send(PlayerCommand::Play(melody)),
                    Err(e) => self.popup(
                        "Generation error",
                        format!("Could not generate or send the melody: {e}"),
                    ),
                }
            }
            Message::PauseResume => {
                if !self.is_connected() {
                    self.popup("Error", Error::NotConnected.to_string());
                    return;
                }
                self.send(PlayerCommand::Pause);
            }
            Message::SaveSettings => {
                let result = self.current_settings().and_then(|s| s.save(&self.settings_path));
                if let Err(e) = result {
                    self.popup("Settings", format!("Could not save settings: {e}"));
                }
            }
            Message::LoadSettings => match Settings::load(&self.settings_path) {
                Ok(settings) => {
                    self.display_data.address = settings.address.clone();
                    self.display_data.form = MelodyForm::from_params(&settings.params());
                    self.baud_rate = settings.baud_rate;
                }
                Err(e) => self.popup("Settings", format!("Could not load settings: {e}")),
            },
            Message::DismissPopup => {
                self.display_data.popups.pop_front();
            }
            Message::Tick => {
                // Collect first to avoid borrowing the player while mutating state
                let events = self
                    .player
                    .as_ref()
                    .map(PlayerHandle::drain_events)
                    .unwrap_or_default();
                for event in events {
                    self.process_player_event(event);
                }
            }
        }
    }

    /// Applies a single event from the player thread to the display data.
    fn process_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Connected { address } => {
                self.popup("Connection", format!("Connected to {address}"));
                self.display_data.connected_to = Some(address);
            }
            PlayerEvent::Disconnected => {
                self.display_data.connected_to = None;
                self.display_data.playback = Playback::Idle;
                self.popup("Connection", "Connection closed");
            }
            PlayerEvent::Started { total } => {
                self.display_data.playback = Playback::Playing {
                    sent: 0,
                    total,
                    paused: false,
                };
            }
            PlayerEvent::NoteSent { index, event } => {
                self.display_data.last_note = Some(event.note);
                if let Playback::Playing { sent, .. } = &mut self.display_data.playback {
                    *sent = index + 1;
                }
            }
            PlayerEvent::PauseSent => {
                if let Playback::Playing { paused, .. } = &mut self.display_data.playback {
                    *paused = !*paused;
                }
            }
            PlayerEvent::Finished { sent } | PlayerEvent::Stopped { sent } => {
                tracing::info!("Playback ended after {} notes", sent);
                self.display_data.playback = Playback::Idle;
            }
            PlayerEvent::Failed { action, message } => {
                // A refused Play leaves the running melody alone.
                if action == Action::Send {
                    self.display_data.playback = Playback::Idle;
                }
                self.popup(failure_title(action), message);
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.display_data.connected_to.is_some()
    }

    fn send(&mut self, command: PlayerCommand) {
        let delivered = self.player.as_ref().is_some_and(|p| p.send(command));
        if !delivered {
            tracing::error!("Player thread is not running");
            self.popup("Error", "The player thread is not running");
        }
    }

    fn popup(&mut self, title: &str, message: impl Into<String>) {
        self.display_data.popups.push_back(Popup {
            title: title.to_string(),
            message: message.into(),
        });
    }

    /// Collects the form into typed settings for saving.
    fn current_settings(&self) -> melody_core::Result<Settings> {
        let params = self.display_data.form.parse()?;
        Ok(Settings {
            address: self.display_data.address.trim().to_string(),
            baud_rate: self.baud_rate,
            length: params.length,
            tempo: params.tempo,
            delay_ms: params.delay_ms,
            speed_factor: params.speed_factor,
        })
    }

    /// Renders the main application interface.
    ///
    /// Delegates all UI rendering to the main_display module,
    /// keeping this function focused on application logic only.
    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    /// Creates a subscription for continuous application updates.
    ///
    /// Returns a timer subscription that fires every 16ms (60 FPS) to pick up
    /// player events promptly.
    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(std::time::Duration::from_millis(16)).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn failure_title(action: Action) -> &'static str {
    match action {
        Action::Connect => "Connection error",
        Action::Disconnect => "Disconnect error",
        Action::Play => "Play error",
        Action::Send => "Send error",
        Action::Pause => "Pause error",
    }
}

/// Reads the settings file if there is one. A missing file is not an error.
fn load_initial_settings(path: &Path) -> anyhow::Result<Settings> {
    if !path.exists() {
        tracing::info!("No settings file at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    Settings::load(path).with_context(|| format!("Could not read settings from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use melody_core::MelodyEvent;

    fn app() -> MelodyApp {
        MelodyApp {
            player: None,
            baud_rate: 9600,
            settings_path: PathBuf::from("unused.json"),
            display_data: AppDisplayData {
                address: String::new(),
                form: MelodyForm::default(),
                connected_to: None,
                playback: Playback::Idle,
                last_note: None,
                popups: VecDeque::new(),
            },
        }
    }

    fn connected_app() -> MelodyApp {
        let mut app = app();
        app.process_player_event(PlayerEvent::Connected {
            address: "COM5".to_string(),
        });
        app.update(Message::DismissPopup);
        app
    }

    #[test]
    fn actions_before_connecting_show_a_popup() {
        for message in [Message::GenerateAndSend, Message::PauseResume, Message::Disconnect] {
            let mut app = app();
            app.update(message);
            assert_eq!(app.display_data.popups.front().map(|p| p.title.as_str()), Some("Error"));
        }
    }

    #[test]
    fn connecting_twice_is_refused_locally() {
        let mut app = connected_app();
        app.update(Message::Connect);
        let popup = app.display_data.popups.front().expect("popup");
        assert_eq!(popup.message, Error::AlreadyConnected.to_string());
    }

    #[test]
    fn bad_form_input_is_reported_verbatim() {
        let mut app = connected_app();
        app.update(Message::TempoChanged("fast".to_string()));
        app.update(Message::GenerateAndSend);
        let popup = app.display_data.popups.front().expect("popup");
        assert_eq!(popup.title, "Generation error");
        assert!(popup.message.contains("'fast'"), "{}", popup.message);
    }

    #[test]
    fn playback_progress_follows_player_events() {
        let mut app = connected_app();
        app.process_player_event(PlayerEvent::Started { total: 4 });
        app.process_player_event(PlayerEvent::NoteSent {
            index: 1,
            event: MelodyEvent {
                note: Note::G,
                duration_ms: 500,
                delay_ms: 500,
            },
        });
        app.process_player_event(PlayerEvent::PauseSent);
        assert_eq!(
            app.display_data.playback,
            Playback::Playing {
                sent: 2,
                total: 4,
                paused: true
            }
        );
        assert_eq!(app.display_data.last_note, Some(Note::G));

        app.process_player_event(PlayerEvent::Finished { sent: 4 });
        assert_eq!(app.display_data.playback, Playback::Idle);
    }

    #[test]
    fn send_failure_ends_playback_and_shows_message() {
        let mut app = connected_app();
        app.process_player_event(PlayerEvent::Started { total: 3 });
        app.process_player_event(PlayerEvent::Failed {
            action: Action::Send,
            message: "Write failed at note 1: broken pipe".to_string(),
        });
        assert_eq!(app.display_data.playback, Playback::Idle);
        let popup = app.display_data.popups.front().expect("popup");
        assert_eq!(popup.title, "Send error");
        assert_eq!(popup.message, "Write failed at note 1: broken pipe");
        // still connected
        assert_eq!(app.display_data.connected_to.as_deref(), Some("COM5"));
    }

    #[test]
    fn disconnect_event_clears_connection() {
        let mut app = connected_app();
        app.process_player_event(PlayerEvent::Disconnected);
        assert!(!app.is_connected());
    }

    #[test]
    fn disconnect_before_connecting_matches_the_player_message() {
        let mut app = app();
        app.update(Message::Disconnect);
        let popup = app.display_data.popups.front().expect("popup");
        assert_eq!(popup.message, Error::NoConnection.to_string());
    }

    #[test]
    fn refused_play_keeps_the_running_melody() {
        let mut app = connected_app();
        app.process_player_event(PlayerEvent::Started { total: 3 });
        app.process_player_event(PlayerEvent::Failed {
            action: Action::Play,
            message: Error::Busy.to_string(),
        });
        app.process_player_event(PlayerEvent::NoteSent {
            index: 1,
            event: MelodyEvent {
                note: Note::E,
                duration_ms: 500,
                delay_ms: 500,
            },
        });
        assert_eq!(
            app.display_data.playback,
            Playback::Playing {
                sent: 2,
                total: 3,
                paused: false
            }
        );
        assert_eq!(app.display_data.popups.front().map(|p| p.title.as_str()), Some("Play error"));
    }

    #[test]
    fn popups_queue_until_dismissed() {
        let mut app = connected_app();
        app.process_player_event(PlayerEvent::Failed {
            action: Action::Pause,
            message: "first".to_string(),
        });
        app.process_player_event(PlayerEvent::Failed {
            action: Action::Connect,
            message: "second".to_string(),
        });
        assert_eq!(app.display_data.popups.len(), 2);
        assert_eq!(app.display_data.popups.front().map(|p| p.message.as_str()), Some("first"));

        app.update(Message::DismissPopup);
        assert_eq!(app.display_data.popups.front().map(|p| p.message.as_str()), Some("second"));

        app.update(Message::DismissPopup);
        assert!(app.display_data.popups.is_empty());
    }
}
