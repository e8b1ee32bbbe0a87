//! # Player Module
//!
//! A dedicated worker thread that owns the serial connection and plays
//! melodies on it. The GUI never touches the port directly: it sends
//! [`PlayerCommand`]s and polls [`PlayerEvent`]s over crossbeam channels.
//!
//! ## Architecture
//! - **Connection**: a single `Option<Port>`; `Some` means connected.
//! - **Playback**: [`transmit::send_melody`] with a pacer that waits on the
//!   command channel instead of sleeping, so PAUSE and Disconnect are
//!   handled in the middle of a melody.
//! - **Errors**: every failure becomes a `Failed` event carrying the error
//!   text; the worker itself keeps running.

use std::io::Write;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::error::{Error, Result};
use crate::link::Connector;
use crate::melody::{Melody, MelodyEvent};
use crate::transmit::{self, Flow, Pacer};

/// Requests sent from the GUI to the player thread.
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    Connect { address: String, baud_rate: u32 },
    Disconnect,
    Play(Melody),
    Pause,
    Shutdown,
}

/// What a failure was trying to do, so the GUI can title its popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Connect,
    Disconnect,
    /// Starting a melody was refused; any melody already playing goes on.
    Play,
    /// Writing a melody failed; it is no longer playing.
    Send,
    Pause,
}

/// Notifications sent from the player thread back to the GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Connected { address: String },
    Disconnected,
    Started { total: usize },
    NoteSent { index: usize, event: MelodyEvent },
    PauseSent,
    Finished { sent: usize },
    Stopped { sent: usize },
    Failed { action: Action, message: String },
}

/// Handle to a running player thread.
///
/// Dropping the handle asks the thread to shut down and waits for it.
#[derive(Debug)]
pub struct PlayerHandle {
    commands: Sender<PlayerCommand>,
    events: Receiver<PlayerEvent>,
    thread: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    /// Spawns the player thread using `connector` to open connections.
    pub fn spawn<C>(connector: C) -> Result<Self>
    where
        C: Connector + Send + 'static,
        C::Port: 'static,
    {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();

        let player = Player {
            connector,
            port: None,
            events: event_tx,
        };
        let thread = thread::Builder::new()
            .name("player".to_string())
            .spawn(move || player.run(command_rx))?;

        Ok(Self {
            commands: command_tx,
            events: event_rx,
            thread: Some(thread),
        })
    }

    /// Queues a command. Returns false if the player thread has exited.
    pub fn send(&self, command: PlayerCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Takes every event produced since the last call without blocking.
    pub fn drain_events(&self) -> Vec<PlayerEvent> {
        self.events.try_iter().collect()
    }

    /// The raw event channel, for callers that want to block on it.
    pub fn events(&self) -> &Receiver<PlayerEvent> {
        &self.events
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(PlayerCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            tracing::debug!("Waiting for player thread to finish...");
            if handle.join().is_err() {
                tracing::error!("Player thread panicked");
            }
        }
    }
}

/// Whether the command loop keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Continue,
    Shutdown,
}

/// A command that cut a melody short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    Disconnect,
    Shutdown,
}

struct Player<C: Connector> {
    connector: C,
    port: Option<C::Port>,
    events: Sender<PlayerEvent>,
}

impl<C: Connector> Player<C> {
    fn run(mut self, commands: Receiver<PlayerCommand>) {
        tracing::info!("Player thread started");
        while let Ok(command) = commands.recv() {
            tracing::debug!("Player received command: {:?}", command);
            if self.handle(command, &commands) == Control::Shutdown {
                tracing::info!("Player received shutdown signal");
                break;
            }
        }
        if self.port.take().is_some() {
            tracing::info!("Closing serial connection on exit");
        }
        tracing::info!("Player thread finished");
    }

    fn handle(&mut self, command: PlayerCommand, commands: &Receiver<PlayerCommand>) -> Control {
        match command {
            PlayerCommand::Connect { address, baud_rate } => self.connect(address, baud_rate),
            PlayerCommand::Disconnect => {
                if self.port.is_none() {
                    report(&self.events, Action::Disconnect, &Error::NoConnection);
                } else {
                    self.disconnect();
                }
            }
            PlayerCommand::Play(melody) => return self.play(&melody, commands),
            PlayerCommand::Pause => match self.port.as_mut() {
                Some(port) => pause(port, &self.events),
                None => report(&self.events, Action::Pause, &Error::NotConnected),
            },
            PlayerCommand::Shutdown => return Control::Shutdown,
        }
        Control::Continue
    }

    fn connect(&mut self, address: String, baud_rate: u32) {
        if self.port.is_some() {
            report(&self.events, Action::Connect, &Error::AlreadyConnected);
            return;
        }
        match self.connector.open(&address, baud_rate) {
            Ok(port) => {
                tracing::info!("Connected to {}", address);
                self.port = Some(port);
                emit(&self.events, PlayerEvent::Connected { address });
            }
            Err(e) => report(&self.events, Action::Connect, &e),
        }
    }

    fn disconnect(&mut self) {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush() {
                tracing::warn!("Flush before disconnect failed: {}", e);
            }
            drop(port);
            tracing::info!("Disconnected");
            emit(&self.events, PlayerEvent::Disconnected);
        }
    }

    fn play(&mut self, melody: &Melody, commands: &Receiver<PlayerCommand>) -> Control {
        let Some(port) = self.port.as_mut() else {
            report(&self.events, Action::Play, &Error::NotConnected);
            return Control::Continue;
        };

        tracing::info!(
            "Playing melody of {} notes (~{} ms)",
            melody.len(),
            melody.total_delay_ms()
        );
        emit(&self.events, PlayerEvent::Started { total: melody.len() });

        let mut pacer = CommandPacer {
            commands,
            events: &self.events,
            interrupt: None,
        };
        match transmit::send_melody(port, melody, &mut pacer) {
            Ok(t) if t.stopped => emit(&self.events, PlayerEvent::Stopped { sent: t.sent }),
            Ok(t) => {
                tracing::info!("Melody finished: {} notes sent", t.sent);
                emit(&self.events, PlayerEvent::Finished { sent: t.sent });
            }
            Err(e) => report(&self.events, Action::Send, &e),
        }

        let interrupt = pacer.interrupt;
        match interrupt {
            Some(Interrupt::Disconnect) => {
                self.disconnect();
                Control::Continue
            }
            Some(Interrupt::Shutdown) => Control::Shutdown,
            None => Control::Continue,
        }
    }
}

/// Waits out note delays while servicing commands that arrive meanwhile.
struct CommandPacer<'a> {
    commands: &'a Receiver<PlayerCommand>,
    events: &'a Sender<PlayerEvent>,
    interrupt: Option<Interrupt>,
}

impl<W: Write + ?Sized> Pacer<W> for CommandPacer<'_> {
    fn note_sent(&mut self, index: usize, event: &MelodyEvent) {
        emit(self.events, PlayerEvent::NoteSent { index, event: *event });
    }

    fn wait(&mut self, writer: &mut W, delay: Duration) -> Result<Flow> {
        let deadline = Instant::now() + delay;
        loop {
            let command = match self.commands.recv_deadline(deadline) {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => return Ok(Flow::Continue),
                Err(RecvTimeoutError::Disconnected) => {
                    self.interrupt = Some(Interrupt::Shutdown);
                    return Ok(Flow::Stop);
                }
            };

            match command {
                PlayerCommand::Pause => pause(writer, self.events),
                PlayerCommand::Play(_) => report(self.events, Action::Play, &Error::Busy),
                PlayerCommand::Connect { .. } => report(self.events, Action::Connect, &Error::AlreadyConnected),
                PlayerCommand::Disconnect => {
                    self.interrupt = Some(Interrupt::Disconnect);
                    return Ok(Flow::Stop);
                }
                PlayerCommand::Shutdown => {
                    self.interrupt = Some(Interrupt::Shutdown);
                    return Ok(Flow::Stop);
                }
            }
        }
    }
}

fn pause<W: Write + ?Sized>(writer: &mut W, events: &Sender<PlayerEvent>) {
    match transmit::send_pause(writer) {
        Ok(()) => {
            tracing::info!("Sent PAUSE");
            emit(events, PlayerEvent::PauseSent);
        }
        Err(e) => report(events, Action::Pause, &e),
    }
}

fn emit(events: &Sender<PlayerEvent>, event: PlayerEvent) {
    // The GUI may already be gone during shutdown.
    let _ = events.send(event);
}

fn report(events: &Sender<PlayerEvent>, action: Action, error: &Error) {
    tracing::warn!("{:?} failed: {}", action, error);
    emit(
        events,
        PlayerEvent::Failed {
            action,
            message: error.to_string(),
        },
    );
}
