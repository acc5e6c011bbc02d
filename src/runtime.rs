use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::keys::KeyStroke;
use crate::progress::{DrillResult, ResultStore, Trainer};

/// Host loop cadence. The engine's own ticker decides when live WPM
/// actually refreshes.
pub const TICK_RATE_MS: u64 = 100;

/// Unified event type consumed by the drill loop
#[derive(Clone, Debug, PartialEq)]
pub enum DrillEvent {
    Key(KeyStroke),
    Quit,
    Resize,
    Tick,
}

impl DrillEvent {
    /// Esc and Ctrl+C leave the program; everything else goes to the engine
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if ctrl_c || key.code == KeyCode::Esc {
            return Some(DrillEvent::Quit);
        }
        Some(DrillEvent::Key(KeyStroke::from_crossterm(key)))
    }
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait DrillEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError>;
}

/// Production event source reading crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<DrillEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => DrillEvent::from_key(&key),
                Ok(CtEvent::Resize(_, _)) => Some(DrillEvent::Resize),
                Ok(_) => None,
                Err(err) => {
                    tracing::warn!(%err, "terminal event stream closed");
                    break;
                }
            };
            if let Some(evt) = evt {
                if tx.send(evt).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DrillEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed source for tests and headless drivers
pub struct ChannelEventSource {
    rx: Receiver<DrillEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<DrillEvent>) -> Self {
        Self { rx }
    }
}

impl DrillEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// What the host loop should do after an event
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    Continue,
    Redraw,
    Finished(DrillResult),
    Quit,
}

/// Advances a trainer one event at a time
pub struct Runner<E: DrillEventSource> {
    event_source: E,
    tick: Duration,
}

impl<E: DrillEventSource> Runner<E> {
    pub fn new(event_source: E, tick: Duration) -> Self {
        Self { event_source, tick }
    }

    /// Blocks up to one tick and returns the next event, or Tick on
    /// timeout. A closed source ends the loop with Quit.
    pub fn step(&self) -> DrillEvent {
        match self.event_source.recv_timeout(self.tick) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => DrillEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("event source disconnected");
                DrillEvent::Quit
            }
        }
    }

    /// Route one event into the trainer
    pub fn dispatch<S: ResultStore>(&self, trainer: &mut Trainer<S>, event: DrillEvent) -> Flow {
        match event {
            DrillEvent::Quit => Flow::Quit,
            DrillEvent::Resize => Flow::Redraw,
            DrillEvent::Tick => {
                let before = trainer.engine.session().live_wpm;
                trainer.on_tick();
                if trainer.engine.session().live_wpm != before {
                    Flow::Redraw
                } else {
                    Flow::Continue
                }
            }
            DrillEvent::Key(key) => match trainer.handle_key(key) {
                Some(result) => Flow::Finished(result),
                None => Flow::Redraw,
            },
        }
    }
}
