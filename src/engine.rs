//! The typing session state machine.
//!
//! `Idle` → `Running` on the first accepted keystroke, `Running` →
//! `Finished` when the buffer reaches the target length, and back to
//! `Idle` on any load or restart. Invalid input is ignored rather than
//! reported.

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, debug_span, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::feedback::{Feedback, FeedbackSink, NullFeedback};
use crate::guidance::{guidance_for, KeyGuidance};
use crate::keys::{KeyCategory, KeyIdentity, KeyStroke, NamedKey};
use crate::metrics;
use crate::progress::DrillResult;
use crate::session::{CharErrorCount, ErrorRecord, Session, SessionState};
use crate::text_source::{TextSource, WordListSource, PANGRAM};
use crate::time_series::TimeSeriesPoint;

/// Repeating deadline for the live WPM readout. Armed only while a
/// session is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LiveTicker {
    interval_ms: u64,
    next_due_ms: Option<u64>,
}

impl LiveTicker {
    fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_due_ms: None,
        }
    }

    fn arm(&mut self, now_ms: u64) {
        self.next_due_ms = Some(now_ms + self.interval_ms);
    }

    fn cancel(&mut self) {
        self.next_due_ms = None;
    }

    fn is_armed(&self) -> bool {
        self.next_due_ms.is_some()
    }

    /// Consumes the current deadline if it has passed and schedules the
    /// next one, skipping any intervals the host slept through.
    fn fire(&mut self, now_ms: u64) -> bool {
        match self.next_due_ms {
            Some(due) if now_ms >= due => {
                let mut next = due + self.interval_ms;
                if next <= now_ms {
                    next = now_ms + self.interval_ms;
                }
                self.next_due_ms = Some(next);
                true
            }
            _ => false,
        }
    }
}

/// Read-only view of the engine for presentation layers
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub state: SessionState,
    pub target: String,
    pub typed: String,
    pub error_count: usize,
    pub error_log: Vec<ErrorRecord>,
    /// Problem keys, most missed first
    pub error_summary: Vec<CharErrorCount>,
    pub live_wpm: u32,
    pub final_wpm: u32,
    pub accuracy: i32,
    pub consistency: u32,
    pub next_key_guidance: Option<KeyGuidance>,
    pub wpm_history: Vec<TimeSeriesPoint>,
}

pub struct Engine {
    session: Session,
    clock: Arc<dyn Clock>,
    feedback: Box<dyn FeedbackSink>,
    fallback: Box<dyn TextSource>,
    restart_key: NamedKey,
    ticker: LiveTicker,
    pending_completion: Option<DrillResult>,
}

impl Engine {
    /// Engine on the system clock with silent feedback, starting on a
    /// generated fallback text.
    pub fn new(config: &Config) -> Self {
        let mut engine = Self {
            session: Session::new(PANGRAM),
            clock: Arc::new(SystemClock),
            feedback: Box::new(NullFeedback),
            fallback: Box::new(WordListSource::english(config.fallback_word_count)),
            restart_key: config.restart_key,
            ticker: LiveTicker::new(config.live_wpm_interval_ms),
            pending_completion: None,
        };
        engine.load_target(None);
        engine
    }

    pub fn with_clock<C: Clock>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_feedback<F: FeedbackSink + 'static>(mut self, feedback: F) -> Self {
        self.feedback = Box::new(feedback);
        self
    }

    /// Source used when `load_target` gets no usable text
    pub fn with_fallback<T: TextSource + 'static>(mut self, fallback: T) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    pub fn is_ticker_armed(&self) -> bool {
        self.ticker.is_armed()
    }

    /// Start a fresh session on `text`, or on generated text when `text`
    /// is missing or empty. Cancels the live ticker and drops any
    /// completion that was not taken.
    pub fn load_target(&mut self, text: Option<&str>) {
        let _span = debug_span!("load_target").entered();

        let text = match text.filter(|t| !t.is_empty()) {
            Some(t) => t.to_string(),
            None => {
                let generated = self.fallback.next_text();
                if generated.is_empty() {
                    warn!("fallback source produced no text, using pangram");
                    PANGRAM.to_string()
                } else {
                    debug!("no target supplied, using generated text");
                    generated
                }
            }
        };

        self.ticker.cancel();
        self.pending_completion = None;
        self.session = Session::new(&text);
        debug!(target_len = self.session.target.len(), "session loaded");
    }

    /// Same text, fresh attempt
    pub fn restart(&mut self) {
        let target = self.session.target_text();
        self.load_target(Some(&target));
    }

    /// The single per-keystroke entry point
    pub fn handle_key(&mut self, key: KeyStroke) {
        if self.session.state == SessionState::Finished {
            if key.identity == KeyIdentity::Named(self.restart_key) {
                self.restart();
            }
            return;
        }

        if key.category == KeyCategory::Backspace {
            self.backspace();
            return;
        }

        if let Some(c) = key.typed_char() {
            self.write(c);
        }
    }

    fn backspace(&mut self) {
        if self.session.typed.pop().is_some() {
            self.feedback.notify(Feedback::Backspace);
        }
    }

    fn write(&mut self, c: char) {
        let Some(expected) = self.session.expected_char() else {
            return;
        };
        let now = self.clock.now_ms();

        if self.session.state == SessionState::Idle {
            self.session.state = SessionState::Running;
            self.session.started_at_ms = Some(now);
            self.ticker.arm(now);
            debug!("session started");
        }

        self.session.keystroke_times_ms.push(now);

        let index = self.session.typed.len();
        if c == expected {
            let event = if c == ' ' {
                Feedback::Space
            } else {
                Feedback::Correct
            };
            self.feedback.notify(event);
        } else {
            self.session.error_count += 1;
            self.session.error_log.push(ErrorRecord {
                expected,
                actual: c,
                index,
            });
            self.feedback.notify(Feedback::Error);
        }

        self.session.typed.push(c);
        trace!(index, %c, %expected, "keystroke");

        if self.session.is_full() {
            self.finish(now);
        }
    }

    fn finish(&mut self, now: u64) {
        let _span = debug_span!("finish").entered();

        self.ticker.cancel();
        let session = &mut self.session;
        session.state = SessionState::Finished;
        session.ended_at_ms = Some(now);
        session.live_wpm = 0;

        let started = session.started_at_ms.unwrap_or(now);
        let elapsed_secs = now.saturating_sub(started) as f64 / 1000.0;
        session.final_wpm = metrics::wpm(elapsed_secs, session.typed.len());
        session.consistency = metrics::consistency(&session.keystroke_times_ms);

        let accuracy = metrics::accuracy(session.typed.len(), session.error_count);
        let result = DrillResult {
            wpm: session.final_wpm,
            accuracy,
            tier: metrics::tier(session.final_wpm, accuracy),
            timestamp: Local::now(),
        };
        debug!(
            wpm = result.wpm,
            accuracy = result.accuracy,
            consistency = session.consistency,
            tier = %result.tier,
            "session finished"
        );
        self.pending_completion = Some(result);
        self.feedback.notify(Feedback::Complete);
    }

    /// Advance the live WPM readout. Safe to call at any cadence; only
    /// recomputes once per ticker interval while running.
    pub fn on_tick(&mut self) {
        if self.session.state != SessionState::Running {
            return;
        }
        let now = self.clock.now_ms();
        if !self.ticker.fire(now) {
            return;
        }

        let started = self.session.started_at_ms.unwrap_or(now);
        let elapsed_secs = now.saturating_sub(started) as f64 / 1000.0;
        let live = metrics::wpm(elapsed_secs, self.session.typed.len());
        self.session.live_wpm = live;
        self.session
            .wpm_history
            .push(TimeSeriesPoint::new(elapsed_secs, live));
    }

    /// The finished-session result, handed out exactly once
    pub fn take_completion(&mut self) -> Option<DrillResult> {
        self.pending_completion.take()
    }

    pub fn accuracy(&self) -> i32 {
        metrics::accuracy(self.session.typed.len(), self.session.error_count)
    }

    pub fn snapshot(&self) -> Snapshot {
        let session = &self.session;
        Snapshot {
            state: session.state,
            target: session.target_text(),
            typed: session.typed_text(),
            error_count: session.error_count,
            error_log: session.error_log.clone(),
            error_summary: session.error_summary(),
            live_wpm: session.live_wpm,
            final_wpm: session.final_wpm,
            accuracy: self.accuracy(),
            consistency: session.consistency,
            next_key_guidance: session.expected_char().map(guidance_for),
            wpm_history: session.wpm_history.clone(),
        }
    }
}
