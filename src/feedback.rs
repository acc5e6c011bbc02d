use std::io::Write;

/// Advisory notification for sound or haptic feedback
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Feedback {
    Correct,
    Error,
    Space,
    Backspace,
    Complete,
}

/// Receives feedback notifications from the engine. Implementations may
/// ignore any of them.
pub trait FeedbackSink: Send {
    fn notify(&mut self, event: Feedback);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn notify(&mut self, _event: Feedback) {}
}

/// Rings the terminal bell on mistakes
pub struct BellFeedback<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> BellFeedback<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> FeedbackSink for BellFeedback<W> {
    fn notify(&mut self, event: Feedback) {
        if event == Feedback::Error {
            let _ = self.out.write_all(b"\x07");
            let _ = self.out.flush();
        }
    }
}

impl<F: FnMut(Feedback) + Send> FeedbackSink for F {
    fn notify(&mut self, event: Feedback) {
        self(event)
    }
}
