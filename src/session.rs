use crate::time_series::TimeSeriesPoint;
use itertools::Itertools;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

/// One mismatched keystroke
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub expected: char,
    pub actual: char,
    pub index: usize,
}

/// Mistakes grouped by the character that should have been typed
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CharErrorCount {
    pub expected: char,
    pub count: usize,
}

/// A single attempt at a target text. Only the engine mutates it.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub state: SessionState,
    pub target: Vec<char>,
    pub typed: Vec<char>,
    pub error_count: usize,
    pub error_log: Vec<ErrorRecord>,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
    pub keystroke_times_ms: Vec<u64>,
    // Derived values written by the engine
    pub live_wpm: u32,
    pub final_wpm: u32,
    pub consistency: u32,
    pub wpm_history: Vec<TimeSeriesPoint>,
}

impl Session {
    pub fn new(target: &str) -> Self {
        Self {
            state: SessionState::Idle,
            target: target.chars().collect(),
            typed: Vec::new(),
            error_count: 0,
            error_log: Vec::new(),
            started_at_ms: None,
            ended_at_ms: None,
            keystroke_times_ms: Vec::new(),
            live_wpm: 0,
            final_wpm: 0,
            consistency: 0,
            wpm_history: Vec::new(),
        }
    }

    pub fn target_text(&self) -> String {
        self.target.iter().collect()
    }

    pub fn typed_text(&self) -> String {
        self.typed.iter().collect()
    }

    /// The next character the user is expected to type
    pub fn expected_char(&self) -> Option<char> {
        self.target.get(self.typed.len()).copied()
    }

    pub fn is_full(&self) -> bool {
        self.typed.len() >= self.target.len()
    }

    /// Whether the character at `idx` of the buffer matches the target
    pub fn is_correct_at(&self, idx: usize) -> Option<bool> {
        let typed = self.typed.get(idx)?;
        Some(self.target.get(idx) == Some(typed))
    }

    /// Mistakes per expected character, most frequent first
    pub fn error_summary(&self) -> Vec<CharErrorCount> {
        self.error_log
            .iter()
            .counts_by(|e| e.expected)
            .into_iter()
            .map(|(expected, count)| CharErrorCount { expected, count })
            .sorted_by(|a, b| b.count.cmp(&a.count).then(a.expected.cmp(&b.expected)))
            .collect()
    }
}
