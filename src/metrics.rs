//! Pure scoring functions for a typing attempt.
//!
//! Speed uses the five-characters-per-word convention. Accuracy and
//! consistency are whole percentages.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub const CHARS_PER_WORD: f64 = 5.0;

/// Fewest keystroke timestamps needed before rhythm is scored
pub const MIN_CONSISTENCY_SAMPLES: usize = 5;

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}

/// Percentage of typed characters that were not mistakes.
///
/// `total_typed` is the current buffer length, so errors that were later
/// corrected with backspace still count against the score, and the
/// result goes negative once historical errors outnumber the buffer.
pub fn accuracy(total_typed: usize, error_count: usize) -> i32 {
    if total_typed == 0 {
        return 100;
    }
    let correct = total_typed as f64 - error_count as f64;
    ((correct / total_typed as f64) * 100.0).round() as i32
}

pub fn wpm(elapsed_secs: f64, total_chars: usize) -> u32 {
    if total_chars == 0 || elapsed_secs <= 0.0 {
        return 0;
    }
    let words = total_chars as f64 / CHARS_PER_WORD;
    (words / (elapsed_secs / 60.0)).round() as u32
}

/// Rhythm smoothness from inter-keystroke timing, 0..=100.
///
/// Scores `1 - stddev/mean` of the deltas between consecutive
/// timestamps. A zero mean delta scores 0.
pub fn consistency(timestamps_ms: &[u64]) -> u32 {
    if timestamps_ms.len() < MIN_CONSISTENCY_SAMPLES {
        return 0;
    }

    let deltas = timestamps_ms
        .iter()
        .tuple_windows()
        .map(|(a, b)| *b as f64 - *a as f64)
        .collect::<Vec<f64>>();

    let (Some(avg), Some(spread)) = (mean(&deltas), std_dev(&deltas)) else {
        return 0;
    };
    if avg <= 0.0 {
        return 0;
    }

    ((1.0 - spread / avg).max(0.0) * 100.0).round() as u32
}

/// Coarse classification of a finished attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Tier {
    Mastered,
    Proficient,
    NeedsPractice,
}

impl Tier {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mastered" => Some(Tier::Mastered),
            "proficient" => Some(Tier::Proficient),
            "needs-practice" => Some(Tier::NeedsPractice),
            _ => None,
        }
    }
}

pub fn tier(wpm: u32, accuracy: i32) -> Tier {
    if accuracy >= 98 && wpm >= 50 {
        Tier::Mastered
    } else if accuracy >= 95 && wpm >= 30 {
        Tier::Proficient
    } else {
        Tier::NeedsPractice
    }
}
