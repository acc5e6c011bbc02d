use serde::Serialize;

/// Live WPM sampled at `t` seconds after the first keystroke
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: u32,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: u32) -> Self {
        Self { t, wpm }
    }
}

/// Highest sampled speed, if any samples exist
pub fn peak_wpm(points: &[TimeSeriesPoint]) -> Option<u32> {
    points.iter().map(|p| p.wpm).max()
}
