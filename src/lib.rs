// Library surface for the binary, headless drivers and integration tests.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod guidance;
pub mod keys;
pub mod metrics;
pub mod progress;
pub mod runtime;
pub mod session;
pub mod text_source;
pub mod time_series;

pub use engine::{Engine, Snapshot};
pub use keys::KeyStroke;
pub use session::SessionState;
