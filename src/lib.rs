// Strum Eval - strumming direction detection and evaluation
// Audio onsets are labelled up/down from the sign of the hand motion derivative

// Module declarations
pub mod analysis;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod synthetic;

// Re-exports for convenience
pub use analysis::{classify_example, StrumDetector, StrumDirection, StrumEstimate};
pub use config::AppConfig;

use tracing::Level;

/// Install the stderr fmt subscriber
///
/// `verbosity` 0 logs warnings and errors, 1 adds info, 2 or more adds debug.
/// Calling it twice is harmless; the first subscriber stays installed.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
