//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
pub fn init() {
    env_logger::init();
}

/// Initialize logging without panicking if a logger is already installed.
///
/// Useful in tests where multiple cases may race to install the logger.
pub fn try_init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
