//! Logging setup.

/// Installs the `env_logger` backend for the `log` facade.
///
/// Filtering follows `RUST_LOG`. Calling this more than once, or after the
/// application installed its own logger, does nothing.
///
/// # Example
///
/// ```no_run
/// segview::init_logging();
/// log::info!("ready");
/// ```
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::debug!("segview logging initialized");
    }
}
