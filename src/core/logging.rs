//! Logging initialization and utilities

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable.
///
/// # Example
/// ```
/// relief::core::logging::init();
/// log::info!("pipeline starting");
/// ```
pub fn init() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();
}

/// Like [`init`], but tolerates an already-installed logger.
///
/// Useful in test harnesses and hosts that may initialize logging
/// themselves before handing frames to the pipeline.
pub fn try_init() -> bool {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).try_init().is_ok()
}
