//! Function to setup logging in binaries and tests.

/// The filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Returns the `RUST_LOG` filter directives, or [`DEFAULT_LOG_FILTER`] if unset.
pub fn default_log_filter() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned())
}

/// Directs [`log`] calls to stderr.
///
/// Safe to call multiple times: only the first call installs the logger, and if some other
/// logger has already been installed we leave it alone.
pub fn setup_logging() {
    static ONCE: std::sync::Once = std::sync::Once::new();

    ONCE.call_once(|| {
        let filter = default_log_filter();

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);

        if builder.try_init().is_err() {
            log::debug!("A logger was already installed; keeping it");
        } else {
            log::debug!("Logging set up with filter {filter:?}");
        }
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn setup_is_idempotent() {
        super::setup_logging();
        super::setup_logging();
        log::info!("still alive");
    }
}
