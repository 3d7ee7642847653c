//! Text logging (nothing to do with the columnar logging SDK itself).
//!
//! * `trace`: spammy things
//! * `debug`: things that might be useful when debugging
//! * `info`: things that we want to show to users
//! * `warn`: problems that we can recover from
//! * `error`: problems that lead to loss of functionality or data
//!
//! The `*_once` macros only log a given message the first time it is seen. Use them for things
//! that can happen on every call (e.g. a dropped send) to avoid spamming the output.

mod result_extensions;

#[cfg(feature = "setup")]
mod setup;

pub use log::{Level, LevelFilter, debug, error, info, log_enabled, trace, warn};

// The `*_once` macros expand to `$crate::log`, so they only need `log_once` in scope.
pub use log_once::{debug_once, error_once, info_once, log_once, trace_once, warn_once};

pub use result_extensions::{ResultExt, format_error_chain};

#[cfg(feature = "setup")]
pub use setup::{default_log_filter, setup_logging};
