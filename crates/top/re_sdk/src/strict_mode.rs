use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

pub const RERUN_STRICT_ENV_VAR: &str = "RERUN_STRICT";

/// Helper to get the value of the `RERUN_STRICT` environment variable.
fn get_strict_env() -> Option<bool> {
    std::env::var(RERUN_STRICT_ENV_VAR)
        .ok()
        .and_then(|s| match s.to_lowercase().as_str() {
            "0" | "false" | "no" | "off" => Some(false),
            "1" | "true" | "yes" | "on" => Some(true),
            _ => {
                re_log::warn!(
                    "Invalid value for environment variable {RERUN_STRICT_ENV_VAR}={s:?}. Expected 'on' or 'off'. It will be ignored"
                );
                None
            }
        })
}

fn strict_mode_flag() -> &'static AtomicBool {
    static STRICT_MODE: OnceLock<AtomicBool> = OnceLock::new();
    STRICT_MODE.get_or_init(|| {
        let strict = get_strict_env().unwrap_or(false);
        if strict {
            re_log::info_once!(
                "Strict mode is enabled by the '{RERUN_STRICT_ENV_VAR}' environment variable."
            );
        }
        AtomicBool::new(strict)
    })
}

/// Is strict mode on?
///
/// In strict mode, every error from a logging call is returned to the caller.
/// Otherwise it is logged, and the call becomes a no-op.
///
/// Defaults to the value of the `RERUN_STRICT` environment variable, or `false` if unset.
#[inline]
pub fn strict_mode() -> bool {
    strict_mode_flag().load(Ordering::Relaxed)
}

/// Turns strict mode on or off for the whole process.
///
/// Streams built with an explicit [`crate::RecordingStreamBuilder::strict`] are unaffected.
#[inline]
pub fn set_strict_mode(strict: bool) {
    strict_mode_flag().store(strict, Ordering::Relaxed);
}
