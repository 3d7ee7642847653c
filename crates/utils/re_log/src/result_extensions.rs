/// Log-and-continue helpers for [`Result`]s whose error is not worth propagating.
///
/// Every message is prefixed with the caller's `file:line` and contains the full error chain.
pub trait ResultExt<T, E> {
    /// Logs the error (if any) and discards it.
    fn ok_or_log_error(self) -> Option<T>;

    /// Same as [`Self::ok_or_log_error`], but only logs a given message once.
    fn ok_or_log_error_once(self) -> Option<T>;

    /// Logs a warning with some context (if there is an error), but only once per unique message.
    fn warn_on_err_once(self, context: impl std::fmt::Display) -> Option<T>;
}

impl<T, E> ResultExt<T, E> for Result<T, E>
where
    E: std::error::Error,
{
    #[track_caller]
    fn ok_or_log_error(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let loc = std::panic::Location::caller();
                log::error!("{}:{} {}", loc.file(), loc.line(), format_error_chain(&err));
                None
            }
        }
    }

    #[track_caller]
    fn ok_or_log_error_once(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let loc = std::panic::Location::caller();
                crate::error_once!("{}:{} {}", loc.file(), loc.line(), format_error_chain(&err));
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err_once(self, context: impl std::fmt::Display) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let loc = std::panic::Location::caller();
                crate::warn_once!(
                    "{}:{} {context}: {}",
                    loc.file(),
                    loc.line(),
                    format_error_chain(&err)
                );
                None
            }
        }
    }
}

/// Formats an error together with its chain of sources, e.g. `outer -> middle -> root cause`.
///
/// Sources whose message is already contained in their parent's message are skipped, so that
/// `#[error("{0}")]`-style wrappers don't repeat themselves.
pub fn format_error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut last = out.clone();

    let mut source = err.source();
    while let Some(cause) = source {
        let msg = cause.to_string();
        if !last.contains(&msg) {
            out.push_str(" -> ");
            out.push_str(&msg);
        }
        last = msg;
        source = cause.source();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Leaf;

    impl std::fmt::Display for Leaf {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("disk on fire")
        }
    }

    impl std::error::Error for Leaf {}

    #[derive(Debug)]
    struct Wrapper(Leaf);

    impl std::fmt::Display for Wrapper {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("failed to flush")
        }
    }

    impl std::error::Error for Wrapper {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn chain_is_formatted() {
        assert_eq!(format_error_chain(&Wrapper(Leaf)), "failed to flush -> disk on fire");
        assert_eq!(format_error_chain(&Leaf), "disk on fire");
    }

    #[test]
    fn ok_passes_through() {
        let ok: Result<u32, Leaf> = Ok(42);
        assert_eq!(ok.ok_or_log_error(), Some(42));

        let err: Result<u32, Leaf> = Err(Leaf);
        assert_eq!(err.warn_on_err_once("while testing"), None);
    }
}
