//! Metrics for resolution and dialing
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding process installs a recorder.

pub mod counters;
pub mod histograms;
pub mod labels;

use crate::Error;
use std::time::Duration;

/// Outcome label for a failed operation
pub(crate) fn error_outcome(error: &Error) -> &'static str {
    match error {
        Error::Parse { .. } => labels::RESULT_PARSE_ERROR,
        Error::Config(_) => labels::RESULT_CONFIG_ERROR,
        _ => labels::RESULT_ERROR,
    }
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`
pub(crate) fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_outcome_labels() {
        let parse = Error::Parse {
            field: "connect_timeout",
            value: "ten".into(),
        };
        assert_eq!(error_outcome(&parse), labels::RESULT_PARSE_ERROR);
        assert_eq!(
            error_outcome(&Error::Config("bad".into())),
            labels::RESULT_CONFIG_ERROR
        );
        assert_eq!(
            error_outcome(&Error::TlsRejected("a:5432".into())),
            labels::RESULT_ERROR
        );
    }

    #[test]
    fn test_millis() {
        assert_eq!(millis(Duration::from_micros(1500)), 1);
        assert_eq!(millis(Duration::from_secs(3)), 3000);
    }

    #[test]
    fn test_millis_saturates() {
        // Duration::MAX holds about 1.8e19 seconds, far past u64 milliseconds
        assert_eq!(millis(Duration::MAX), u64::MAX);
        assert_eq!(millis(Duration::from_secs(u64::MAX / 1000 + 1)), u64::MAX);
    }
}
