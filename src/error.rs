//! Error type for scheduling operations.
//!
//! Errors are internal to the crate's boundary: the public operations of
//! [`VisitScheduler`](crate::scheduler::VisitScheduler) and
//! [`ConflictDetector`](crate::conflict::ConflictDetector) catch them,
//! log a warning, and return an empty or default result.

/// Result type for scheduling operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Errors raised while preparing or evaluating a schedule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    /// Malformed date, time, location or duration.
    #[error("Invalid input: {0}")]
    Input(String),

    /// The visit repository failed or timed out.
    #[error("Visit data unavailable: {0}")]
    DataUnavailable(String),

    /// A travel estimate or business-hours profile was missing and a
    /// default was substituted.
    #[error("Degraded estimate: {0}")]
    DegradedEstimate(String),

    /// The scheduling policy is inconsistent.
    #[error("Invalid scheduling policy: {0}")]
    Policy(String),
}

impl ScheduleError {
    /// Creates an input error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// Creates a data-unavailable error.
    pub fn data_unavailable(message: impl Into<String>) -> Self {
        Self::DataUnavailable(message.into())
    }

    /// Creates a degraded-estimate marker.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self::DegradedEstimate(message.into())
    }

    /// Creates a policy error.
    pub fn policy(message: impl Into<String>) -> Self {
        Self::Policy(message.into())
    }

    /// Whether a caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = ScheduleError::input("duration must be positive");
        assert_eq!(e.to_string(), "Invalid input: duration must be positive");

        let e = ScheduleError::data_unavailable("connection reset");
        assert_eq!(e.to_string(), "Visit data unavailable: connection reset");
    }

    #[test]
    fn test_retryable() {
        assert!(ScheduleError::data_unavailable("timeout").is_retryable());
        assert!(!ScheduleError::input("bad").is_retryable());
        assert!(!ScheduleError::policy("bad").is_retryable());
        assert!(!ScheduleError::degraded("default used").is_retryable());
    }
}
