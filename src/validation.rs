//! Input validation for visits and slot requests.
//!
//! Checks structural integrity of the visit data handed to the scheduler
//! and of slot requests before any conflict or slot reasoning runs.
//! Detects:
//! - Duplicate visit IDs
//! - Windows whose end is not after their start
//! - Blank locations
//! - Visits filed under a different date than the one being analysed
//! - Durations that cannot fit in the working window
//!
//! Every check runs; all problems are reported together.

use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;

use crate::error::ScheduleError;
use crate::models::Visit;
use crate::policy::SlotPolicy;
use crate::scheduler::SlotRequest;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two visits share the same ID.
    DuplicateId,
    /// End time is not after start time.
    InvalidWindow,
    /// Duration is zero or longer than the working window.
    InvalidDuration,
    /// Location identifier is empty.
    BlankLocation,
    /// Visit date differs from the analysed date.
    DateMismatch,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<Vec<ValidationError>> for ScheduleError {
    fn from(errors: Vec<ValidationError>) -> Self {
        let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
        ScheduleError::input(joined.join("; "))
    }
}

/// Checks a single visit.
pub fn validate_visit(visit: &Visit) -> ValidationResult {
    let mut errors = Vec::new();
    check_visit(visit, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the visits of one day.
///
/// Checks:
/// 1. No duplicate visit IDs
/// 2. Every window ends after it starts
/// 3. Every location is non-blank
/// 4. Every visit is dated `date`
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_day(date: NaiveDate, visits: &[Visit]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for visit in visits {
        if !ids.insert(visit.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate visit ID: {}", visit.id),
            ));
        }

        check_visit(visit, &mut errors);

        if visit.date != date {
            errors.push(ValidationError::new(
                ValidationErrorKind::DateMismatch,
                format!("Visit {} is dated {}, expected {date}", visit.id, visit.date),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a slot request against the enumeration bounds.
pub fn validate_slot_request(request: &SlotRequest, policy: &SlotPolicy) -> ValidationResult {
    let mut errors = Vec::new();

    if request.location.is_blank() {
        errors.push(ValidationError::new(
            ValidationErrorKind::BlankLocation,
            "Slot request has a blank location",
        ));
    }

    let available = policy.working_window().duration_min();
    if request.duration_minutes == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidDuration,
            "Requested duration must be positive",
        ));
    } else if i64::from(request.duration_minutes) > available {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidDuration,
            format!(
                "Requested duration {} min exceeds the {available} min working window",
                request.duration_minutes
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_visit(visit: &Visit, errors: &mut Vec<ValidationError>) {
    if visit.window().is_none() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidWindow,
            format!(
                "Visit {} ends at {} but starts at {}",
                visit.id,
                visit.end_time.format("%H:%M"),
                visit.start_time.format("%H:%M")
            ),
        ));
    }
    if visit.location.is_blank() {
        errors.push(ValidationError::new(
            ValidationErrorKind::BlankLocation,
            format!("Visit {} has a blank location", visit.id),
        ));
    }
}
