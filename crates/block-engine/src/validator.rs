//! Pure validation of raw block fields.
//!
//! Rules:
//! - tenant, kind, dates and reason are always present
//! - `end_date >= start_date`
//! - reason is non-blank and at most [`ValidationLimits::max_reason_chars`] characters
//! - partial-day blocks carry both times, each a zero-padded 24-hour `HH:MM`
//!
//! The ordering of `start_time` and `end_time` is not checked.

use crate::error::{BlockError, Result};
use crate::record::{BlockDraft, BlockKind, ClockTime, Coverage, NewBlock, StaffId, TenantId};

/// Limits applied during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationLimits {
    /// Maximum reason length in characters (default: 500).
    pub max_reason_chars: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_reason_chars: 500,
        }
    }
}

/// Membership check against the closed kind enumeration.
pub fn is_valid_kind(raw: &str) -> bool {
    raw.parse::<BlockKind>().is_ok()
}

/// Matches `^([0-1][0-9]|2[0-3]):[0-5][0-9]$`.
pub fn is_valid_time_format(raw: &str) -> bool {
    match raw.as_bytes() {
        [h1, h2, b':', m1, m2] => {
            let hour_ok = match h1 {
                b'0' | b'1' => h2.is_ascii_digit(),
                b'2' => (b'0'..=b'3').contains(h2),
                _ => false,
            };
            hour_ok && (b'0'..=b'5').contains(m1) && m2.is_ascii_digit()
        }
        _ => false,
    }
}

/// Validate raw fields into a [`BlockDraft`].
///
/// # Errors
/// - [`BlockError::TenantIsolation`] if the tenant id is blank.
/// - [`BlockError::Validation`] for any other broken rule; the first
///   failing field is reported.
pub fn validate_new_block(input: &NewBlock, limits: &ValidationLimits) -> Result<BlockDraft> {
    let tenant_id = TenantId::parse(&input.tenant_id, "create block")?;

    if input.end_date < input.start_date {
        return Err(BlockError::validation(
            "end_date",
            format!(
                "end date {} is before start date {}",
                input.end_date, input.start_date
            ),
        ));
    }

    let reason = validate_reason(&input.reason, limits)?;
    let coverage = validate_coverage(
        input.is_full_day,
        input.start_time.as_deref(),
        input.end_time.as_deref(),
    )?;

    Ok(BlockDraft {
        tenant_id,
        staff_id: StaffId::from_optional(input.staff_id.as_deref()),
        kind: input.kind,
        start_date: input.start_date,
        end_date: input.end_date,
        coverage,
        reason,
        created_by: input.created_by.trim().to_string(),
    })
}

fn validate_reason(raw: &str, limits: &ValidationLimits) -> Result<String> {
    let reason = raw.trim();
    if reason.is_empty() {
        return Err(BlockError::validation("reason", "must not be empty"));
    }
    let chars = reason.chars().count();
    if chars > limits.max_reason_chars {
        return Err(BlockError::validation(
            "reason",
            format!(
                "{chars} characters exceeds the maximum of {}",
                limits.max_reason_chars
            ),
        ));
    }
    Ok(reason.to_string())
}

/// Full-day blocks ignore whatever times were supplied.
fn validate_coverage(
    is_full_day: bool,
    start_time: Option<&str>,
    end_time: Option<&str>,
) -> Result<Coverage> {
    if is_full_day {
        return Ok(Coverage::FullDay);
    }
    let start_time = start_time
        .ok_or_else(|| BlockError::validation("start_time", "required for a partial-day block"))?;
    let end_time = end_time
        .ok_or_else(|| BlockError::validation("end_time", "required for a partial-day block"))?;
    Ok(Coverage::Partial {
        start_time: ClockTime::parse(start_time, "start_time")?,
        end_time: ClockTime::parse(end_time, "end_time")?,
    })
}
