//! Date-proximity and amount-proximity predicates.
//!
//! Both treat an absent side as "no match": a line the OCR could not date or
//! price cannot corroborate anything on that axis.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// True iff both dates are present and their absolute calendar-day
/// difference is at most `tolerance_days`.
pub fn dates_within_tolerance(
    d1: Option<NaiveDate>,
    d2: Option<NaiveDate>,
    tolerance_days: i64,
) -> bool {
    match (d1, d2) {
        (Some(a), Some(b)) => (a - b).num_days().abs() <= tolerance_days,
        _ => false,
    }
}

/// True iff both values are present and their absolute magnitudes differ by
/// at most `tolerance_percent` of the average magnitude. Statement values are
/// signed while document totals are not, so comparison is over `abs()`.
///
/// Equal magnitudes short-circuit to true, which is also the divide-by-zero
/// guard: a zero average can only be reached with unequal magnitudes, and
/// those are rejected.
pub fn amounts_match(v1: Option<Decimal>, v2: Option<Decimal>, tolerance_percent: Decimal) -> bool {
    let (a, b) = match (v1, v2) {
        (Some(a), Some(b)) => (a.abs(), b.abs()),
        _ => return false,
    };

    if a == b {
        return true;
    }

    let avg = (a + b) / Decimal::TWO;
    if avg.is_zero() {
        return false;
    }

    (a - b).abs() / avg * Decimal::ONE_HUNDRED <= tolerance_percent
}
