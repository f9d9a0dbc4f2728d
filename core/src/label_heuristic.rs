//! Synthetic recovery-likelihood label.
//!
//! Additive point score over raw case attributes, then thresholded.
//! Used only to synthesize training data, never at inference time.
//!
//! Each factor is a branch chain evaluated top to bottom; only the
//! first matching arm fires. Branch order is part of the label
//! contract: existing training files were produced with it.

use crate::{case::Case, types::RecoveryLikelihood};

pub const HIGH_THRESHOLD: i32 = 40;
pub const MEDIUM_THRESHOLD: i32 = 10;

/// Amount factor.
pub fn amount_points(amount_owed: f64) -> i32 {
    if amount_owed < 1000.0 {
        20
    } else if amount_owed < 5000.0 {
        10
    } else if amount_owed > 20000.0 {
        -10
    } else {
        0
    }
}

/// Days-overdue factor. The > 180 arm sits behind > 120 and never fires.
pub fn overdue_points(days_overdue: u32) -> i32 {
    if days_overdue < 30 {
        30
    } else if days_overdue < 60 {
        20
    } else if days_overdue > 120 {
        -20
    } else if days_overdue > 180 {
        -30
    } else {
        0
    }
}

/// Payment-history factor. Fair and unknown values score 0.
pub fn history_points(payment_history: &str) -> i32 {
    match payment_history {
        "Excellent" => 30,
        "Good"      => 10,
        "Poor"      => -20,
        _           => 0,
    }
}

/// Contact-attempts factor.
pub fn contact_points(contact_attempts: u32) -> i32 {
    if contact_attempts > 5 { -10 } else { 0 }
}

pub fn recovery_score(case: &Case) -> i32 {
    amount_points(case.amount_owed())
        + overdue_points(case.days_overdue())
        + history_points(case.payment_history())
        + contact_points(case.contact_attempts())
}

pub fn label_for_score(score: i32) -> RecoveryLikelihood {
    if score >= HIGH_THRESHOLD {
        RecoveryLikelihood::High
    } else if score >= MEDIUM_THRESHOLD {
        RecoveryLikelihood::Medium
    } else {
        RecoveryLikelihood::Low
    }
}

pub fn label_case(case: &Case) -> RecoveryLikelihood {
    label_for_score(recovery_score(case))
}
