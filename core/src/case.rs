//! Typed case records and their enrichment stages.
//!
//! A case moves through three shapes, never mutated in place:
//!   Case         : validated raw record (ingestion or generator)
//!   ScoredCase   : Case + predicted likelihood + confidence
//!   AssignedCase : ScoredCase + assigned agency

use crate::{
    error::{DcaError, DcaResult},
    types::{CaseId, RecoveryLikelihood},
};
use serde::Serialize;

/// Fields are read through accessors; `Case::new` is the only way in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Case {
    case_id:          CaseId,
    amount_owed:      f64,
    days_overdue:     u32,
    customer_type:    String,
    payment_history:  String,
    contact_attempts: u32,
    region:           String,
    /// Ground-truth label, present only on training rows.
    recovery_likelihood: Option<RecoveryLikelihood>,
}

impl Case {
    /// Validated constructor. Rejects what the pipeline cannot score:
    /// negative or non-finite amounts and blank identifiers/categories.
    pub fn new(
        case_id: impl Into<CaseId>,
        amount_owed: f64,
        days_overdue: u32,
        customer_type: impl Into<String>,
        payment_history: impl Into<String>,
        contact_attempts: u32,
        region: impl Into<String>,
    ) -> DcaResult<Self> {
        let case = Self {
            case_id: case_id.into(),
            amount_owed,
            days_overdue,
            customer_type: customer_type.into(),
            payment_history: payment_history.into(),
            contact_attempts,
            region: region.into(),
            recovery_likelihood: None,
        };
        case.validate()?;
        Ok(case)
    }

    pub fn with_label(mut self, label: RecoveryLikelihood) -> Self {
        self.recovery_likelihood = Some(label);
        self
    }

    pub fn without_label(mut self) -> Self {
        self.recovery_likelihood = None;
        self
    }

    fn validate(&self) -> DcaResult<()> {
        let invalid = |reason: String| Err(DcaError::InvalidCase { reason });
        if self.case_id.trim().is_empty() {
            return invalid("case_id must not be blank".into());
        }
        if !self.amount_owed.is_finite() || self.amount_owed < 0.0 {
            return invalid(format!(
                "amount_owed must be a non-negative number, got {}",
                self.amount_owed
            ));
        }
        for (column, value) in [
            ("customer_type", &self.customer_type),
            ("payment_history", &self.payment_history),
            ("region", &self.region),
        ] {
            if value.trim().is_empty() {
                return invalid(format!("{column} must not be blank"));
            }
        }
        Ok(())
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn amount_owed(&self) -> f64 {
        self.amount_owed
    }

    pub fn days_overdue(&self) -> u32 {
        self.days_overdue
    }

    pub fn customer_type(&self) -> &str {
        &self.customer_type
    }

    pub fn payment_history(&self) -> &str {
        &self.payment_history
    }

    pub fn contact_attempts(&self) -> u32 {
        self.contact_attempts
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn recovery_likelihood(&self) -> Option<RecoveryLikelihood> {
        self.recovery_likelihood
    }

    /// The ground-truth label, or an error naming the 1-based row.
    pub fn require_label(&self, row: usize) -> DcaResult<RecoveryLikelihood> {
        self.recovery_likelihood.ok_or_else(|| DcaError::InvalidRow {
            row,
            reason: format!("case {} has no recovery_likelihood label", self.case_id),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCase {
    pub case:               Case,
    pub predicted_recovery: RecoveryLikelihood,
    pub confidence_score:   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedCase {
    pub case:               Case,
    pub predicted_recovery: Option<RecoveryLikelihood>,
    pub confidence_score:   Option<f64>,
    pub dca_assigned:       String,
}

impl AssignedCase {
    pub fn from_scored(scored: ScoredCase, agency: impl Into<String>) -> Self {
        Self {
            case: scored.case,
            predicted_recovery: Some(scored.predicted_recovery),
            confidence_score: Some(scored.confidence_score),
            dca_assigned: agency.into(),
        }
    }

    /// Assignment for a case that never went through the classifier.
    pub fn unscored(case: Case, agency: impl Into<String>) -> Self {
        Self {
            case,
            predicted_recovery: None,
            confidence_score: None,
            dca_assigned: agency.into(),
        }
    }

    /// The likelihood that routed this case: prediction first,
    /// then the ground-truth label, then Medium.
    pub fn routing_likelihood(&self) -> RecoveryLikelihood {
        routing_likelihood(self.predicted_recovery, &self.case)
    }
}

pub(crate) fn routing_likelihood(
    predicted: Option<RecoveryLikelihood>,
    case: &Case,
) -> RecoveryLikelihood {
    predicted
        .or(case.recovery_likelihood)
        .unwrap_or(RecoveryLikelihood::Medium)
}
