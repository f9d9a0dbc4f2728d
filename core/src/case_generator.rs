//! Deterministic synthetic case generation.
//!
//! Produces labelled training batches. All generation is deterministic
//! (same RNG seed = same batch), labels come from the label heuristic.

use crate::{
    case::Case,
    error::DcaResult,
    label_heuristic::label_case,
    rng::DcaRng,
};
use rand::{distributions::WeightedIndex, prelude::*};
use std::ops::Range;

pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

const AMOUNT_RANGE: Range<u64> = 100..50_000;
const OVERDUE_RANGE: Range<u32> = 10..365;
const CONTACT_RANGE: Range<u32> = 0..10;

pub const CUSTOMER_TYPES: [&str; 3] = ["Enterprise", "SMB", "Individual"];
const CUSTOMER_TYPE_WEIGHTS: [f64; 3] = [0.2, 0.5, 0.3];

pub const PAYMENT_HISTORIES: [&str; 4] = ["Excellent", "Good", "Fair", "Poor"];
const PAYMENT_HISTORY_WEIGHTS: [f64; 4] = [0.1, 0.3, 0.4, 0.2];

pub const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

/// Generate `n` labelled cases with ids C0001, C0002, ...
pub fn generate_cases(n: usize, rng: &mut DcaRng) -> DcaResult<Vec<Case>> {
    let customer_types = WeightedIndex::new(CUSTOMER_TYPE_WEIGHTS).map_err(anyhow::Error::from)?;
    let histories = WeightedIndex::new(PAYMENT_HISTORY_WEIGHTS).map_err(anyhow::Error::from)?;

    let mut cases = Vec::with_capacity(n);
    for i in 1..=n {
        let amount_owed = rng.gen_range(AMOUNT_RANGE) as f64;
        let days_overdue = rng.gen_range(OVERDUE_RANGE);
        let customer_type = CUSTOMER_TYPES[customer_types.sample(rng)];
        let payment_history = PAYMENT_HISTORIES[histories.sample(rng)];
        let contact_attempts = rng.gen_range(CONTACT_RANGE);
        let region = REGIONS.choose(rng).copied().unwrap_or(REGIONS[0]);

        let case = Case::new(
            format!("C{i:04}"),
            amount_owed,
            days_overdue,
            customer_type,
            payment_history,
            contact_attempts,
            region,
        )?;
        let label = label_case(&case);
        cases.push(case.with_label(label));
    }

    log::debug!("Generated {n} synthetic cases with stream '{}'", rng.name);
    Ok(cases)
}
