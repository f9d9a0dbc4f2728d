//! Deterministic random number generation.
//!
//! RULE: Nothing in the core may call a platform RNG directly.
//! All randomness flows through DcaRng instances derived from a
//! single master seed, one stream per stable slot.
//!
//! Each consumer gets its own RNG stream, seeded deterministically
//! from (master_seed XOR slot_index). DcaRng implements RngCore, so
//! consumers draw through rand's own helpers (`Rng`, `SliceRandom`,
//! `WeightedIndex`). This means:
//!   - Adding a new slot never changes existing streams.
//!   - Each stream is fully reproducible in isolation.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single consumer.
pub struct DcaRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl DcaRng {
    /// Create an RNG from the master seed and a stable slot index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Non-reproducible stream seeded from OS entropy.
    /// For production assignment only; tests always use `new`.
    pub fn from_entropy() -> Self {
        Self {
            name: "entropy",
            inner: Pcg64Mcg::from_entropy(),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl RngCore for DcaRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// All RNG streams for one engine, indexed by stable slot.
#[derive(Debug, Clone, Copy)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn for_slot(&self, slot: RngSlot) -> DcaRng {
        DcaRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable slot assignments.
/// NEVER reorder or remove entries. Append only.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngSlot {
    Generator  = 0,
    Split      = 1,
    Forest     = 2,
    Assignment = 3,
    // Add new slots here, append only.
}

impl RngSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generator  => "generator",
            Self::Split      => "split",
            Self::Forest     => "forest",
            Self::Assignment => "assignment",
        }
    }
}
