//! Deterministic random number generation.
//!
//! RULE: Fixture data (users, referrals, stamps) never touches a platform
//! RNG. All of it flows through a `SeededRng` derived from the user's
//! email, so the same email always yields the same profile.
//!
//! Two streams exist:
//!   - `SeededRng`: hash-seeded LCG. Its exact output is part of the
//!     fixture contract and must never change.
//!   - `SessionRng`: PCG stream for session-level noise (latency jitter).
//!     Reproducible from its `u64` seed but not tied to any email.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

const LCG_MULTIPLIER: u32 = 1_103_515_245;
const LCG_INCREMENT: u32 = 12_345;
const LCG_MASK: u32 = 0x7fff_ffff;
const LCG_MODULUS: f64 = 2_147_483_648.0; // 2^31

/// 32-bit polynomial rolling hash (`h * 31 + unit`) over UTF-16 code units.
pub fn hash_seed(seed: &str) -> i32 {
    seed.encode_utf16().fold(0i32, |h, unit| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(unit as i32)
    })
}

/// Hash-seeded linear congruential generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn from_seed_str(seed: &str) -> Self {
        Self::from_hash(hash_seed(seed))
    }

    /// State is `|hash|`; a zero state is coerced to 1.
    pub fn from_hash(hash: i32) -> Self {
        let state = hash.unsigned_abs();
        Self {
            state: if state == 0 { 1 } else { state },
        }
    }

    fn step(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT)
            & LCG_MASK;
        self.state
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        self.step() as f64 / LCG_MODULUS
    }

    /// Roll an index in [0, n). Returns 0 when `n == 0`.
    pub fn next_below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        ((self.next_f64() * n as f64) as usize).min(n - 1)
    }

    /// Roll an integer in [lo, hi].
    pub fn range_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo + 1) as usize;
        lo + self.next_below(span) as i64
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick one element. `None` only for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.next_below(items.len()))
    }

    /// Roll an index into `weights` proportionally to its weight.
    /// Falls back to the last index on rounding drift.
    pub fn weighted_index(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        if weights.is_empty() || total <= 0.0 {
            return 0;
        }
        let mut roll = self.next_f64() * total;
        for (i, w) in weights.iter().enumerate() {
            if roll < *w {
                return i;
            }
            roll -= w;
        }
        weights.len() - 1
    }
}

/// Session-level PCG stream.
pub struct SessionRng {
    inner: Pcg64Mcg,
}

impl SessionRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [lo, hi]. Returns `lo` when the range is empty.
    pub fn next_u64_between(&mut self, lo: u64, hi: u64) -> u64 {
        use rand::RngCore;
        if hi <= lo {
            return lo;
        }
        lo + self.inner.next_u64() % (hi - lo + 1)
    }
}
