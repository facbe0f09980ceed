//! Deterministic username sequence.
//!
//! Name `i` is `user_{(seed + i * multiplier) mod max_users}`. For a fixed
//! seed and multiplier the sequence is fully reproducible; it repeats after
//! [`UsernameGenerator::cycle_len`] names.

use crate::errors::GeneratorError;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Primes below 100; the stride between consecutive names.
pub const MULTIPLIERS: [u64; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

pub const DEFAULT_MAX_USERS: u64 = 10_000;

const DEFAULT_PREFIX: &str = "user";

/// How the per-call counter is advanced when many sessions share one
/// generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CounterMode {
    /// Read and write the counter separately. Concurrent callers can observe
    /// the same index and therefore receive the same username.
    #[default]
    Racy,
    /// Atomic fetch-and-increment: every call gets a distinct index.
    Serialized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub max_users: u64,
    /// Chosen uniformly from `0..=max_users` when absent.
    pub seed: Option<u64>,
    /// Chosen uniformly from [`MULTIPLIERS`] when absent.
    pub multiplier: Option<u64>,
    pub mode: CounterMode,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_users: DEFAULT_MAX_USERS,
            seed: None,
            multiplier: None,
            mode: CounterMode::default(),
        }
    }
}

#[derive(Debug)]
pub struct UsernameGenerator {
    seed: u64,
    multiplier: u64,
    max_users: u64,
    mode: CounterMode,
    counter: AtomicU64,
}

impl UsernameGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        Self::with_rng(config, &mut rand::thread_rng())
    }

    /// Like [`UsernameGenerator::new`], drawing any unset seed or multiplier
    /// from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        config: &GeneratorConfig,
        rng: &mut R,
    ) -> Result<Self, GeneratorError> {
        if config.max_users == 0 {
            return Err(GeneratorError::ZeroMaxUsers);
        }
        let multiplier = match config.multiplier {
            Some(m) if MULTIPLIERS.contains(&m) => m,
            Some(m) => return Err(GeneratorError::UnsupportedMultiplier { multiplier: m }),
            None => *MULTIPLIERS.choose(rng).unwrap_or(&MULTIPLIERS[0]),
        };
        let seed = config
            .seed
            .unwrap_or_else(|| rng.gen_range(0..=config.max_users));

        Ok(Self {
            seed,
            multiplier,
            max_users: config.max_users,
            mode: config.mode,
            counter: AtomicU64::new(0),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    pub fn max_users(&self) -> u64 {
        self.max_users
    }

    pub fn mode(&self) -> CounterMode {
        self.mode
    }

    /// Number of names handed out so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    pub fn generate(&self) -> String {
        self.generate_with_prefix(DEFAULT_PREFIX)
    }

    /// Next name in the sequence with a caller-chosen prefix, e.g.
    /// `expert_4217`. Shares the counter with [`UsernameGenerator::generate`].
    pub fn generate_with_prefix(&self, prefix: &str) -> String {
        let index = self.next_index();
        format!("{prefix}_{}", self.slot(index))
    }

    /// Numeric suffix of the `index`-th name.
    pub fn slot(&self, index: u64) -> u64 {
        let value = self.seed as u128 + index as u128 * self.multiplier as u128;
        (value % self.max_users as u128) as u64
    }

    /// Distinct names produced before the sequence repeats.
    pub fn cycle_len(&self) -> u64 {
        self.max_users / gcd(self.multiplier, self.max_users)
    }

    fn next_index(&self) -> u64 {
        match self.mode {
            CounterMode::Racy => {
                let index = self.counter.load(Ordering::Relaxed);
                self.counter.store(index.wrapping_add(1), Ordering::Relaxed);
                index
            }
            CounterMode::Serialized => self.counter.fetch_add(1, Ordering::SeqCst),
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
