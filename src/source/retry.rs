//! Bounded-retry word production.

use super::instruction::{Attempt, HardwareInstruction, Word};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that end an attempt to produce a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EntropyError {
    #[error("hardware rng failed on all {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },
    #[error("hardware rng instruction not supported on this platform")]
    Unsupported,
}

/// Rejected retry budget value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("retry budget must be at least 1")]
pub struct RetryBudgetError;

/// Maximum number of hardware invocations spent on one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RetryBudget(u32);

impl RetryBudget {
    /// Attempts per word used by the reference driver.
    pub const DEFAULT: Self = Self(10);

    /// Creates a budget of `attempts` invocations per word.
    pub fn new(attempts: u32) -> Result<Self, RetryBudgetError> {
        if attempts == 0 {
            return Err(RetryBudgetError);
        }
        Ok(Self(attempts))
    }

    /// Returns the number of attempts.
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for RetryBudget {
    type Error = RetryBudgetError;

    fn try_from(attempts: u32) -> Result<Self, Self::Error> {
        Self::new(attempts)
    }
}

impl From<RetryBudget> for u32 {
    fn from(budget: RetryBudget) -> Self {
        budget.0
    }
}

impl fmt::Display for RetryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Produces single hardware words, retrying transient failures.
///
/// Holds no mutable state, so one source can serve any number of
/// concurrent callers.
#[derive(Debug, Clone)]
pub struct EntropySource<I> {
    instruction: I,
    budget: RetryBudget,
}

impl<I: HardwareInstruction> EntropySource<I> {
    /// Creates a source with the default retry budget.
    pub fn new(instruction: I) -> Self {
        Self::with_budget(instruction, RetryBudget::DEFAULT)
    }

    /// Creates a source with a custom retry budget.
    pub fn with_budget(instruction: I, budget: RetryBudget) -> Self {
        Self {
            instruction,
            budget,
        }
    }

    /// Returns the retry budget.
    pub fn budget(&self) -> RetryBudget {
        self.budget
    }

    /// Returns the underlying instruction.
    pub fn instruction(&self) -> &I {
        &self.instruction
    }

    /// Produces one word.
    ///
    /// Stops at the first successful attempt. An unsupported instruction
    /// fails immediately instead of spending the budget.
    pub fn next_word(&self) -> Result<Word, EntropyError> {
        let attempts = self.budget.get();

        for attempt in 1..=attempts {
            match self.instruction.attempt() {
                Attempt::Success(word) => {
                    if attempt > 1 {
                        tracing::trace!(attempt, "hardware rng succeeded after retry");
                    }
                    return Ok(word);
                }
                Attempt::Failure => continue,
                Attempt::Unsupported => return Err(EntropyError::Unsupported),
            }
        }

        tracing::warn!(attempts, "hardware rng retry budget exhausted");
        Err(EntropyError::ExhaustedRetries { attempts })
    }
}
