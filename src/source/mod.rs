//! Hardware word production with a bounded retry budget.
//!
//! The CPU's random-number instruction reports success through a status
//! flag and may transiently fail. This module turns single invocations
//! into whole words, giving up after a fixed number of attempts.

mod instruction;
mod mock;
mod retry;

pub use instruction::{Attempt, HardwareInstruction, RdRand, Unavailable, Word, WORD_BYTES};
pub use mock::MockInstruction;
pub use retry::{EntropyError, EntropySource, RetryBudget, RetryBudgetError};
