//! Scripted instruction for testing and benchmarking.

use super::instruction::{Attempt, HardwareInstruction, Word};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy)]
enum Fallback {
    Fixed(Attempt),
    /// Successful attempts yielding 1, 2, 3, ...
    Counting,
}

/// Mock instruction that replays a script of attempts.
///
/// Once the script runs out every attempt returns the fallback outcome.
/// All invocations are counted, including scripted ones.
#[derive(Debug)]
pub struct MockInstruction {
    script: Mutex<VecDeque<Attempt>>,
    fallback: Fallback,
    invocations: AtomicUsize,
    counter: AtomicUsize,
}

impl MockInstruction {
    fn new(script: impl IntoIterator<Item = Attempt>, fallback: Fallback) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            invocations: AtomicUsize::new(0),
            counter: AtomicUsize::new(0),
        }
    }

    /// Always succeeds with `word`.
    pub fn always(word: Word) -> Self {
        Self::new([], Fallback::Fixed(Attempt::Success(word)))
    }

    /// Always succeeds, with a distinct increasing word each time.
    pub fn counting() -> Self {
        Self::new([], Fallback::Counting)
    }

    /// Fails `failures` times, then always succeeds with `word`.
    pub fn flaky(failures: u32, word: Word) -> Self {
        Self::new(
            std::iter::repeat(Attempt::Failure).take(failures as usize),
            Fallback::Fixed(Attempt::Success(word)),
        )
    }

    /// Never succeeds.
    pub fn failing() -> Self {
        Self::new([], Fallback::Fixed(Attempt::Failure))
    }

    /// Reports the instruction as unavailable.
    pub fn unsupported() -> Self {
        Self::new([], Fallback::Fixed(Attempt::Unsupported))
    }

    /// Replays `script`, then returns `fallback` forever.
    pub fn scripted(script: impl IntoIterator<Item = Attempt>, fallback: Attempt) -> Self {
        Self::new(script, Fallback::Fixed(fallback))
    }

    /// Returns the number of times the instruction was invoked.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl HardwareInstruction for MockInstruction {
    fn attempt(&self) -> Attempt {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        let scripted = match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        if let Some(attempt) = scripted {
            return attempt;
        }

        match self.fallback {
            Fallback::Fixed(attempt) => attempt,
            Fallback::Counting => {
                Attempt::Success(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
            }
        }
    }
}
