//! The single-invocation hardware primitive.
//!
//! On x86 the `rdrand` instruction sets the carry flag when the returned
//! value is valid. The `_rdrand*_step` intrinsics surface that flag as
//! their return value, which is mapped here to [`Attempt`].

#![allow(unsafe_code)]

/// One hardware random value, native machine width.
pub type Word = usize;

/// Size of a [`Word`] in bytes.
pub const WORD_BYTES: usize = std::mem::size_of::<Word>();

/// Outcome of a single hardware invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// The status flag signalled a valid value.
    Success(Word),
    /// The instruction ran but produced no valid value.
    Failure,
    /// The instruction is not available on this CPU or target.
    Unsupported,
}

/// A hardware random-number instruction that can be invoked once.
///
/// Implementations must be safe to call concurrently from many threads.
pub trait HardwareInstruction: Send + Sync {
    /// Invokes the instruction once and reports its status.
    fn attempt(&self) -> Attempt;
}

impl<T: HardwareInstruction + ?Sized> HardwareInstruction for &T {
    fn attempt(&self) -> Attempt {
        (**self).attempt()
    }
}

impl<T: HardwareInstruction + ?Sized> HardwareInstruction for std::sync::Arc<T> {
    fn attempt(&self) -> Attempt {
        (**self).attempt()
    }
}

/// The x86 `rdrand` instruction.
///
/// CPU support is probed once at construction. On CPUs without the
/// feature, and on non-x86 targets, every attempt is
/// [`Attempt::Unsupported`].
#[derive(Debug, Clone, Copy)]
pub struct RdRand {
    supported: bool,
}

impl RdRand {
    /// Probes the running CPU for `rdrand` support.
    pub fn detect() -> Self {
        let supported = Self::cpu_has_rdrand();
        if !supported {
            tracing::warn!("rdrand instruction not available, all reads will fail");
        }
        Self { supported }
    }

    /// Returns true if the instruction can be executed on this CPU.
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
    fn cpu_has_rdrand() -> bool {
        std::arch::is_x86_feature_detected!("rdrand")
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "x86")))]
    fn cpu_has_rdrand() -> bool {
        false
    }
}

impl Default for RdRand {
    fn default() -> Self {
        Self::detect()
    }
}

impl HardwareInstruction for RdRand {
    #[cfg(target_arch = "x86_64")]
    fn attempt(&self) -> Attempt {
        if !self.supported {
            return Attempt::Unsupported;
        }
        let mut value: u64 = 0;
        // SAFETY: `supported` is only true when CPUID reports rdrand.
        let status = unsafe { core::arch::x86_64::_rdrand64_step(&mut value) };
        if status == 1 {
            Attempt::Success(value as Word)
        } else {
            Attempt::Failure
        }
    }

    #[cfg(target_arch = "x86")]
    fn attempt(&self) -> Attempt {
        if !self.supported {
            return Attempt::Unsupported;
        }
        let mut value: u32 = 0;
        // SAFETY: `supported` is only true when CPUID reports rdrand.
        let status = unsafe { core::arch::x86::_rdrand32_step(&mut value) };
        if status == 1 {
            Attempt::Success(value as Word)
        } else {
            Attempt::Failure
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "x86")))]
    fn attempt(&self) -> Attempt {
        Attempt::Unsupported
    }
}

/// Fallback instruction for builds without hardware access.
///
/// Every attempt reports [`Attempt::Unsupported`]; it never yields a
/// zero-filled word.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl HardwareInstruction for Unavailable {
    fn attempt(&self) -> Attempt {
        Attempt::Unsupported
    }
}
