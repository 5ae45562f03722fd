//! Ecosystem adapters over [`StreamReader`].

use super::stream::StreamReader;
use crate::source::{EntropySource, HardwareInstruction, RdRand};
use rand_core::RngCore;
use std::io;

/// A hardware-backed random generator.
///
/// Implements [`RngCore`] and [`io::Read`]. Output is raw hardware words
/// with no post-processing.
#[derive(Debug, Clone)]
pub struct HardwareRng<I = RdRand> {
    reader: StreamReader<I>,
}

impl HardwareRng<RdRand> {
    /// Creates a generator over the CPU's `rdrand` instruction.
    pub fn detect() -> Self {
        Self::new(StreamReader::new(EntropySource::new(RdRand::detect())))
    }
}

impl<I: HardwareInstruction> HardwareRng<I> {
    /// Wraps an existing reader.
    pub fn new(reader: StreamReader<I>) -> Self {
        Self { reader }
    }

    /// Returns the underlying reader.
    pub fn reader(&self) -> &StreamReader<I> {
        &self.reader
    }
}

impl<I: HardwareInstruction> RngCore for HardwareRng<I> {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_ne_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_ne_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if let Err(err) = self.try_fill_bytes(dest) {
            panic!("hardware rng failed: {}", err);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.reader
            .read_into(dest)
            .map(|_| ())
            .map_err(rand_core::Error::new)
    }
}

impl<I: HardwareInstruction> io::Read for HardwareRng<I> {
    /// Fills `buf`, returning a short count if the hardware fails after
    /// some bytes were delivered.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reader.read_into(buf) {
            Ok(n) => Ok(n),
            Err(err) if err.delivered > 0 => Ok(err.delivered),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Attempt, MockInstruction, Word, WORD_BYTES};
    use std::io::Read;

    fn rng(mock: MockInstruction) -> HardwareRng<MockInstruction> {
        HardwareRng::new(StreamReader::new(EntropySource::new(mock)))
    }

    #[test]
    fn test_try_fill_bytes_reports_failure() {
        let mut rng = rng(MockInstruction::failing());
        let mut buf = [0u8; 16];

        assert!(rng.try_fill_bytes(&mut buf).is_err());
    }

    #[test]
    fn test_next_u64_uses_word_bytes() {
        let mut rng = rng(MockInstruction::always(Word::MAX));
        assert_eq!(rng.next_u64(), u64::MAX);
        assert_eq!(rng.next_u32(), u32::MAX);
    }

    #[test]
    #[should_panic(expected = "hardware rng failed")]
    fn test_fill_bytes_panics_on_failure() {
        let mut rng = rng(MockInstruction::unsupported());
        let mut buf = [0u8; 4];
        rng.fill_bytes(&mut buf);
    }

    #[test]
    fn test_io_read_short_count_after_partial_failure() {
        let mock = MockInstruction::scripted([Attempt::Success(1)], Attempt::Failure);
        let mut rng = rng(mock);
        let mut buf = vec![0u8; 4 * WORD_BYTES];

        assert_eq!(rng.read(&mut buf).unwrap(), WORD_BYTES);
        // Nothing delivered on the next call surfaces as an error
        assert!(rng.read(&mut buf).is_err());
    }

    #[test]
    fn test_io_read_exact() {
        let mut rng = rng(MockInstruction::counting());
        let mut buf = [0u8; 37];

        rng.read_exact(&mut buf).unwrap();
    }
}
