//! Word-by-word request filling.

use super::request::ReadRequest;
use crate::source::{EntropyError, EntropySource, HardwareInstruction, WORD_BYTES};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a failed read leaves behind in the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Bytes copied before the failure stay in the buffer.
    #[default]
    Partial,
    /// Bytes copied by the failed call are zeroed and the cursor rewound.
    AllOrNothing,
}

/// A read that stopped before the request was complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("read failed after {delivered} bytes: {source}")]
pub struct ReadError {
    /// The hardware failure that ended the read.
    #[source]
    pub source: EntropyError,
    /// Bytes left in the buffer by this call.
    pub delivered: usize,
}

impl From<ReadError> for std::io::Error {
    fn from(err: ReadError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err)
    }
}

/// Fills requests of any length from an [`EntropySource`].
///
/// Each call keeps its loop state on the stack; the reader itself is
/// immutable and can be shared across threads.
#[derive(Debug, Clone)]
pub struct StreamReader<I> {
    source: EntropySource<I>,
    delivery: Delivery,
}

impl<I: HardwareInstruction> StreamReader<I> {
    /// Creates a reader that keeps partial output on failure.
    pub fn new(source: EntropySource<I>) -> Self {
        Self::with_delivery(source, Delivery::Partial)
    }

    /// Creates a reader with an explicit failure delivery policy.
    pub fn with_delivery(source: EntropySource<I>, delivery: Delivery) -> Self {
        Self { source, delivery }
    }

    /// Returns the word source.
    pub fn source(&self) -> &EntropySource<I> {
        &self.source
    }

    /// Returns the failure delivery policy.
    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    /// Delivers bytes until `request` is complete.
    ///
    /// Bytes are the host-order representation of each word. The last word
    /// of a request may be only partially used; its remaining bytes are
    /// discarded.
    pub fn fill(&self, request: &mut ReadRequest<'_>) -> Result<(), ReadError> {
        let start = request.cursor();

        while !request.is_complete() {
            let word = match self.source.next_word() {
                Ok(word) => word,
                Err(source) => {
                    if self.delivery == Delivery::AllOrNothing {
                        request.rewind_to(start);
                    }
                    let delivered = request.cursor() - start;
                    tracing::debug!(
                        requested = request.len(),
                        delivered,
                        error = %source,
                        "read terminated by hardware failure"
                    );
                    return Err(ReadError { source, delivered });
                }
            };

            let bytes = word.to_ne_bytes();
            request.put(&bytes[..request.remaining().min(WORD_BYTES)]);
        }

        Ok(())
    }

    /// Fills all of `buf`, returning the number of bytes written.
    pub fn read_into(&self, buf: &mut [u8]) -> Result<usize, ReadError> {
        let mut request = ReadRequest::new(buf);
        self.fill(&mut request)?;
        Ok(request.cursor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Attempt, MockInstruction, RetryBudget, Word};
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn reader(mock: MockInstruction) -> StreamReader<MockInstruction> {
        StreamReader::new(EntropySource::new(mock))
    }

    fn invocations(reader: &StreamReader<MockInstruction>) -> usize {
        reader.source().instruction().invocations()
    }

    #[test]
    fn test_zero_length_makes_no_hardware_calls() {
        let reader = reader(MockInstruction::always(1));
        let mut buf: [u8; 0] = [];

        assert_eq!(reader.read_into(&mut buf), Ok(0));
        assert_eq!(invocations(&reader), 0);
    }

    #[test]
    fn test_short_request_uses_word_prefix() {
        let word: Word = Word::MAX / 3;
        let reader = reader(MockInstruction::always(word));
        let mut buf = [0u8; 3];

        assert_eq!(reader.read_into(&mut buf), Ok(3));
        assert_eq!(buf, word.to_ne_bytes()[..3]);
        assert_eq!(invocations(&reader), 1);
    }

    #[test]
    fn test_two_word_request_makes_two_calls() {
        let reader = reader(MockInstruction::counting());
        let mut buf = vec![0u8; 2 * WORD_BYTES];

        assert_eq!(reader.read_into(&mut buf), Ok(2 * WORD_BYTES));
        assert_eq!(invocations(&reader), 2);
        assert_eq!(buf[..WORD_BYTES], (1 as Word).to_ne_bytes());
        assert_eq!(buf[WORD_BYTES..], (2 as Word).to_ne_bytes());
    }

    #[test]
    fn test_transient_failures_are_invisible() {
        let mock = MockInstruction::scripted(
            [
                Attempt::Failure,
                Attempt::Failure,
                Attempt::Success(11),
                Attempt::Success(12),
            ],
            Attempt::Failure,
        );
        let reader = reader(mock);
        let mut buf = vec![0u8; 2 * WORD_BYTES];

        assert!(reader.read_into(&mut buf).is_ok());
        assert_eq!(buf[..WORD_BYTES], (11 as Word).to_ne_bytes());
        assert_eq!(buf[WORD_BYTES..], (12 as Word).to_ne_bytes());
    }

    #[test]
    fn test_failure_keeps_full_words_written() {
        let mock = MockInstruction::scripted(
            [Attempt::Success(21), Attempt::Success(22)],
            Attempt::Failure,
        );
        let reader = reader(mock);
        let mut buf = vec![0xAAu8; 3 * WORD_BYTES];

        let err = reader.read_into(&mut buf).unwrap_err();

        assert_eq!(err.delivered, 2 * WORD_BYTES);
        assert_eq!(err.source, EntropyError::ExhaustedRetries { attempts: 10 });
        assert_eq!(buf[..WORD_BYTES], (21 as Word).to_ne_bytes());
        assert_eq!(buf[WORD_BYTES..2 * WORD_BYTES], (22 as Word).to_ne_bytes());
        // Unwritten remainder is left untouched
        assert!(buf[2 * WORD_BYTES..].iter().all(|&b| b == 0xAA));
        assert_eq!(invocations(&reader), 2 + 10);
    }

    #[test]
    fn test_all_or_nothing_zeroes_on_failure() {
        let mock = MockInstruction::scripted([Attempt::Success(Word::MAX)], Attempt::Failure);
        let reader = StreamReader::with_delivery(EntropySource::new(mock), Delivery::AllOrNothing);
        let mut buf = vec![0xAAu8; 2 * WORD_BYTES];
        let mut request = ReadRequest::new(&mut buf);

        let err = reader.fill(&mut request).unwrap_err();

        assert_eq!(err.delivered, 0);
        assert_eq!(request.cursor(), 0);
        drop(request);
        assert!(buf[..WORD_BYTES].iter().all(|&b| b == 0));
        assert!(buf[WORD_BYTES..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_unsupported_fails_read() {
        let reader = reader(MockInstruction::unsupported());
        let mut buf = [0u8; 4];

        let err = reader.read_into(&mut buf).unwrap_err();
        assert_eq!(err.source, EntropyError::Unsupported);
        assert_eq!(err.delivered, 0);
    }

    #[test]
    fn test_fill_resumes_from_cursor() {
        let reader = reader(MockInstruction::counting());
        let mut buf = vec![0u8; WORD_BYTES + 2];
        let mut request = ReadRequest::new(&mut buf);
        request.put(&[0xFF, 0xFF]);

        reader.fill(&mut request).unwrap();

        assert!(request.is_complete());
        drop(request);
        assert_eq!(buf[..2], [0xFF, 0xFF]);
        assert_eq!(buf[2..], (1 as Word).to_ne_bytes());
    }

    #[test]
    fn test_read_error_converts_to_io_error() {
        let err = ReadError {
            source: EntropyError::Unsupported,
            delivered: 0,
        };
        let io_err: std::io::Error = err.into();

        assert_eq!(io_err.kind(), std::io::ErrorKind::Other);
        assert!(io_err.to_string().contains("not supported"));
    }

    #[test]
    fn test_concurrent_readers_see_whole_words() {
        const THREADS: usize = 8;
        const READS: usize = 100;
        const WORDS_PER_READ: usize = 4;

        let reader = Arc::new(reader(MockInstruction::counting()));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let reader = Arc::clone(&reader);
                std::thread::spawn(move || {
                    let mut words = Vec::with_capacity(READS * WORDS_PER_READ);
                    for _ in 0..READS {
                        let mut buf = [0u8; WORDS_PER_READ * WORD_BYTES];
                        reader.read_into(&mut buf).unwrap();
                        words.extend(buf.chunks_exact(WORD_BYTES).map(|chunk| {
                            let mut bytes = [0u8; WORD_BYTES];
                            bytes.copy_from_slice(chunk);
                            Word::from_ne_bytes(bytes)
                        }));
                    }
                    words
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for word in handle.join().unwrap() {
                assert!(seen.insert(word), "word {} delivered twice", word);
            }
        }

        let total = THREADS * READS * WORDS_PER_READ;
        assert_eq!(seen.len(), total);
        assert!(seen.iter().all(|&w| (1..=total).contains(&w)));
    }

    proptest! {
        #[test]
        fn prop_delivers_exactly_requested_bytes(len in 0usize..512) {
            let reader = reader(MockInstruction::counting());
            let mut buf = vec![0u8; len];

            prop_assert_eq!(reader.read_into(&mut buf), Ok(len));
            prop_assert_eq!(invocations(&reader), (len + WORD_BYTES - 1) / WORD_BYTES);
        }

        #[test]
        fn prop_partial_failure_delivers_whole_words(
            good_words in 0usize..8,
            extra in 1usize..64,
            budget in 1u32..16,
        ) {
            let mock = MockInstruction::scripted(
                (1..=good_words).map(Attempt::Success),
                Attempt::Failure,
            );
            let source = EntropySource::with_budget(mock, RetryBudget::new(budget).unwrap());
            let reader = StreamReader::new(source);
            let mut buf = vec![0u8; good_words * WORD_BYTES + extra];

            let err = reader.read_into(&mut buf).unwrap_err();

            prop_assert_eq!(err.delivered, good_words * WORD_BYTES);
            prop_assert_eq!(err.source, EntropyError::ExhaustedRetries { attempts: budget });
            prop_assert_eq!(invocations(&reader), good_words + budget as usize);
        }
    }
}
