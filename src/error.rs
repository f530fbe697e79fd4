/*
 * @file error.rs
 * @author garbled_cuckoo authors
 * @copyright 2026 garbled_cuckoo authors
 *
 * Errors from building and querying oblivious key-value stores.
 */

/** Errors produced while constructing, encoding or decoding a store. */
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /** The parameters can't describe a valid structure. */
    #[error("invalid parameters: {reason}")]
    InvalidParameters {
        /** What was wrong with them. */
        reason: String,
    },

    /** More (key,value) pairs than the structure was sized for. */
    #[error("too many entries: got {entries}, capacity is {capacity}")]
    TooManyEntries {
        entries: usize,
        capacity: usize,
    },

    /** Garbled Bloom filter: every position of a key was already taken. */
    #[error("no empty slot for key #{key_index}")]
    NoEmptySlot {
        /** Index of the key in insertion order. */
        key_index: usize,
    },

    /** The linear system over the 2-core has no solution. */
    #[error("no solution ({reason}): {rows} equations over {columns} unknowns")]
    NoSolution {
        reason: &'static str,
        rows: usize,
        columns: usize,
    },

    /** Cluster variant: a bin got more keys than its local capacity. */
    #[error("bin {bin} overflowed: {entries} entries, capacity {capacity}")]
    BinOverflow {
        bin: usize,
        entries: usize,
        capacity: usize,
    },

    /** Decoding was handed storage of the wrong length. */
    #[error("storage length mismatch: expected {expected}, got {actual}")]
    StorageLength {
        expected: usize,
        actual: usize,
    },
}

impl Error {
    /**
     * Is this one of the negligible-probability failures that go away
     * with fresh hash keys?
     */
    pub fn is_retryable(&self) -> bool {
        matches!(self,
            Error::NoSolution { .. } | Error::NoEmptySlot { .. } | Error::BinOverflow { .. })
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Error::InvalidParameters { reason: reason.into() }
    }
}

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use crate::error::Error;

    #[test]
    fn test_retryable() {
        assert!(Error::NoSolution { reason: "inconsistent", rows: 3, columns: 2 }.is_retryable());
        assert!(Error::NoEmptySlot { key_index: 7 }.is_retryable());
        assert!(Error::BinOverflow { bin: 1, entries: 9, capacity: 8 }.is_retryable());
        assert!(!Error::TooManyEntries { entries: 9, capacity: 8 }.is_retryable());
        assert!(!Error::invalid("m < n").is_retryable());
        assert!(!Error::StorageLength { expected: 8, actual: 16 }.is_retryable());
    }

    #[test]
    fn test_messages() {
        let e = Error::TooManyEntries { entries: 65, capacity: 64 };
        assert_eq!(e.to_string(), "too many entries: got 65, capacity is 64");
        let e = Error::invalid("m = 12 is not a multiple of 8");
        assert_eq!(e.to_string(), "invalid parameters: m = 12 is not a multiple of 8");
    }
}
