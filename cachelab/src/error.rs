use thiserror::Error;

/// The error taxonomy for a simulation run
///
/// Every error is detected at the point of occurrence and is fatal for the
/// run; this is a deterministic batch simulation, nothing is retried
#[derive(Debug, Error)]
pub enum Error {
    /// The requested cache geometry is invalid, rejected before any cache
    /// storage is built
    #[error("invalid cache configuration: {0}")]
    Config(String),

    /// The line storage for the cache could not be reserved
    #[error("couldn't allocate storage for {lines} cache lines")]
    Allocation { lines: usize },

    /// The trace could not be read
    #[error("couldn't read the trace: {0}")]
    Io(#[from] std::io::Error),

    /// A trace record that doesn't match the trace grammar. Replay halts at
    /// the offending line and no statistics are reported
    #[error("malformed trace record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
}
