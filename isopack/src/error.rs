/// Errors raised while decoding a compressed block stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("compressed input ended early at offset {offset}")]
    InputOverrun { offset: usize },

    #[error("back-reference distance {distance} reaches before output start (output length {position})")]
    LookBehindOverrun { distance: usize, position: usize },

    #[error("absolute copy source {source_pos} is past output length {position}")]
    CopySourceOverrun { source_pos: usize, position: usize },

    #[error("decoded data exceeds declared size of {expected} bytes")]
    OutputOverrun { expected: usize },

    #[error("decoded {actual} bytes but block declared {expected}")]
    OutputUnderrun { expected: usize, actual: usize },

    #[error("block at offset {offset} declares {declared} payload bytes but only {available} remain")]
    BlockOverrun {
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("unsupported compression format version {0}")]
    UnsupportedVersion(u32),
}

pub type Result<T> = std::result::Result<T, FormatError>;
