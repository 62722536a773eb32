use isopack::FormatError;

/// Conditions that abort a map load. Everything else is reported as a
/// [`Diagnostic`](crate::diagnostics::Diagnostic) and the offending row is skipped.
#[derive(Debug, thiserror::Error)]
pub enum MapLoadError {
    #[error("missing [{0}] section")]
    MissingSection(&'static str),

    #[error("malformed map size {value:?}")]
    MalformedSize { value: String },

    #[error("map size {width}x{height} exceeds maximum {max_width}x{max_height}")]
    SizeTooLarge {
        width: i32,
        height: i32,
        max_width: i32,
        max_height: i32,
    },

    #[error("corrupt tile pack: {0}")]
    CorruptTilePack(#[from] FormatError),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("map load failed: {0}")]
    Load(#[from] MapLoadError),

    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
