use thiserror::Error;

/// Errors raised while building or streaming an encoded image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("invalid image dimensions {width}x{height}: both must be positive")]
    InvalidDimension { width: u32, height: u32 },

    #[error("a {width}x{height} image does not fit in a single PNG chunk")]
    SizeOverflow { width: u32, height: u32 },

    #[error("pixel source holds {available} bytes but {required} are needed")]
    SourceTooSmall { required: usize, available: usize },

    /// The cursor and the layout disagree. Never expected in correct operation;
    /// the stream that raised it is unusable afterwards.
    #[error("internal inconsistency at byte {position}: {reason}")]
    InternalInconsistency { position: u64, reason: &'static str },

    #[error("{0} is not supported on a forward-only stream")]
    UnsupportedOperation(&'static str),
}

pub type Result<T, E = EncodeError> = std::result::Result<T, E>;
