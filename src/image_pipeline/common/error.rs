use thiserror::Error;

#[derive(Error, Debug)]
pub enum CineError {
    #[error("Malformed CINE header: {0}")]
    Format(String),

    #[error("Frame index {index} out of range (file holds {count} frames)")]
    OutOfRange { index: i64, count: u32 },

    #[error("Camera frame number {frame} out of range (first stored frame {first}, {count} frames)")]
    FrameNumberOutOfRange { frame: i64, first: i32, count: u32 },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Demosaic failed: {0}")]
    Demosaic(String),

    #[error("Failed to encode TIFF image: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CineError {
    /// True for errors local to one frame request, which leave a reader usable.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            CineError::OutOfRange { .. } | CineError::FrameNumberOutOfRange { .. }
        )
    }

    /// Maps an I/O failure while reading fixed header structures to a format error.
    ///
    /// A short read there means the file is truncated, not that the disk failed.
    pub(crate) fn truncated(what: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            CineError::Format(format!("truncated {what}"))
        } else {
            CineError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, CineError>;
