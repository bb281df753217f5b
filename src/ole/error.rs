/// Error types for compound file operations.
use std::io;
use thiserror::Error;

/// Result type for compound file operations.
pub type Result<T> = std::result::Result<T, OleError>;

/// Error types for compound file operations.
#[derive(Error, Debug)]
pub enum OleError {
    /// IO error (open failure or short physical read)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Signature mismatch; the input is not a compound file
    #[error("Not an OLE file")]
    NotOleFile,

    /// Structural damage that does not fit a more specific variant
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Sector shifts other than 9 / 6
    #[error("Unsupported sector size: shift {sector_shift}, mini shift {mini_sector_shift}")]
    UnsupportedSectorSize {
        sector_shift: u16,
        mini_sector_shift: u16,
    },

    /// More FAT sectors than the header can address directly
    #[error("Too many FAT sectors: {0} (at most 109 supported)")]
    TooManyFatSectors(u32),

    /// A sentinel or out-of-range sector ID where a real sector was required
    #[error("Invalid sector ID {0:#010X}")]
    InvalidSector(u32),

    /// A chain ended before the declared number of sectors was read
    #[error("{what} chain ended after {read} of {expected} sectors")]
    TruncatedChain {
        what: &'static str,
        expected: u32,
        read: u32,
    },

    /// A chain revisits a sector it already passed through
    #[error("Cyclic sector chain at sector {0}")]
    CyclicChain(u32),

    /// Stream name absent from the file table
    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    /// Stream chain ran out before its declared size was satisfied
    #[error("Corrupted stream chain: ended at byte {position} of {declared}")]
    CorruptChain { position: u64, declared: u64 },
}

impl OleError {
    /// Whether this error means the container itself is malformed
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            OleError::NotOleFile
                | OleError::InvalidFormat(_)
                | OleError::UnsupportedSectorSize { .. }
                | OleError::TooManyFatSectors(_)
                | OleError::InvalidSector(_)
                | OleError::TruncatedChain { .. }
                | OleError::CyclicChain(_)
        )
    }

    /// Whether this is a plain lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, OleError::StreamNotFound(_))
    }
}

impl From<OleError> for io::Error {
    fn from(err: OleError) -> Self {
        match err {
            OleError::Io(e) => e,
            other @ OleError::StreamNotFound(_) => io::Error::new(io::ErrorKind::NotFound, other),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(OleError::NotOleFile.is_format_error());
        assert!(OleError::TooManyFatSectors(110).is_format_error());
        assert!(!OleError::StreamNotFound("x".into()).is_format_error());
        assert!(OleError::StreamNotFound("x".into()).is_not_found());

        let corrupt = OleError::CorruptChain {
            position: 512,
            declared: 4096,
        };
        assert!(!corrupt.is_format_error());
        assert!(!corrupt.is_not_found());
    }

    #[test]
    fn test_into_io_error() {
        let err: io::Error = OleError::CorruptChain {
            position: 0,
            declared: 10,
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err: io::Error = OleError::StreamNotFound("Data".into()).into();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        let err: io::Error =
            OleError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "short")).into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_display() {
        let err = OleError::InvalidSector(0xFFFFFFFF);
        assert_eq!(err.to_string(), "Invalid sector ID 0xFFFFFFFF");

        let err = OleError::TruncatedChain {
            what: "MiniFAT",
            expected: 3,
            read: 1,
        };
        assert_eq!(err.to_string(), "MiniFAT chain ended after 1 of 3 sectors");
    }
}
