/// Constants for OLE file format
pub mod consts;

/// Error type shared by every loader and reader
pub mod error;

/// Options controlling how a container is opened
mod config;

/// Header (superblock) parsing and validation
pub mod header;

/// FAT / MiniFAT loading and chain following
pub mod sector_table;

/// Root entry stream backing the mini sectors
mod ministream;

/// Directory entry decoding and the linear directory scan
pub mod directory;

/// Pluggable entry name decoding
pub mod names;

/// Seekable reader over one stream
mod stream;

/// Main OLE file parsing implementation
mod file;

#[cfg(test)]
mod test_image;


// Re-export public types for convenient access
pub use config::{OpenOptions, Verbosity};
pub use directory::{DirectoryEntry, EntryKind, FileTableEntry};
pub use error::{OleError, Result};
pub use file::CompoundFile;
pub use header::{Superblock, is_ole_file};
pub use ministream::MiniStream;
pub use names::{NameDecoder, Utf16LeNames};
pub use sector_table::SectorTable;
pub use stream::{Allocation, OleStream};
