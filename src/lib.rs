//! olecf - A Rust library for reading OLE2 compound files
//!
//! Compound files (the container behind legacy .xls, .doc and .ppt documents)
//! behave like a small filesystem packed into one file: named streams are
//! split into 512-byte sectors, or 64-byte mini sectors for small streams,
//! and stitched back together through allocation tables.
//!
//! # Features
//!
//! - **Header validation**: signature, byte order, sector shifts and the
//!   single-level FAT limit are checked before anything else is read
//! - **Two-tier allocation**: FAT and MiniFAT chains with sentinel and cycle
//!   checks on every walk
//! - **Stream reader**: `std::io::Read` + `Seek` over a fragmented stream,
//!   with corrupt chains reported separately from normal end of stream
//! - **Shared handles**: any number of streams may be open on one container
//!
//! # Example - Reading a stream
//!
//! ```no_run
//! use std::io::Read;
//! use olecf::ole::CompoundFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ole = CompoundFile::open_path("book.xls")?;
//!
//! for entry in ole.file_table() {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//!
//! let mut stream = ole.open_stream("Workbook")?;
//! let mut data = Vec::new();
//! stream.read_to_end(&mut data)?;
//! println!("Workbook stream: {} bytes", data.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Diagnostics and name decoding
//!
//! ```no_run
//! use olecf::ole::{OpenOptions, Verbosity};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ole = OpenOptions::new()
//!     .with_verbosity(Verbosity::Detailed)
//!     .open("book.xls")?;
//! println!("{} directory entries", ole.entries().len());
//! # Ok(())
//! # }
//! ```

/// OLE2 (Object Linking and Embedding) compound file reader
///
/// This module provides the container engine: header validation, the FAT and
/// MiniFAT, the directory scan and seekable stream handles.
pub mod ole;

// Re-export commonly used types for convenience
pub use ole::{CompoundFile, OleError, OleStream, OpenOptions};
