//! Options controlling how a compound file is opened.
//!
//! Diagnostics are configured per container rather than through a global
//! switch: two files opened side by side can log at different levels.

use super::error::Result;
use super::file::CompoundFile;
use super::names::{NameDecoder, Utf16LeNames};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::Arc;

/// How much the loader reports through the `log` facade while opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub enum Verbosity {
    /// Nothing beyond warnings about tolerated damage
    #[default]
    Quiet,
    /// Header fields and table sizes
    Summary,
    /// Summary plus one line per directory entry
    Detailed,
}

/// Configuration options for opening a compound file.
///
/// # Examples
///
/// ```rust
/// use olecf::ole::{OpenOptions, Verbosity};
///
/// // Create with defaults
/// let options = OpenOptions::default();
///
/// // Or customize
/// let options = OpenOptions::new()
///     .with_verbosity(Verbosity::Summary)
///     .with_name_decoder(|raw: &[u8]| Some(String::from_utf8_lossy(raw).into_owned()));
/// ```
#[derive(Clone)]
pub struct OpenOptions {
    /// Diagnostic level for this container
    pub verbosity: Verbosity,
    /// Service used to turn raw entry names into text
    pub name_decoder: Arc<dyn NameDecoder>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Quiet,
            name_decoder: Arc::new(Utf16LeNames),
        }
    }
}

impl std::fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenOptions")
            .field("verbosity", &self.verbosity)
            .finish_non_exhaustive()
    }
}

impl OpenOptions {
    /// Create a new `OpenOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the diagnostic level.
    #[inline]
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Replace the entry name decoder.
    #[inline]
    pub fn with_name_decoder(mut self, decoder: impl NameDecoder + 'static) -> Self {
        self.name_decoder = Arc::new(decoder);
        self
    }

    /// Open the compound file at `path` with these options.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<CompoundFile<File>> {
        let file = File::open(path)?;
        self.open_reader(file)
    }

    /// Parse a compound file from any seekable reader with these options.
    pub fn open_reader<R: Read + Seek>(&self, reader: R) -> Result<CompoundFile<R>> {
        CompoundFile::open_with(reader, self)
    }

    #[inline]
    pub(crate) fn summary(&self) -> bool {
        self.verbosity >= Verbosity::Summary
    }

    #[inline]
    pub(crate) fn detailed(&self) -> bool {
        self.verbosity >= Verbosity::Detailed
    }
}
