use super::config::OpenOptions;
use super::directory::{DirectoryEntry, EntryKind, FileTableEntry, scan_directory};
use super::error::{OleError, Result};
use super::header::Superblock;
use super::ministream::MiniStream;
use super::sector_table::{SectorTable, load_fat, load_minifat, read_sector};
use super::stream::{Allocation, OleStream};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// An open OLE2 compound file
///
/// Holds the underlying reader together with both allocation tables, the
/// mini stream and the file table discovered by the directory scan. All of
/// it is loaded by [`CompoundFile::open`] and stays read-only afterwards;
/// streams are read lazily through [`OleStream`] handles.
///
/// The reader sits behind a mutex so that every sector read is an atomic
/// seek-then-read pair, which lets any number of stream handles share it.
#[derive(Debug)]
pub struct CompoundFile<R> {
    /// File handle or reader
    reader: Mutex<R>,
    header: Superblock,
    /// File Allocation Table - maps sector to next sector in chain
    fat: SectorTable,
    /// Mini FAT - for streams smaller than cutoff size
    minifat: SectorTable,
    /// Root entry stream backing every mini sector
    ministream: MiniStream,
    /// Every directory record in on-disk order
    entries: Vec<DirectoryEntry>,
    /// Streams and the root entry, in directory order
    file_table: Vec<FileTableEntry>,
}

impl CompoundFile<File> {
    /// Open the compound file at `path` with default options
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        OpenOptions::default().open(path)
    }
}

impl<R: Read + Seek> CompoundFile<R> {
    /// Open and parse an OLE file from a reader
    ///
    /// # Arguments
    /// * `reader` - A reader that implements Read + Seek
    ///
    /// # Returns
    /// * `Result<CompoundFile<R>, OleError>` - The parsed OLE file or an error
    pub fn open(reader: R) -> Result<Self> {
        Self::open_with(reader, &OpenOptions::default())
    }

    /// Open and parse an OLE file with explicit options
    pub fn open_with(mut reader: R, options: &OpenOptions) -> Result<Self> {
        let header = Superblock::read(&mut reader, options)?;
        let fat = load_fat(&mut reader, &header, options)?;
        let minifat = load_minifat(&mut reader, &header, &fat, options)?;

        let mut file = CompoundFile {
            reader: Mutex::new(reader),
            header,
            fat,
            minifat,
            ministream: MiniStream::new(),
            entries: Vec::new(),
            file_table: Vec::new(),
        };

        let directory = scan_directory(&file, options)?;
        file.entries = directory.entries;
        file.file_table = directory.file_table;
        file.ministream = directory.ministream;

        Ok(file)
    }

    /// Open a stream by name.
    ///
    /// Names are matched exactly; when several entries share a name the first
    /// one in directory order wins. The root entry can be opened too, which
    /// yields the raw mini stream container.
    pub fn open_stream(&self, name: &str) -> Result<OleStream<'_, R>> {
        let entry = self
            .find(name)
            .ok_or_else(|| OleError::StreamNotFound(name.to_string()))?;

        Ok(match entry.kind {
            // The root's stream always lives in regular sectors
            EntryKind::Root => OleStream::with_allocation(
                self,
                Allocation::Main,
                entry.start_sector,
                Some(entry.size),
            ),
            _ => OleStream::new(self, entry.start_sector, entry.size),
        })
    }

    /// Open a stream from an explicit location.
    ///
    /// With `Some(size)` the table is chosen by comparing `size` with the
    /// mini stream cutoff. With `None` the stream is read through the FAT
    /// until its chain ends.
    pub fn open_stream_at(&self, start_sector: u32, size: Option<u64>) -> OleStream<'_, R> {
        match size {
            Some(size) => OleStream::new(self, start_sector, size),
            None => OleStream::unbounded(self, start_sector),
        }
    }

    /// Read a whole stream into memory
    pub fn read_stream(&self, name: &str) -> Result<Vec<u8>> {
        let mut stream = self.open_stream(name)?;
        // The declared size is untrusted; never reserve more than the file can hold
        let limit = (self.fat.len() * self.sector_size()) as u64;
        let mut data = Vec::with_capacity(stream.len().unwrap_or(0).min(limit) as usize);
        let mut chunk = vec![0u8; self.sector_size()];
        loop {
            let n = stream.read_bytes(&mut chunk)?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);
        }
        Ok(data)
    }

    pub(crate) fn read_sector(&self, sector: u32, buf: &mut [u8]) -> Result<()> {
        let mut reader = self.reader.lock();
        read_sector(&mut *reader, sector, buf)
    }
}

impl<R> CompoundFile<R> {
    fn find(&self, name: &str) -> Option<&FileTableEntry> {
        self.file_table.iter().find(|entry| entry.name == name)
    }

    /// Check if a stream (or the root entry) with this name exists
    pub fn exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Streams and the root entry, in directory order
    pub fn file_table(&self) -> &[FileTableEntry] {
        &self.file_table
    }

    /// Every directory record, including storages and unused slots
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// The root directory entry, if the directory has one
    pub fn root_entry(&self) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.kind == EntryKind::Root)
    }

    /// Names of all streams (root entry excluded)
    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.file_table
            .iter()
            .filter(|e| e.kind == EntryKind::Stream)
            .map(|e| e.name.as_str())
    }

    pub fn superblock(&self) -> &Superblock {
        &self.header
    }

    #[inline]
    pub fn sector_size(&self) -> usize {
        self.header.sector_size
    }

    #[inline]
    pub fn mini_sector_size(&self) -> usize {
        self.header.mini_sector_size
    }

    #[inline]
    pub fn mini_stream_cutoff(&self) -> u32 {
        self.header.mini_stream_cutoff
    }

    pub fn fat(&self) -> &SectorTable {
        &self.fat
    }

    pub fn minifat(&self) -> &SectorTable {
        &self.minifat
    }

    pub fn ministream(&self) -> &MiniStream {
        &self.ministream
    }

    pub(crate) fn with_reader<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        let mut reader = self.reader.lock();
        f(&mut *reader)
    }

    /// Release the container and hand back the reader
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}
