//! Directory scanning
//!
//! The directory stream is an array of 128-byte records. On disk the records
//! form a red-black tree per storage, but every name is reachable by simply
//! visiting the records in order, so the scanner walks the array linearly and
//! never follows the sibling/child links (they are decoded and exposed only).
//!
//! Scanning stops when the directory stream's chain is exhausted, not on any
//! particular record value, so trailing unused records are harmless.

use super::config::OpenOptions;
use super::consts::*;
use super::error::{OleError, Result};
use super::file::CompoundFile;
use super::ministream::MiniStream;
use super::names::NameDecoder;
use super::stream::OleStream;
use log::{debug, warn};
use std::io::{Read, Seek};
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw OLE directory entry structure (128 bytes)
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE (64 bytes, null-padded)
    name: [u8; 64],
    /// Length of name in bytes (including null terminator)
    name_len: U16<LE>,
    /// Entry type (1 = storage, 2 = stream, 5 = root)
    entry_type: u8,
    /// Node color (0 = red, 1 = black)
    node_color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    /// User flags
    state_bits: U32<LE>,
    /// Creation time (FILETIME)
    creation_time: U64<LE>,
    /// Modified time (FILETIME)
    modified_time: U64<LE>,
    start_sector: U32<LE>,
    stream_size: U64<LE>,
}

/// Kind of object a directory entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EntryKind {
    /// Unused slot
    Empty,
    Storage,
    Stream,
    LockBytes,
    Property,
    /// Root storage; owns the mini stream
    Root,
    /// Any other type byte
    Unknown(u8),
}

impl From<u8> for EntryKind {
    fn from(value: u8) -> Self {
        match value {
            STGTY_EMPTY => EntryKind::Empty,
            STGTY_STORAGE => EntryKind::Storage,
            STGTY_STREAM => EntryKind::Stream,
            STGTY_LOCKBYTES => EntryKind::LockBytes,
            STGTY_PROPERTY => EntryKind::Property,
            STGTY_ROOT => EntryKind::Root,
            other => EntryKind::Unknown(other),
        }
    }
}

/// One decoded directory record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Index of the record in the directory stream
    pub sid: u32,
    /// Decoded name; empty when the decoder rejected it
    pub name: String,
    pub kind: EntryKind,
    /// Red-black tree links, decoded but never followed
    pub sid_left: u32,
    pub sid_right: u32,
    pub sid_child: u32,
    /// CLSID of this entry, empty when all zero
    pub clsid: String,
    pub state_bits: u32,
    pub creation_time: u64,
    pub modified_time: u64,
    pub start_sector: u32,
    /// Declared size in bytes
    pub size: u64,
}

impl DirectoryEntry {
    /// Parse a single directory entry from 128 bytes
    pub fn parse(data: &[u8], sid: u32, decoder: &dyn NameDecoder) -> Result<Self> {
        let raw = RawDirectoryEntry::read_from_bytes(data)
            .map_err(|_| OleError::InvalidFormat("Failed to parse directory entry".to_string()))?;

        let name_len = (raw.name_len.get() as usize).min(raw.name.len());
        let name = decoder.decode(&raw.name[..name_len]).unwrap_or_default();

        Ok(Self {
            sid,
            name,
            kind: EntryKind::from(raw.entry_type),
            sid_left: raw.sid_left.get(),
            sid_right: raw.sid_right.get(),
            sid_child: raw.sid_child.get(),
            clsid: format_clsid(&raw.clsid),
            state_bits: raw.state_bits.get(),
            creation_time: raw.creation_time.get(),
            modified_time: raw.modified_time.get(),
            start_sector: raw.start_sector.get(),
            // 512-byte sector files only define the low 32 bits
            size: raw.stream_size.get() & 0xFFFF_FFFF,
        })
    }

    /// Whether this entry goes into the file table
    #[inline]
    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::Stream | EntryKind::Root)
    }
}

/// Name and location of one stream (or the root entry)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FileTableEntry {
    pub name: String,
    pub kind: EntryKind,
    pub start_sector: u32,
    pub size: u64,
}

impl From<&DirectoryEntry> for FileTableEntry {
    fn from(entry: &DirectoryEntry) -> Self {
        Self {
            name: entry.name.clone(),
            kind: entry.kind,
            start_sector: entry.start_sector,
            size: entry.size,
        }
    }
}

/// Everything the directory scan produces
#[derive(Debug, Default)]
pub(crate) struct Directory {
    pub entries: Vec<DirectoryEntry>,
    pub file_table: Vec<FileTableEntry>,
    pub ministream: MiniStream,
}

/// Walk the directory stream, collecting entries, the file table and the
/// root entry's mini stream.
pub(crate) fn scan_directory<R: Read + Seek>(
    file: &CompoundFile<R>,
    options: &OpenOptions,
) -> Result<Directory> {
    let mut directory = Directory::default();
    let mut stream = OleStream::unbounded(file, file.superblock().first_dir_sector);
    let mut record = [0u8; DIRENTRY_SIZE];
    let mut root_seen = false;
    let mut sid = 0u32;

    loop {
        let n = stream.read_bytes(&mut record)?;
        if n == 0 {
            break;
        }
        if n != DIRENTRY_SIZE {
            return Err(OleError::InvalidFormat(format!(
                "Truncated directory entry {sid} ({n} bytes)"
            )));
        }

        let entry = DirectoryEntry::parse(&record, sid, options.name_decoder.as_ref())?;
        sid += 1;

        if options.detailed() && entry.kind != EntryKind::Empty {
            debug!(
                "entry {}: {:?} {:?} start={} size={} left={:#X} right={:#X} child={:#X} clsid={} flags={:#X}",
                entry.sid,
                entry.name,
                entry.kind,
                entry.start_sector,
                entry.size,
                entry.sid_left,
                entry.sid_right,
                entry.sid_child,
                entry.clsid,
                entry.state_bits
            );
        }

        if entry.is_file() {
            directory.file_table.push(FileTableEntry::from(&entry));
        }

        if entry.kind == EntryKind::Root {
            if root_seen {
                warn!("ignoring additional root entry {}", entry.sid);
            } else {
                root_seen = true;
                directory.ministream = load_root_stream(file, &entry)?;
                if options.summary() {
                    debug!(
                        "mini stream: {} bytes from sector {}",
                        directory.ministream.len(),
                        entry.start_sector
                    );
                }
            }
        }

        directory.entries.push(entry);
        if stream.is_eof() {
            break;
        }
    }

    if !root_seen {
        warn!("directory has no root entry");
    }
    if options.summary() {
        debug!(
            "directory: {} entries, {} in file table",
            directory.entries.len(),
            directory.file_table.len()
        );
    }

    Ok(directory)
}

fn load_root_stream<R: Read + Seek>(
    file: &CompoundFile<R>,
    root: &DirectoryEntry,
) -> Result<MiniStream> {
    if root.start_sector == ENDOFCHAIN {
        if root.size != 0 {
            warn!(
                "root entry declares {} bytes but has no sectors",
                root.size
            );
        }
        return Ok(MiniStream::new());
    }
    file.with_reader(|reader| MiniStream::load(reader, file.fat(), root.start_sector, root.size))
}

/// Format CLSID as a human-readable string
fn format_clsid(bytes: &[u8; 16]) -> String {
    if bytes.iter().all(|&b| b == 0) {
        return String::new();
    }

    let data1 = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let data2 = u16::from_le_bytes([bytes[4], bytes[5]]);
    let data3 = u16::from_le_bytes([bytes[6], bytes[7]]);
    format!(
        "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
        data1,
        data2,
        data3,
        bytes[8],
        bytes[9],
        bytes[10],
        bytes[11],
        bytes[12],
        bytes[13],
        bytes[14],
        bytes[15],
    )
}
