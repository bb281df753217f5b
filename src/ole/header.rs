//! Compound file header (superblock)
//!
//! The first 512 bytes of the file describe where everything else lives:
//! the sector shifts, the FAT sectors (up to 109 listed inline), the start
//! of the directory stream and the location of the MiniFAT.

use super::config::OpenOptions;
use super::consts::*;
use super::error::{OleError, Result};
use log::{debug, warn};
use std::io::{self, Read, Seek, SeekFrom};
use zerocopy::{FromBytes, LE, U16, U32};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw OLE header structure (512 bytes)
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawHeader {
    /// Magic signature
    signature: [u8; 8],
    /// Unused class id
    clsid: [u8; 16],
    minor_version: U16<LE>,
    dll_version: U16<LE>,
    byte_order: U16<LE>,
    sector_shift: U16<LE>,
    mini_sector_shift: U16<LE>,
    reserved: [u8; 6],
    /// Only meaningful for 4096-byte sectors
    num_dir_sectors: U32<LE>,
    num_fat_sectors: U32<LE>,
    first_dir_sector: U32<LE>,
    transaction_signature: U32<LE>,
    mini_stream_cutoff: U32<LE>,
    first_minifat_sector: U32<LE>,
    num_minifat_sectors: U32<LE>,
    first_difat_sector: U32<LE>,
    num_difat_sectors: U32<LE>,
    /// First 109 FAT sector IDs
    fat_sectors: [U32<LE>; HEADER_FAT_SLOTS],
}

/// Validated header of a compound file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Superblock {
    pub minor_version: u16,
    pub dll_version: u16,
    /// Resolved sector size (always 512)
    pub sector_size: usize,
    /// Resolved mini sector size (always 64)
    pub mini_sector_size: usize,
    /// Number of FAT sectors (at most 109)
    pub num_fat_sectors: u32,
    pub first_dir_sector: u32,
    /// Streams smaller than this live in the mini stream
    pub mini_stream_cutoff: u32,
    pub first_minifat_sector: u32,
    pub num_minifat_sectors: u32,
    /// Read for completeness; DIFAT chains are never followed
    pub first_difat_sector: u32,
    pub num_difat_sectors: u32,
    /// The inline FAT sector IDs actually in use (`num_fat_sectors` of them)
    pub fat_sectors: Vec<u32>,
}

impl Superblock {
    /// Parse and validate a header block.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        let raw = RawHeader::read_from_bytes(&bytes[..])
            .map_err(|_| OleError::InvalidFormat("Failed to parse header".to_string()))?;

        if &raw.signature != MAGIC {
            return Err(OleError::NotOleFile);
        }

        let byte_order = raw.byte_order.get();
        if byte_order != BYTE_ORDER_LE {
            return Err(OleError::InvalidFormat(format!(
                "Invalid byte order marker {byte_order:#06X}"
            )));
        }

        let sector_shift = raw.sector_shift.get();
        let mini_sector_shift = raw.mini_sector_shift.get();
        if sector_shift != SECTOR_SHIFT || mini_sector_shift != MINI_SECTOR_SHIFT {
            return Err(OleError::UnsupportedSectorSize {
                sector_shift,
                mini_sector_shift,
            });
        }

        let num_fat_sectors = raw.num_fat_sectors.get();
        if num_fat_sectors as usize > HEADER_FAT_SLOTS {
            return Err(OleError::TooManyFatSectors(num_fat_sectors));
        }

        let fat_sectors = raw.fat_sectors[..num_fat_sectors as usize]
            .iter()
            .map(|s| s.get())
            .collect();

        Ok(Self {
            minor_version: raw.minor_version.get(),
            dll_version: raw.dll_version.get(),
            sector_size: SECTOR_SIZE,
            mini_sector_size: MINI_SECTOR_SIZE,
            num_fat_sectors,
            first_dir_sector: raw.first_dir_sector.get(),
            mini_stream_cutoff: raw.mini_stream_cutoff.get(),
            first_minifat_sector: raw.first_minifat_sector.get(),
            num_minifat_sectors: raw.num_minifat_sectors.get(),
            first_difat_sector: raw.first_difat_sector.get(),
            num_difat_sectors: raw.num_difat_sectors.get(),
            fat_sectors,
        })
    }

    /// Read the header from the start of `reader` and validate it.
    ///
    /// A reader shorter than one header block is reported as
    /// [`OleError::NotOleFile`]; other read failures surface as IO errors.
    pub fn read<R: Read + Seek>(reader: &mut R, options: &OpenOptions) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;

        let mut block = [0u8; HEADER_SIZE];
        match reader.read_exact(&mut block) {
            Ok(()) => {},
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(OleError::NotOleFile);
            },
            Err(e) => return Err(e.into()),
        }

        let header = Self::parse(&block)?;

        if header.num_difat_sectors != 0 {
            warn!(
                "ignoring {} DIFAT sector(s) starting at {}",
                header.num_difat_sectors, header.first_difat_sector
            );
        }

        if options.summary() {
            debug!(
                "OLE header: version {}.{}, sector {}, mini sector {}",
                header.dll_version,
                header.minor_version,
                header.sector_size,
                header.mini_sector_size
            );
            debug!(
                "FAT sectors: {}, directory start: {}, mini cutoff: {}",
                header.num_fat_sectors, header.first_dir_sector, header.mini_stream_cutoff
            );
            debug!(
                "MiniFAT start: {:#X}, MiniFAT sectors: {}, DIFAT start: {:#X}, DIFAT sectors: {}",
                header.first_minifat_sector,
                header.num_minifat_sectors,
                header.first_difat_sector,
                header.num_difat_sectors
            );
        }

        Ok(header)
    }

    /// Whether the header declares a MiniFAT
    #[inline]
    pub fn has_minifat(&self) -> bool {
        self.first_minifat_sector != ENDOFCHAIN
    }
}

/// Check if a file/data is an OLE file by checking magic bytes
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE && data[0..8] == MAGIC[..]
}
