//! Sector allocation tables (FAT and MiniFAT)
//!
//! Both tables map a sector number to the next sector of the same chain, or
//! to one of the reserved sentinels. The FAT is assembled from the sectors
//! listed inline in the header; the MiniFAT is itself a regular stream whose
//! chain is followed through the FAT.

use super::config::OpenOptions;
use super::consts::*;
use super::error::{OleError, Result};
use super::header::Superblock;
use fixedbitset::FixedBitSet;
use log::debug;
use std::io::{Read, Seek, SeekFrom};
use zerocopy::{FromBytes, LE, U32};

/// File offset of a regular sector; sector 0 follows the header block
#[inline]
pub fn sector_offset(sector: u32) -> u64 {
    HEADER_SIZE as u64 + sector as u64 * SECTOR_SIZE as u64
}

/// Read one full sector into `buf` (which must be one sector long)
pub(crate) fn read_sector<R: Read + Seek>(reader: &mut R, sector: u32, buf: &mut [u8]) -> Result<()> {
    if is_sentinel(sector) {
        return Err(OleError::InvalidSector(sector));
    }
    reader.seek(SeekFrom::Start(sector_offset(sector)))?;
    reader.read_exact(buf)?;
    Ok(())
}

/// Bounds-checked table of sector links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectorTable {
    links: Vec<u32>,
}

impl SectorTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap already decoded links
    pub fn from_links(links: Vec<u32>) -> Self {
        Self { links }
    }

    /// Number of sectors the table describes
    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Raw link stored for `sector`, if the table covers it
    #[inline]
    pub fn get(&self, sector: u32) -> Option<u32> {
        self.links.get(sector as usize).copied()
    }

    /// Link following `sector`.
    ///
    /// `sector` must be a real sector covered by the table; the returned value
    /// may be `ENDOFCHAIN` or any other sentinel stored on disk.
    #[inline]
    pub fn next(&self, sector: u32) -> Result<u32> {
        self.get(sector).ok_or(OleError::InvalidSector(sector))
    }

    /// Append the links stored in one table sector
    fn extend_from_sector(&mut self, bytes: &[u8]) {
        self.links.reserve(bytes.len() / 4);
        for chunk in bytes.chunks_exact(4) {
            let link = U32::<LE>::read_from_bytes(chunk)
                .map(|v| v.get())
                .unwrap_or(FREESECT);
            self.links.push(link);
        }
    }

    /// Iterate over the sectors of the chain starting at `start`.
    ///
    /// Iteration stops at `ENDOFCHAIN`. Any other sentinel, an out-of-range
    /// sector or a revisited sector yields a single error and ends the chain.
    pub fn chain(&self, start: u32) -> Chain<'_> {
        Chain {
            table: self,
            current: start,
            visited: FixedBitSet::with_capacity(self.links.len()),
            done: false,
        }
    }

    /// Number of sectors in the chain starting at `start`
    pub fn chain_len(&self, start: u32) -> Result<usize> {
        let mut count = 0;
        for sector in self.chain(start) {
            sector?;
            count += 1;
        }
        Ok(count)
    }
}

/// Iterator over the sectors of one chain
#[derive(Debug)]
pub struct Chain<'a> {
    table: &'a SectorTable,
    current: u32,
    visited: FixedBitSet,
    done: bool,
}

impl Iterator for Chain<'_> {
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.current == ENDOFCHAIN {
            return None;
        }

        let sector = self.current;
        let next = match self.table.get(sector) {
            Some(link) if !is_sentinel(sector) => link,
            _ => {
                self.done = true;
                return Some(Err(OleError::InvalidSector(sector)));
            },
        };

        if self.visited.put(sector as usize) {
            self.done = true;
            return Some(Err(OleError::CyclicChain(sector)));
        }

        self.current = next;
        Some(Ok(sector))
    }
}

/// Load the File Allocation Table from the sectors listed in the header.
pub fn load_fat<R: Read + Seek>(
    reader: &mut R,
    header: &Superblock,
    options: &OpenOptions,
) -> Result<SectorTable> {
    let mut fat = SectorTable::new();
    let mut buffer = vec![0u8; header.sector_size];

    for &sector in &header.fat_sectors {
        read_sector(reader, sector, &mut buffer)?;
        fat.extend_from_sector(&buffer);
    }

    if options.summary() {
        debug!(
            "FAT loaded: {} sector(s), {} links",
            header.fat_sectors.len(),
            fat.len()
        );
    }

    Ok(fat)
}

/// Load the MiniFAT by following its chain through the FAT.
///
/// Exactly `num_minifat_sectors` sectors are read; a chain that ends sooner
/// is reported as [`OleError::TruncatedChain`].
pub fn load_minifat<R: Read + Seek>(
    reader: &mut R,
    header: &Superblock,
    fat: &SectorTable,
    options: &OpenOptions,
) -> Result<SectorTable> {
    let mut minifat = SectorTable::new();
    if !header.has_minifat() {
        return Ok(minifat);
    }

    let expected = header.num_minifat_sectors;
    let mut buffer = vec![0u8; header.sector_size];
    let mut chain = fat.chain(header.first_minifat_sector);
    let mut read = 0u32;

    while read < expected {
        let sector = match chain.next() {
            Some(sector) => sector?,
            None => {
                return Err(OleError::TruncatedChain {
                    what: "MiniFAT",
                    expected,
                    read,
                });
            },
        };
        read_sector(reader, sector, &mut buffer)?;
        minifat.extend_from_sector(&buffer);
        read += 1;
    }

    if options.summary() {
        debug!("MiniFAT loaded: {} sector(s), {} links", read, minifat.len());
    }

    Ok(minifat)
}
