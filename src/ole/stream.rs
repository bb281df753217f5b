//! Sequential and random access to a single stream
//!
//! A stream is a chain of sectors (or mini sectors) scattered through the
//! container. [`OleStream`] keeps one unit of the chain buffered and refills
//! it whenever the cursor runs off the end, so callers see one contiguous
//! byte sequence.

use super::consts::*;
use super::error::{OleError, Result};
use super::file::CompoundFile;
use super::sector_table::SectorTable;
use std::io::{self, Read, Seek, SeekFrom};

/// Which allocation table a stream's chain lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Allocation {
    /// 512-byte sectors read from the file through the FAT
    Main,
    /// 64-byte mini sectors read from the mini stream through the MiniFAT
    Mini,
}

/// Cursor over one stream of a [`CompoundFile`].
///
/// Each handle owns its own buffer and position; several handles may be open
/// on the same container at once.
///
/// # Examples
///
/// ```no_run
/// use std::io::Read;
/// use olecf::ole::CompoundFile;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let ole = CompoundFile::open_path("book.xls")?;
/// let mut stream = ole.open_stream("Workbook")?;
///
/// let mut header = [0u8; 4];
/// stream.read_exact(&mut header)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OleStream<'a, R> {
    file: &'a CompoundFile<R>,
    allocation: Allocation,
    /// First unit of the chain
    start: u32,
    /// Declared size; `None` for streams bounded only by their chain
    size: Option<u64>,
    /// Chain position of the next unit to load
    next: u32,
    /// Bytes of the current unit
    buf: Vec<u8>,
    /// Read cursor within `buf`; `buf.len()` when exhausted
    pos: usize,
    /// Logical offset within the stream
    position: u64,
    /// Index within the chain of the unit held in `buf`
    unit_index: Option<u64>,
    eof: bool,
}

impl<'a, R: Read + Seek> OleStream<'a, R> {
    /// Stream with a declared size, placed by size relative to the cutoff.
    pub(crate) fn new(file: &'a CompoundFile<R>, start: u32, size: u64) -> Self {
        let allocation = if size < file.mini_stream_cutoff() as u64 {
            Allocation::Mini
        } else {
            Allocation::Main
        };
        Self::with_allocation(file, allocation, start, Some(size))
    }

    /// Stream whose end is wherever its FAT chain ends.
    pub(crate) fn unbounded(file: &'a CompoundFile<R>, start: u32) -> Self {
        Self::with_allocation(file, Allocation::Main, start, None)
    }

    pub(crate) fn with_allocation(
        file: &'a CompoundFile<R>,
        allocation: Allocation,
        start: u32,
        size: Option<u64>,
    ) -> Self {
        let unit = match allocation {
            Allocation::Main => file.sector_size(),
            Allocation::Mini => file.mini_sector_size(),
        };
        Self {
            file,
            allocation,
            start,
            size,
            next: start,
            buf: vec![0u8; unit],
            pos: unit,
            position: 0,
            unit_index: None,
            eof: false,
        }
    }

    fn table(&self) -> &'a SectorTable {
        match self.allocation {
            Allocation::Main => self.file.fat(),
            Allocation::Mini => self.file.minifat(),
        }
    }

    /// Load the unit at the current chain position and advance the chain.
    ///
    /// Does nothing once the chain has reached `ENDOFCHAIN`.
    fn refill(&mut self) -> Result<()> {
        if self.next == ENDOFCHAIN {
            return Ok(());
        }

        let index = self.unit_index.map_or(0, |i| i + 1);
        let next = Self::load_unit(self.file, self.allocation, self.next, index, &mut self.buf)?;

        self.next = next;
        self.pos = 0;
        self.unit_index = Some(index);
        Ok(())
    }

    /// Copy unit `sector` (chain position `index`) into `buf` and return the
    /// link that follows it.
    fn load_unit(
        file: &CompoundFile<R>,
        allocation: Allocation,
        sector: u32,
        index: u64,
        buf: &mut [u8],
    ) -> Result<u32> {
        let table = match allocation {
            Allocation::Main => file.fat(),
            Allocation::Mini => file.minifat(),
        };
        let next = table.next(sector)?;
        // A chain longer than its table must revisit a sector
        if index >= table.len() as u64 {
            return Err(OleError::CyclicChain(sector));
        }

        match allocation {
            Allocation::Main => file.read_sector(sector, buf)?,
            Allocation::Mini => buf.copy_from_slice(file.ministream().mini_sector(sector)?),
        }
        Ok(next)
    }

    /// Read up to `out.len()` bytes.
    ///
    /// Returns `Ok(0)` at end of stream (and for an empty `out`). A chain that
    /// ends before the declared size is reached yields
    /// [`OleError::CorruptChain`] instead. Bytes copied before a failure are
    /// returned first; the error is reported by the following call.
    pub fn read_bytes(&mut self, out: &mut [u8]) -> Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        let mut want = out.len();
        match self.size {
            Some(size) => {
                let remaining = size.saturating_sub(self.position);
                if remaining == 0 {
                    self.eof = true;
                    return Ok(0);
                }
                want = want.min(usize::try_from(remaining).unwrap_or(usize::MAX));
            },
            None if self.eof => return Ok(0),
            None => {},
        }

        let unit = self.buf.len();
        let mut copied = 0;
        while copied < want {
            if self.pos >= unit {
                if self.next == ENDOFCHAIN {
                    // Hand back what was copied; the error surfaces on the next call
                    if copied > 0 {
                        break;
                    }
                    if let Some(declared) = self.size {
                        return Err(OleError::CorruptChain {
                            position: self.position,
                            declared,
                        });
                    }
                    self.eof = true;
                    break;
                }
                if let Err(err) = self.refill() {
                    if copied > 0 {
                        break;
                    }
                    return Err(err);
                }
            }

            let n = (unit - self.pos).min(want - copied);
            out[copied..copied + n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
            self.pos += n;
            self.position += n as u64;
            copied += n;
        }

        // Unbounded streams end as soon as the last unit is drained
        if self.size.is_none() && self.next == ENDOFCHAIN && self.pos >= unit {
            self.eof = true;
        }

        Ok(copied)
    }

    /// Move to absolute `offset`, walking the chain from its first unit.
    ///
    /// Seeking to or past the declared end is allowed; subsequent reads
    /// return end of stream. Landing short of the declared end on a chain
    /// that has already finished is [`OleError::CorruptChain`].
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        let unit = self.buf.len() as u64;
        let quotient = offset / unit;
        let remainder = (offset % unit) as usize;

        let table = self.table();
        let mut sector = self.start;
        let mut steps = 0u64;
        while steps < quotient && sector != ENDOFCHAIN {
            let next = table.next(sector)?;
            if steps >= table.len() as u64 {
                return Err(OleError::CyclicChain(sector));
            }
            sector = next;
            steps += 1;
        }

        if sector == ENDOFCHAIN {
            if let Some(declared) = self.size
                && offset < declared
            {
                return Err(OleError::CorruptChain {
                    position: offset,
                    declared,
                });
            }
            self.next = ENDOFCHAIN;
            self.pos = self.buf.len();
            self.position = offset;
            self.unit_index = Some(quotient);
            self.eof = false;
            return Ok(());
        }

        // State is committed only once the landing unit has loaded
        let mut unit_buf = vec![0u8; self.buf.len()];
        let next = Self::load_unit(self.file, self.allocation, sector, quotient, &mut unit_buf)?;

        self.buf = unit_buf;
        self.next = next;
        self.unit_index = Some(quotient);
        self.pos = remainder;
        self.position = offset;
        self.eof = false;
        Ok(())
    }

    /// Declared size, or `None` for a chain-bounded stream
    #[inline]
    pub fn len(&self) -> Option<u64> {
        self.size
    }

    /// Whether the declared size is zero
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == Some(0)
    }

    /// Current logical offset
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether a read has hit the end of the stream
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    #[inline]
    pub fn allocation(&self) -> Allocation {
        self.allocation
    }

    /// Whether the stream is read through the MiniFAT
    #[inline]
    pub fn is_mini(&self) -> bool {
        self.allocation == Allocation::Mini
    }

    /// Size of one chain unit (sector or mini sector)
    #[inline]
    pub fn unit_size(&self) -> usize {
        self.buf.len()
    }

    /// Index within the chain of the buffered unit, once one has been loaded
    #[inline]
    pub fn unit_index(&self) -> Option<u64> {
        self.unit_index
    }

    #[inline]
    pub fn start_sector(&self) -> u32 {
        self.start
    }
}

impl<R: Read + Seek> Read for OleStream<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_bytes(buf).map_err(Into::into)
    }
}

impl<R: Read + Seek> Seek for OleStream<'_, R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => {
                let size = self.size.ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::Unsupported,
                        "cannot seek from the end of a chain-bounded stream",
                    )
                })?;
                size.checked_add_signed(delta)
            },
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "invalid seek to a negative position")
        })?;
        self.seek_to(target)?;
        Ok(self.position)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}
