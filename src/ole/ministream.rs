//! Mini stream backing store
//!
//! Streams below the cutoff size are stored in 64-byte mini sectors packed
//! into a single regular stream owned by the root entry. The whole container
//! is loaded once; mini sector numbers are offsets into it, never into the
//! host file.

use super::consts::*;
use super::error::{OleError, Result};
use super::sector_table::{SectorTable, read_sector};
use std::io::{Read, Seek};

/// Contiguous bytes of the root entry's stream, addressed in mini sectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MiniStream {
    data: Vec<u8>,
}

impl MiniStream {
    /// Empty store (no root entry or a root entry of size zero)
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the root entry's stream through the FAT.
    ///
    /// Reads `ceil(size / sector_size)` whole sectors starting at `start`;
    /// a chain that ends sooner is reported as [`OleError::TruncatedChain`].
    pub fn load<R: Read + Seek>(
        reader: &mut R,
        fat: &SectorTable,
        start: u32,
        size: u64,
    ) -> Result<Self> {
        let sectors = size.div_ceil(SECTOR_SIZE as u64);
        let expected = u32::try_from(sectors).map_err(|_| {
            OleError::InvalidFormat(format!("Mini stream size {size} is out of range"))
        })?;

        // The chain can never be longer than the FAT, so do not trust `size`
        // for the allocation.
        let capacity = (expected as usize).min(fat.len()) * SECTOR_SIZE;
        let mut data = Vec::with_capacity(capacity);
        let mut buffer = [0u8; SECTOR_SIZE];
        let mut chain = fat.chain(start);
        let mut read = 0u32;

        while read < expected {
            let sector = match chain.next() {
                Some(sector) => sector?,
                None => {
                    return Err(OleError::TruncatedChain {
                        what: "Mini stream",
                        expected,
                        read,
                    });
                },
            };
            read_sector(reader, sector, &mut buffer)?;
            data.extend_from_slice(&buffer);
            read += 1;
        }

        Ok(Self { data })
    }

    /// Size of the store in bytes (whole sectors)
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes of one mini sector
    pub fn mini_sector(&self, index: u32) -> Result<&[u8]> {
        if is_sentinel(index) {
            return Err(OleError::InvalidSector(index));
        }
        let begin = (index as usize)
            .checked_mul(MINI_SECTOR_SIZE)
            .ok_or(OleError::InvalidSector(index))?;
        let end = begin
            .checked_add(MINI_SECTOR_SIZE)
            .ok_or(OleError::InvalidSector(index))?;
        self.data
            .get(begin..end)
            .ok_or(OleError::InvalidSector(index))
    }
}

impl From<Vec<u8>> for MiniStream {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::test_image::{Image, pattern};
    use std::io::Cursor;

    #[test]
    fn test_mini_sector_bounds() {
        let store = MiniStream::from(pattern(192, 1));
        assert_eq!(store.len(), 192);
        assert_eq!(store.mini_sector(0).unwrap(), &pattern(192, 1)[0..64]);
        assert_eq!(store.mini_sector(2).unwrap(), &pattern(192, 1)[128..192]);
        assert!(matches!(
            store.mini_sector(3),
            Err(OleError::InvalidSector(3))
        ));
        assert!(matches!(
            store.mini_sector(ENDOFCHAIN),
            Err(OleError::InvalidSector(ENDOFCHAIN))
        ));
        assert!(MiniStream::new().mini_sector(0).is_err());
    }

    #[test]
    fn test_mini_sector_far_out_of_range() {
        let store = MiniStream::from(pattern(128, 2));
        for index in [1 << 26, (1 << 26) - 1, MAXREGSECT] {
            assert!(matches!(
                store.mini_sector(index),
                Err(OleError::InvalidSector(i)) if i == index
            ));
        }
    }

    #[test]
    fn test_load_rounds_up_to_whole_sectors() {
        let mut image = Image::new();
        let start = image.add_sectors(&pattern(700, 3));
        let data = image.build();

        let mut links = vec![FREESECT; 128];
        links[start as usize] = start + 1;
        links[start as usize + 1] = ENDOFCHAIN;
        let fat = SectorTable::from_links(links);

        let mut cursor = Cursor::new(data);
        let store = MiniStream::load(&mut cursor, &fat, start, 700).unwrap();
        assert_eq!(store.len(), 1024);
        assert_eq!(store.mini_sector(0).unwrap(), &pattern(700, 3)[..64]);
    }

    #[test]
    fn test_load_truncated() {
        let mut image = Image::new();
        let start = image.add_sectors(&pattern(512, 3));
        let data = image.build();

        let mut links = vec![FREESECT; 128];
        links[start as usize] = ENDOFCHAIN;
        let fat = SectorTable::from_links(links);

        let mut cursor = Cursor::new(data);
        assert!(matches!(
            MiniStream::load(&mut cursor, &fat, start, 2048),
            Err(OleError::TruncatedChain {
                what: "Mini stream",
                expected: 4,
                read: 1
            })
        ));
    }

    #[test]
    fn test_load_empty() {
        let fat = SectorTable::new();
        let mut cursor = Cursor::new(Vec::new());
        let store = MiniStream::load(&mut cursor, &fat, ENDOFCHAIN, 0).unwrap();
        assert!(store.is_empty());
    }
}
