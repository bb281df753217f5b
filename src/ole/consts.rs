/// Magic bytes that should be at the beginning of every OLE file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Byte-order marker stored in the header (little-endian files only)
pub const BYTE_ORDER_LE: u16 = 0xFFFE;

/// Size of the header block; sector 0 starts right after it
pub const HEADER_SIZE: usize = 512;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Sector shift accepted by this reader (2^9 = 512)
pub const SECTOR_SHIFT: u16 = 9;

/// Mini sector shift accepted by this reader (2^6 = 64)
pub const MINI_SECTOR_SHIFT: u16 = 6;

/// Sector size in bytes
pub const SECTOR_SIZE: usize = 1 << SECTOR_SHIFT;

/// Mini sector size in bytes
pub const MINI_SECTOR_SIZE: usize = 1 << MINI_SECTOR_SHIFT;

/// Number of FAT sector IDs stored inline in the header
pub const HEADER_FAT_SLOTS: usize = 109;

/// Default mini stream cutoff size
pub const DEFAULT_MINI_STREAM_CUTOFF: u32 = 4096;

// Sector IDs (from AAF specifications)
/// Maximum regular sector ID
pub const MAXREGSECT: u32 = 0xFFFFFFFA; // -6
/// Denotes a DIFAT (table-of-tables) sector in a FAT
pub const MSATSECT: u32 = 0xFFFFFFFC; // -4
/// Denotes a FAT sector in a FAT
pub const FATSECT: u32 = 0xFFFFFFFD; // -3
/// End of a virtual stream chain
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE; // -2
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFFFFFF; // -1

/// Unallocated directory entry
pub const NOSTREAM: u32 = 0xFFFFFFFF; // -1

// Object types in storage (from AAF specifications)
/// Empty directory entry
pub const STGTY_EMPTY: u8 = 0;
/// Element is a storage object
pub const STGTY_STORAGE: u8 = 1;
/// Element is a stream object
pub const STGTY_STREAM: u8 = 2;
/// Element is an ILockBytes object
pub const STGTY_LOCKBYTES: u8 = 3;
/// Element is an IPropertyStorage object
pub const STGTY_PROPERTY: u8 = 4;
/// Element is a root storage
pub const STGTY_ROOT: u8 = 5;

/// Whether `sector` is one of the reserved link values rather than a real sector
#[inline]
pub const fn is_sentinel(sector: u32) -> bool {
    sector > MAXREGSECT
}
