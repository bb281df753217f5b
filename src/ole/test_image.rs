//! In-memory compound file images for tests
//!
//! Lays out data sectors at caller-chosen positions, then appends the mini
//! stream, MiniFAT, directory and FAT sectors and finally prepends the header.

use super::consts::*;

/// Header fields a test may want to control
#[derive(Debug, Clone)]
pub struct HeaderFields {
    pub fat_sectors: Vec<u32>,
    pub first_dir_sector: u32,
    pub mini_stream_cutoff: u32,
    pub first_minifat_sector: u32,
    pub num_minifat_sectors: u32,
}

impl Default for HeaderFields {
    fn default() -> Self {
        Self {
            fat_sectors: Vec::new(),
            first_dir_sector: 0,
            mini_stream_cutoff: DEFAULT_MINI_STREAM_CUTOFF,
            first_minifat_sector: ENDOFCHAIN,
            num_minifat_sectors: 0,
        }
    }
}

impl HeaderFields {
    pub fn build(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[0..8].copy_from_slice(MAGIC);
        header[24..26].copy_from_slice(&0x003Eu16.to_le_bytes());
        header[26..28].copy_from_slice(&3u16.to_le_bytes());
        header[28..30].copy_from_slice(&BYTE_ORDER_LE.to_le_bytes());
        header[30..32].copy_from_slice(&SECTOR_SHIFT.to_le_bytes());
        header[32..34].copy_from_slice(&MINI_SECTOR_SHIFT.to_le_bytes());
        header[44..48].copy_from_slice(&(self.fat_sectors.len() as u32).to_le_bytes());
        header[48..52].copy_from_slice(&self.first_dir_sector.to_le_bytes());
        header[56..60].copy_from_slice(&self.mini_stream_cutoff.to_le_bytes());
        header[60..64].copy_from_slice(&self.first_minifat_sector.to_le_bytes());
        header[64..68].copy_from_slice(&self.num_minifat_sectors.to_le_bytes());
        header[68..72].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
        for i in 0..HEADER_FAT_SLOTS {
            let id = self.fat_sectors.get(i).copied().unwrap_or(FREESECT);
            let offset = 76 + i * 4;
            header[offset..offset + 4].copy_from_slice(&id.to_le_bytes());
        }
        header
    }
}

/// Encode one 128-byte directory record
pub fn encode_entry(name: &str, kind: u8, start: u32, size: u64) -> [u8; DIRENTRY_SIZE] {
    let mut entry = [0u8; DIRENTRY_SIZE];
    let units: Vec<u16> = name.encode_utf16().take(31).collect();
    for (i, unit) in units.iter().enumerate() {
        entry[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    let name_len = if name.is_empty() {
        0u16
    } else {
        ((units.len() + 1) * 2) as u16
    };
    entry[64..66].copy_from_slice(&name_len.to_le_bytes());
    entry[66] = kind;
    entry[67] = 1;
    entry[68..72].copy_from_slice(&NOSTREAM.to_le_bytes());
    entry[72..76].copy_from_slice(&NOSTREAM.to_le_bytes());
    entry[76..80].copy_from_slice(&NOSTREAM.to_le_bytes());
    entry[116..120].copy_from_slice(&start.to_le_bytes());
    entry[120..128].copy_from_slice(&size.to_le_bytes());
    entry
}

/// Builder for a complete compound file image
#[derive(Debug, Clone, Default)]
pub struct Image {
    sectors: Vec<Vec<u8>>,
    fat: Vec<u32>,
    minifat: Vec<u32>,
    ministream: Vec<u8>,
    entries: Vec<[u8; DIRENTRY_SIZE]>,
    root_name: Option<String>,
    root_size: Option<u64>,
    trailing_empty: usize,
    pub header: HeaderFields,
}

impl Image {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(&mut self, sector: u32) {
        while self.sectors.len() <= sector as usize {
            self.sectors.push(vec![0u8; SECTOR_SIZE]);
            self.fat.push(FREESECT);
        }
    }

    pub fn set_link(&mut self, sector: u32, link: u32) {
        self.ensure(sector);
        self.fat[sector as usize] = link;
    }

    pub fn set_mini_link(&mut self, mini_sector: u32, link: u32) {
        self.minifat[mini_sector as usize] = link;
    }

    /// Write `data` across the given sectors and link them in order
    pub fn put_chain(&mut self, chain: &[u32], data: &[u8]) {
        for (i, &sector) in chain.iter().enumerate() {
            self.ensure(sector);
            let begin = (i * SECTOR_SIZE).min(data.len());
            let end = ((i + 1) * SECTOR_SIZE).min(data.len());
            let buf = &mut self.sectors[sector as usize];
            buf.fill(0);
            buf[..end - begin].copy_from_slice(&data[begin..end]);
            let next = chain.get(i + 1).copied().unwrap_or(ENDOFCHAIN);
            self.fat[sector as usize] = next;
        }
    }

    /// Append `data` in fresh contiguous sectors; returns the start sector
    pub fn add_sectors(&mut self, data: &[u8]) -> u32 {
        let count = data.len().div_ceil(SECTOR_SIZE);
        if count == 0 {
            return ENDOFCHAIN;
        }
        let start = self.sectors.len() as u32;
        let chain: Vec<u32> = (start..start + count as u32).collect();
        self.put_chain(&chain, data);
        start
    }

    /// Append `data` to the mini stream; returns the start mini sector
    pub fn add_mini(&mut self, data: &[u8]) -> u32 {
        let count = data.len().div_ceil(MINI_SECTOR_SIZE);
        if count == 0 {
            return ENDOFCHAIN;
        }
        let start = self.minifat.len() as u32;
        for i in 0..count as u32 {
            let next = if i + 1 == count as u32 {
                ENDOFCHAIN
            } else {
                start + i + 1
            };
            self.minifat.push(next);
        }
        self.ministream.extend_from_slice(data);
        let padded = self.ministream.len().div_ceil(MINI_SECTOR_SIZE) * MINI_SECTOR_SIZE;
        self.ministream.resize(padded, 0);
        start
    }

    pub fn add_entry(&mut self, name: &str, kind: u8, start: u32, size: u64) {
        self.entries.push(encode_entry(name, kind, start, size));
    }

    /// Add a stream, placing it in the mini stream when below the cutoff
    pub fn add_stream(&mut self, name: &str, data: &[u8]) {
        let start = if (data.len() as u64) < self.header.mini_stream_cutoff as u64 {
            self.add_mini(data)
        } else {
            self.add_sectors(data)
        };
        self.add_entry(name, STGTY_STREAM, start, data.len() as u64);
    }

    pub fn root_name(mut self, name: &str) -> Self {
        self.root_name = Some(name.to_string());
        self
    }

    /// Override the size recorded in the root entry
    pub fn root_size(mut self, size: u64) -> Self {
        self.root_size = Some(size);
        self
    }

    /// Extra empty records appended after the padding of the last sector
    pub fn trailing_empty(mut self, count: usize) -> Self {
        self.trailing_empty = count;
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        // Mini stream container, owned by the root entry
        let ministream = std::mem::take(&mut self.ministream);
        let root_start = self.add_sectors(&ministream);
        let root_size = self.root_size.unwrap_or(ministream.len() as u64);

        // MiniFAT
        if !self.minifat.is_empty() {
            let per_sector = SECTOR_SIZE / 4;
            let mut links = std::mem::take(&mut self.minifat);
            let padded = links.len().div_ceil(per_sector) * per_sector;
            links.resize(padded, FREESECT);
            let bytes: Vec<u8> = links.iter().flat_map(|l| l.to_le_bytes()).collect();
            self.header.first_minifat_sector = self.add_sectors(&bytes);
            self.header.num_minifat_sectors = (padded / per_sector) as u32;
        }

        // Directory
        let root_name = self.root_name.clone().unwrap_or_else(|| "Root Entry".to_string());
        let mut records = vec![encode_entry(&root_name, STGTY_ROOT, root_start, root_size)];
        records.extend(self.entries.iter().copied());
        let per_sector = SECTOR_SIZE / DIRENTRY_SIZE;
        let padded = records.len().div_ceil(per_sector) * per_sector + self.trailing_empty;
        records.resize(padded, encode_entry("", STGTY_EMPTY, 0, 0));
        let dir_bytes: Vec<u8> = records.iter().flatten().copied().collect();
        self.header.first_dir_sector = self.add_sectors(&dir_bytes);

        // FAT, covering every sector including its own
        let per_sector = SECTOR_SIZE / 4;
        let mut num_fat = 1usize;
        while (self.sectors.len() + num_fat) > num_fat * per_sector {
            num_fat += 1;
        }
        let first_fat = self.sectors.len() as u32;
        for i in 0..num_fat as u32 {
            self.set_link(first_fat + i, FATSECT);
        }
        let mut links = self.fat.clone();
        links.resize(num_fat * per_sector, FREESECT);
        for (i, chunk) in links.chunks(per_sector).enumerate() {
            let buf = &mut self.sectors[first_fat as usize + i];
            for (j, link) in chunk.iter().enumerate() {
                buf[j * 4..j * 4 + 4].copy_from_slice(&link.to_le_bytes());
            }
        }
        self.header.fat_sectors = (first_fat..first_fat + num_fat as u32).collect();

        let mut out = self.header.build().to_vec();
        for sector in &self.sectors {
            out.extend_from_slice(sector);
        }
        out
    }
}

/// Deterministic, position-dependent test payload
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u32).wrapping_mul(31).wrapping_add(seed as u32 * 7) as u8 ^ (i >> 8) as u8)
        .collect()
}
