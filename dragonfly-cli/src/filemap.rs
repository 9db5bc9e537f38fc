//! Memory-mapped file I/O, wired into the core through `FileRegion`.
//!
//! `set_len` both resizes the underlying file and remaps it, since a
//! `memmap2::MmapMut` is fixed-size for its lifetime; the core only
//! ever calls `set_len` once, immediately after it learns the final
//! output size, so this is not a hot path.

use std::fs::File;

use memmap2::MmapMut;

use dragonfly_crypto::io::FileRegion;

pub struct FileMap {
    file: File,
    map: Option<MmapMut>,
}

impl FileMap {
    pub fn create(file: File) -> Self {
        FileMap { file, map: None }
    }

    pub fn open_existing(file: File, size: u64) -> std::io::Result<Self> {
        file.set_len(size)?;
        let map = if size == 0 { None } else { Some(unsafe { MmapMut::map_mut(&file)? }) };
        Ok(FileMap { file, map })
    }
}

impl FileRegion for FileMap {
    fn as_slice(&self) -> &[u8] {
        match &self.map {
            Some(map) => &map[..],
            None => &[],
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match &mut self.map {
            Some(map) => &mut map[..],
            None => &mut [],
        }
    }

    fn set_len(&mut self, new_len: u64) -> std::io::Result<()> {
        self.map = None;
        self.file.set_len(new_len)?;
        self.map = if new_len == 0 { None } else { Some(unsafe { MmapMut::map_mut(&self.file)? }) };
        Ok(())
    }

    fn sync(&self) -> std::io::Result<()> {
        if let Some(map) = &self.map {
            map.flush()?;
        }
        self.file.sync_all()
    }
}
