//! Block devices the volume can live on.
//! The volume only ever talks to a `BlockDevice`, so the host file and the in-memory disk are interchangeable.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use log::trace;

use crate::config::*;
use crate::error::{FsError, Result};

pub trait BlockDevice: Send + Sync {
    /// Returns the number of blocks in the block device.
    fn num_blocks(&self) -> usize;

    /// Reads a whole block of data from the block device.
    fn read_block(&self, block_id: usize, buf: &mut [u8; BLOCK_SIZE]) -> Result<()>;

    /// Writes a whole block of data to the block device.
    fn write_block(&self, block_id: usize, buf: &[u8; BLOCK_SIZE]) -> Result<()>;

    /// Flushes any buffered data to the underlying storage.
    fn flush(&self) -> Result<()>;

    /// Writes `data` at the start of a block, zero-filling the rest.
    /// Used for administrative blocks (superblock, fresh inodes) whose payload is shorter than a block.
    fn write_block_prefix(&self, block_id: usize, data: &[u8]) -> Result<()> {
        if data.len() > BLOCK_SIZE {
            return Err(FsError::BlockOverflow(data.len()));
        }
        let mut buf = [0u8; BLOCK_SIZE];
        buf[..data.len()].copy_from_slice(data);
        self.write_block(block_id, &buf)
    }
}

fn check_block_id(block_id: usize, num_blocks: usize) -> Result<()> {
    if block_id >= num_blocks {
        return Err(FsError::InvalidBlockId);
    }
    Ok(())
}

/// A volume image stored in a host file of exactly `num_blocks * BLOCK_SIZE` bytes.
#[derive(Debug)]
pub struct FileDisk {
    inner: Mutex<File>,
    num_blocks: usize,
}

impl FileDisk {
    /// Creates (or truncates) the image file and sizes it for a full volume.
    /// The file reads back as zeros until the volume is initialized.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len((NUM_BLOCKS * BLOCK_SIZE) as u64)?;
        Ok(FileDisk {
            inner: Mutex::new(file),
            num_blocks: NUM_BLOCKS,
        })
    }

    /// Opens an existing image for read/update.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        if len != (NUM_BLOCKS * BLOCK_SIZE) as u64 {
            return Err(FsError::InvalidDeviceSize((len / BLOCK_SIZE as u64) as usize));
        }
        Ok(FileDisk {
            inner: Mutex::new(file),
            num_blocks: NUM_BLOCKS,
        })
    }
}

impl BlockDevice for FileDisk {
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8; BLOCK_SIZE]) -> Result<()> {
        check_block_id(block_id, self.num_blocks)?;
        trace!("file disk: read block {}", block_id);
        let mut file = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8; BLOCK_SIZE]) -> Result<()> {
        check_block_id(block_id, self.num_blocks)?;
        trace!("file disk: write block {}", block_id);
        let mut file = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))?;
        file.write_all(buf)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut file = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }
}

/// A volume image held entirely in memory.
#[derive(Debug)]
pub struct RamDisk {
    inner: Mutex<Vec<u8>>,
    num_blocks: usize,
}

impl RamDisk {
    /// Creates a new zero-filled RamDisk with the specified number of blocks.
    pub fn new(num_blocks: usize) -> Self {
        RamDisk {
            inner: Mutex::new(vec![0u8; num_blocks * BLOCK_SIZE]),
            num_blocks,
        }
    }

    /// Copies out the whole image, mostly for inspecting raw layout in tests.
    pub fn snapshot(&self) -> Vec<u8> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for RamDisk {
    fn default() -> Self {
        RamDisk::new(NUM_BLOCKS)
    }
}

impl BlockDevice for RamDisk {
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8; BLOCK_SIZE]) -> Result<()> {
        check_block_id(block_id, self.num_blocks)?;
        let start = block_id * BLOCK_SIZE;
        let data = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        buf.copy_from_slice(&data[start..start + BLOCK_SIZE]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8; BLOCK_SIZE]) -> Result<()> {
        check_block_id(block_id, self.num_blocks)?;
        let start = block_id * BLOCK_SIZE;
        let mut data = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        data[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        // Nothing to flush, data is already in memory.
        Ok(())
    }
}
