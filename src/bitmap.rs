//! Free-space allocator over the bitmap block.
//! One bit per block, most significant bit of each byte first, 1 = free.
//! The bitmap block is the only allocator state, nothing is cached between calls.

use core::ops::Range;

use bitvec::prelude::*;
use log::{debug, warn};

use crate::config::*;
use crate::error::{FsError, Result};
use crate::BlockDevice;

/// Which region of the bitmap an allocation is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Inode blocks, bitmap bytes [0, META_REGION_BYTES).
    Metadata,
    /// File and directory content blocks, the rest of the bitmap.
    Data,
}

impl BlockKind {
    fn range(self, num_blocks: usize) -> Range<usize> {
        let end = num_blocks.min(BLOCK_SIZE * 8);
        match self {
            BlockKind::Metadata => 0..META_REGION_END.min(end),
            BlockKind::Data => META_REGION_END.min(end)..end,
        }
    }

    fn exhausted(self) -> FsError {
        match self {
            BlockKind::Metadata => FsError::OutOfInodes,
            BlockKind::Data => FsError::OutOfDataBlocks,
        }
    }
}

pub type Bitmap = BitArray<[u8; BLOCK_SIZE], Msb0>;

pub fn read_bitmap(device: &impl BlockDevice) -> Result<Bitmap> {
    let mut buf = [0u8; BLOCK_SIZE];
    device.read_block(BITMAP_BLOCK_ID as usize, &mut buf)?;
    Ok(BitArray::new(buf))
}

fn write_bitmap(device: &impl BlockDevice, bitmap: &Bitmap) -> Result<()> {
    device.write_block(BITMAP_BLOCK_ID as usize, &bitmap.data)
}

/// Writes a fresh bitmap: superblock and bitmap blocks allocated, every other addressable block free.
pub fn init_bitmap(device: &impl BlockDevice) -> Result<()> {
    let mut bitmap: Bitmap = BitArray::new([0xFF; BLOCK_SIZE]);
    bitmap.set(SUPERBLOCK_ID as usize, false);
    bitmap.set(BITMAP_BLOCK_ID as usize, false);
    let addressable = device.num_blocks().min(BLOCK_SIZE * 8);
    bitmap[addressable..].fill(false);
    write_bitmap(device, &bitmap)
}

/// Reserves the lowest-numbered free block of the given kind.
/// Data blocks are handed out zero-filled.
pub fn alloc_block(device: &impl BlockDevice, kind: BlockKind) -> Result<u16> {
    let mut bitmap = read_bitmap(device)?;
    let range = kind.range(device.num_blocks());
    let offset = bitmap[range.clone()].first_one().ok_or_else(|| kind.exhausted())?;
    let block_id = range.start + offset;
    bitmap.set(block_id, false);
    write_bitmap(device, &bitmap)?;

    if kind == BlockKind::Data {
        device.write_block(block_id, &[0u8; BLOCK_SIZE])?;
    }
    debug!("alloc {:?} block {}", kind, block_id);
    Ok(block_id as u16)
}

/// Returns a block to the free pool.
/// The superblock and bitmap block can never be released.
pub fn free_block(device: &impl BlockDevice, block_id: u16) -> Result<()> {
    let id = block_id as usize;
    if block_id <= BITMAP_BLOCK_ID || id >= device.num_blocks().min(BLOCK_SIZE * 8) {
        return Err(FsError::InvalidBlockId);
    }
    let mut bitmap = read_bitmap(device)?;
    if bitmap[id] {
        warn!("block {} released twice", block_id);
    }
    bitmap.set(id, true);
    write_bitmap(device, &bitmap)?;
    debug!("free block {}", block_id);
    Ok(())
}

pub fn is_free(device: &impl BlockDevice, block_id: u16) -> Result<bool> {
    let bitmap = read_bitmap(device)?;
    bitmap.get(block_id as usize).map(|bit| *bit).ok_or(FsError::InvalidBlockId)
}

pub fn count_free(device: &impl BlockDevice, kind: BlockKind) -> Result<usize> {
    let bitmap = read_bitmap(device)?;
    Ok(bitmap[kind.range(device.num_blocks())].count_ones())
}
