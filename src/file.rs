//! Content I/O over an inode's block-pointer table.
//! Writes only ever append; the size field is persisted last so new blocks become visible atomically.

use log::{trace, warn};

use crate::bitmap::{alloc_block, BlockKind};
use crate::config::*;
use crate::error::{FsError, Result};
use crate::inode::{get_inode, write_inode};
use crate::{BlockDevice, FileType, Inode};

/// Appends `data` to the end of the inode's content.
/// Returns the new size of the file.
pub fn write_span(device: &impl BlockDevice, inode_id: u16, data: &[u8]) -> Result<usize> {
    let mut inode = get_inode(device, inode_id)?;
    append(device, &mut inode, data)?;
    Ok(inode.size())
}

/// Appends to an already loaded inode and persists it.
/// On failure the in-memory pointer table is restored to what is on disk,
/// though any data blocks already filled stay allocated.
pub(crate) fn append(device: &impl BlockDevice, inode: &mut Inode, data: &[u8]) -> Result<()> {
    let old_size = inode.size();
    let new_size = old_size + data.len();
    if new_size > MAX_FILE_SIZE {
        return Err(FsError::FileTooLarge);
    }
    if data.is_empty() {
        return Ok(());
    }

    let old_blocks = inode.ptrs.len();
    let mut pos = old_size;
    let mut written = 0;
    let mut block_buf = [0u8; BLOCK_SIZE];

    while written < data.len() {
        let block_idx = pos / BLOCK_SIZE;
        let block_offset = pos % BLOCK_SIZE;
        let chunk = (BLOCK_SIZE - block_offset).min(data.len() - written);

        let block_id = if block_idx < inode.ptrs.len() {
            let block_id = inode.ptrs[block_idx];
            device.read_block(block_id as usize, &mut block_buf)?;
            block_id
        } else {
            match alloc_block(device, BlockKind::Data) {
                Ok(block_id) => {
                    inode.ptrs.push(block_id);
                    block_buf.fill(0);
                    block_id
                }
                Err(e) => {
                    warn!(
                        "inode {}: out of space after {} of {} bytes, {} blocks orphaned",
                        inode.id,
                        written,
                        data.len(),
                        inode.ptrs.len() - old_blocks
                    );
                    inode.ptrs.truncate(old_blocks);
                    return Err(e);
                }
            }
        };

        block_buf[block_offset..block_offset + chunk].copy_from_slice(&data[written..written + chunk]);
        device.write_block(block_id as usize, &block_buf)?;
        trace!("inode {}: wrote {} bytes to block {}", inode.id, chunk, block_id);

        written += chunk;
        pos += chunk;
    }

    inode.size = new_size as u32;
    write_inode(device, inode)
}

/// Reads up to `max_len` bytes from the start of the inode's content.
pub fn read_span(device: &impl BlockDevice, inode_id: u16, max_len: usize) -> Result<Vec<u8>> {
    let inode = get_inode(device, inode_id)?;
    read_all(device, &inode, max_len)
}

pub(crate) fn read_all(device: &impl BlockDevice, inode: &Inode, max_len: usize) -> Result<Vec<u8>> {
    let len = max_len.min(inode.size());
    let mut out = Vec::with_capacity(len);
    let mut block_buf = [0u8; BLOCK_SIZE];

    for &block_id in inode.ptrs.iter() {
        if out.len() >= len {
            break;
        }
        device.read_block(block_id as usize, &mut block_buf)?;
        let chunk = (len - out.len()).min(BLOCK_SIZE);
        out.extend_from_slice(&block_buf[..chunk]);
    }

    Ok(out)
}

pub fn size_of(device: &impl BlockDevice, inode_id: u16) -> Result<usize> {
    Ok(get_inode(device, inode_id)?.size())
}

pub fn type_of(device: &impl BlockDevice, inode_id: u16) -> Result<FileType> {
    Ok(get_inode(device, inode_id)?.ftype)
}
