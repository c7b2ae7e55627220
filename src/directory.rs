//! Directory content handling.
//! A directory's content is a packed, ordered run of 32-byte records with no free slots;
//! removing a record shifts everything after it left and shrinks the directory by one record.

use log::{debug, trace};

use crate::bitmap::free_block;
use crate::config::*;
use crate::error::{FsError, Result};
use crate::file::{append, read_all};
use crate::inode::{get_inode, write_inode};
use crate::structs::*;
use crate::BlockDevice;

/// Decodes a directory's raw content into its records, in on-disk order.
pub fn parse_entries(dir_id: u16, raw: &[u8]) -> Result<Vec<DirEntry>> {
    if raw.len() % DIR_ENTRY_SIZE != 0 {
        return Err(FsError::CorruptInode(dir_id));
    }
    Ok(raw.chunks_exact(DIR_ENTRY_SIZE).map(DirEntry::decode).collect())
}

fn encode_entries(entries: &[DirEntry]) -> Vec<u8> {
    entries.iter().flat_map(|entry| entry.encode()).collect()
}

pub fn read_dir(device: &impl BlockDevice, dir_inode: &Inode) -> Result<Vec<DirEntry>> {
    if !dir_inode.is_dir() {
        return Err(FsError::NotADirectory);
    }
    let raw = read_all(device, dir_inode, usize::MAX)?;
    parse_entries(dir_inode.id, &raw)
}

/// Query inode id of a file by name in the parent directory inode.
/// The first matching record wins.
pub fn dir_lookup(device: &impl BlockDevice, dir_inode: &Inode, name: &[u8]) -> Result<u16> {
    let entries = read_dir(device, dir_inode)?;
    trace!(
        "lookup {:?} among {} entries of inode {}",
        String::from_utf8_lossy(name),
        entries.len(),
        dir_inode.id
    );
    entries
        .iter()
        .find(|entry| entry.name_eq(name))
        .map(|entry| entry.inode_id)
        .ok_or(FsError::NotFound)
}

/// Appends a record for `child_id` to the directory.
/// Does not check for collisions, that is the caller's job.
pub fn dir_add_entry(device: &impl BlockDevice, dir_id: u16, child_id: u16, name: &[u8]) -> Result<()> {
    let entry = DirEntry::new(child_id, name)?;
    let mut dir_inode = get_inode(device, dir_id)?;
    if !dir_inode.is_dir() {
        return Err(FsError::NotADirectory);
    }
    append(device, &mut dir_inode, &entry.encode())?;
    debug!("dir {}: added {:?} -> {}", dir_id, entry.name_lossy(), child_id);
    Ok(())
}

/// Removes the first record named `name`, keeping the order of the others.
/// The directory is rebuilt from scratch: size zeroed, all but the first block released,
/// then the compacted content appended again.
/// Returns the inode id the removed record pointed to.
pub fn dir_rm_entry(device: &impl BlockDevice, dir_id: u16, name: &[u8]) -> Result<u16> {
    let mut dir_inode = get_inode(device, dir_id)?;
    let mut entries = read_dir(device, &dir_inode)?;
    let idx = entries
        .iter()
        .position(|entry| entry.name_eq(name))
        .ok_or(FsError::NotFound)?;
    let removed = entries.remove(idx);

    for &block_id in dir_inode.ptrs[1..].iter() {
        free_block(device, block_id)?;
    }
    dir_inode.ptrs.truncate(1);
    dir_inode.size = 0;
    write_inode(device, &dir_inode)?;

    append(device, &mut dir_inode, &encode_entries(&entries))?;
    debug!(
        "dir {}: removed {:?} (record {}), {} records left",
        dir_id,
        removed.name_lossy(),
        idx,
        entries.len()
    );
    Ok(removed.inode_id)
}
