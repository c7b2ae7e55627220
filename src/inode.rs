//! Management of reading, writing, creating and releasing inodes.

use log::debug;

use crate::bitmap::*;
use crate::config::*;
use crate::error::{FsError, Result};
use crate::structs::is_meta_block;
use crate::{BlockDevice, FileType, Inode};

pub fn get_inode(device: &impl BlockDevice, inode_id: u16) -> Result<Inode> {
    if !is_meta_block(inode_id) {
        return Err(FsError::InvalidBlockId);
    }
    let mut buf = [0u8; BLOCK_SIZE];
    device.read_block(inode_id as usize, &mut buf)?;
    Inode::decode(inode_id, &buf)
}

pub fn write_inode(device: &impl BlockDevice, inode: &Inode) -> Result<()> {
    if !is_meta_block(inode.id) {
        return Err(FsError::InvalidBlockId);
    }
    device.write_block(inode.id as usize, &inode.encode())
}

/// Allocates an inode block and its first content block, and persists a zero-size inode.
/// If the content block cannot be allocated the inode block is released again.
pub fn alloc_inode(device: &impl BlockDevice, ftype: FileType) -> Result<Inode> {
    let inode_id = alloc_block(device, BlockKind::Metadata)?;
    let first_block = match alloc_block(device, BlockKind::Data) {
        Ok(id) => id,
        Err(e) => {
            free_block(device, inode_id)?;
            return Err(e);
        }
    };
    let inode = Inode::new(inode_id, ftype, first_block);
    write_inode(device, &inode)?;
    debug!("alloc inode {} ({:?}), first block {}", inode_id, ftype, first_block);
    Ok(inode)
}

/// Releases every content block and then the inode block itself.
pub fn free_inode(device: &impl BlockDevice, inode: &Inode) -> Result<()> {
    for &block_id in inode.ptrs.iter() {
        free_block(device, block_id)?;
    }
    free_block(device, inode.id)?;
    debug!("free inode {} ({} content blocks)", inode.id, inode.ptrs.len());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::RamDisk;

    #[test]
    fn alloc_and_free_inode() {
        let rd = RamDisk::default();
        init_bitmap(&rd).unwrap();
        let inode = alloc_inode(&rd, FileType::Regular).unwrap();
        assert_eq!(inode.id, ROOT_INODE_ID);
        assert_eq!(inode.ptrs, vec![META_REGION_END as u16]);
        assert_eq!(get_inode(&rd, inode.id).unwrap(), inode);

        free_inode(&rd, &inode).unwrap();
        assert!(is_free(&rd, inode.id).unwrap());
        assert!(is_free(&rd, inode.ptrs[0]).unwrap());
    }

    #[test]
    fn failed_data_alloc_releases_inode_block() {
        let rd = RamDisk::default();
        init_bitmap(&rd).unwrap();
        while alloc_block(&rd, BlockKind::Data).is_ok() {}
        let free_meta = count_free(&rd, BlockKind::Metadata).unwrap();
        assert!(matches!(alloc_inode(&rd, FileType::Regular), Err(FsError::OutOfDataBlocks)));
        assert_eq!(count_free(&rd, BlockKind::Metadata).unwrap(), free_meta);
    }

    #[test]
    fn inode_ids_are_metadata_blocks() {
        let rd = RamDisk::default();
        assert!(matches!(get_inode(&rd, 0), Err(FsError::InvalidBlockId)));
        assert!(matches!(get_inode(&rd, 1), Err(FsError::InvalidBlockId)));
        assert!(matches!(get_inode(&rd, 128), Err(FsError::InvalidBlockId)));
    }
}
