use log::debug;

use crate::config::*;
use crate::error::{FsError, Result};
use crate::{BlockDevice, SuperBlock};

pub fn read_superblock(device: &impl BlockDevice) -> Result<SuperBlock> {
    let mut buf = [0u8; BLOCK_SIZE];
    device.read_block(SUPERBLOCK_ID as usize, &mut buf)?;
    let superblock = SuperBlock::decode(&buf);

    if !superblock.is_valid() {
        debug!("rejecting superblock {:?}", superblock);
        return Err(FsError::InvalidSuperBlock);
    }
    Ok(superblock)
}

/// Only ever called while initializing; the superblock is read-only afterwards.
pub fn write_superblock(device: &impl BlockDevice, superblock: &SuperBlock) -> Result<()> {
    device.write_block_prefix(SUPERBLOCK_ID as usize, &superblock.encode())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::RamDisk;

    #[test]
    fn superblock_round_trip_and_magic_check() {
        let rd = RamDisk::default();
        assert!(matches!(read_superblock(&rd), Err(FsError::InvalidSuperBlock)));
        write_superblock(&rd, &SuperBlock::new()).unwrap();
        assert_eq!(read_superblock(&rd).unwrap(), SuperBlock::new());
    }
}
