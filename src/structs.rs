//! On-disk structures and their byte-exact encodings.
//! All multi-byte integers are little-endian.

use crate::config::*;
use crate::error::{FsError, Result};

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub magic: u32,      // Magic number to identify the filesystem
    pub num_blocks: u32, // Total number of blocks in the volume
    pub num_inodes: u32, // Total number of inode slots
}

impl SuperBlock {
    pub const ENCODED_SIZE: usize = 12;

    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            num_blocks: NUM_BLOCKS as u32,
            num_inodes: NUM_INODES,
        }
    }

    pub fn encode(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4..8].copy_from_slice(&self.num_blocks.to_le_bytes());
        buf[8..12].copy_from_slice(&self.num_inodes.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; BLOCK_SIZE]) -> Self {
        Self {
            magic: read_u32(buf, 0),
            num_blocks: read_u32(buf, 4),
            num_inodes: read_u32(buf, 8),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC && self.num_blocks == NUM_BLOCKS as u32 && self.num_inodes == NUM_INODES
    }
}

impl Default for SuperBlock {
    fn default() -> Self {
        Self::new()
    }
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Directory = 0,
    Regular = 1,
}

impl FileType {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(FileType::Directory),
            1 => Some(FileType::Regular),
            _ => None,
        }
    }
}

/// Number of pointer-table entries an inode of `size` bytes carries.
/// Every inode owns at least one content block from creation on.
pub fn blocks_for_size(size: usize) -> usize {
    size.div_ceil(BLOCK_SIZE).max(1)
}

/// One-block metadata record. The inode id is the block number it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub id: u16,
    pub size: u32,
    pub ftype: FileType,
    /// Content blocks in file order, always `blocks_for_size(size)` long.
    pub ptrs: Vec<u16>,
}

impl Inode {
    pub fn new(id: u16, ftype: FileType, first_block: u16) -> Self {
        Self {
            id,
            size: 0,
            ftype,
            ptrs: vec![first_block],
        }
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }

    pub fn is_dir(&self) -> bool {
        self.ftype == FileType::Directory
    }

    pub fn encode(&self) -> [u8; BLOCK_SIZE] {
        let mut buf = [0u8; BLOCK_SIZE];
        buf[0..4].copy_from_slice(&(self.size as i32).to_le_bytes());
        buf[4..8].copy_from_slice(&(self.ftype as u32).to_le_bytes());
        for (i, ptr) in self.ptrs.iter().enumerate() {
            let offset = INODE_HEADER_SIZE + i * BLOCK_PTR_SIZE;
            buf[offset..offset + BLOCK_PTR_SIZE].copy_from_slice(&ptr.to_le_bytes());
        }
        buf
    }

    /// Decodes an inode block, reading only as many pointers as the size field accounts for.
    pub fn decode(id: u16, buf: &[u8; BLOCK_SIZE]) -> Result<Self> {
        let raw_size = read_u32(buf, 0) as i32;
        if raw_size < 0 || raw_size as usize > MAX_FILE_SIZE {
            return Err(FsError::CorruptInode(id));
        }
        let ftype = FileType::from_raw(read_u32(buf, 4)).ok_or(FsError::CorruptInode(id))?;
        let ptrs = (0..blocks_for_size(raw_size as usize))
            .map(|i| read_u16(buf, INODE_HEADER_SIZE + i * BLOCK_PTR_SIZE))
            .collect::<Vec<_>>();
        if ptrs.iter().any(|&p| !is_data_block(p)) {
            return Err(FsError::CorruptInode(id));
        }
        Ok(Self {
            id,
            size: raw_size as u32,
            ftype,
            ptrs,
        })
    }
}

pub fn is_meta_block(block_id: u16) -> bool {
    (block_id as usize) < META_REGION_END && block_id > BITMAP_BLOCK_ID
}

pub fn is_data_block(block_id: u16) -> bool {
    (block_id as usize) >= META_REGION_END && (block_id as usize) < NUM_BLOCKS
}

/// Checks that `name` fits a directory record and can be found by a path walk.
pub fn validate_name(name: &[u8]) -> Result<()> {
    if name.is_empty() || name.len() > MAX_FILE_NAME_LEN || name.iter().any(|&c| c == 0 || c == b'/') {
        return Err(FsError::InvalidFileName);
    }
    Ok(())
}

/// A 32-byte directory record: low byte of the child inode id, then a NUL-terminated name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub inode_id: u16,
    pub name: [u8; DIR_ENTRY_SIZE - 1],
}

impl DirEntry {
    pub fn new(inode_id: u16, name: &[u8]) -> Result<Self> {
        validate_name(name)?;
        if inode_id > MAX_DIR_ENTRY_INODE_ID {
            return Err(FsError::InodeIdOutOfRange(inode_id));
        }
        let mut arr = [0; DIR_ENTRY_SIZE - 1];
        arr[..name.len()].copy_from_slice(name);
        Ok(Self { inode_id, name: arr })
    }

    /// Name bytes up to (not including) the terminator.
    pub fn name(&self) -> &[u8] {
        let end = self.name.iter().position(|&c| c == 0).unwrap_or(self.name.len());
        &self.name[..end]
    }

    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(self.name()).into_owned()
    }

    pub fn name_eq(&self, name: &[u8]) -> bool {
        self.name() == name
    }

    pub fn encode(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut buf = [0u8; DIR_ENTRY_SIZE];
        buf[0] = self.inode_id as u8;
        buf[1..].copy_from_slice(&self.name);
        buf
    }

    pub fn decode(buf: &[u8]) -> Self {
        let mut name = [0; DIR_ENTRY_SIZE - 1];
        name.copy_from_slice(&buf[1..DIR_ENTRY_SIZE]);
        Self {
            inode_id: buf[0] as u16,
            name,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn superblock_layout() {
        let raw = SuperBlock::new().encode();
        assert_eq!(&raw[0..4], &2019u32.to_le_bytes());
        assert_eq!(&raw[4..8], &4096u32.to_le_bytes());
        assert_eq!(&raw[8..12], &126u32.to_le_bytes());
    }

    #[test]
    fn inode_layout() {
        let mut inode = Inode::new(5, FileType::Regular, 130);
        inode.size = 600;
        inode.ptrs.push(131);
        let raw = inode.encode();
        assert_eq!(&raw[0..4], &600i32.to_le_bytes());
        assert_eq!(&raw[4..8], &1u32.to_le_bytes());
        assert_eq!(&raw[8..10], &130u16.to_le_bytes());
        assert_eq!(&raw[10..12], &131u16.to_le_bytes());
        assert!(raw[12..].iter().all(|&b| b == 0));
        assert_eq!(Inode::decode(5, &raw).unwrap(), inode);
    }

    #[test]
    fn inode_decode_rejects_garbage() {
        let mut raw = Inode::new(3, FileType::Directory, 200).encode();
        raw[4] = 7;
        assert!(matches!(Inode::decode(3, &raw), Err(FsError::CorruptInode(3))));

        // Size claims two blocks but only one pointer is set.
        let mut raw = Inode::new(3, FileType::Regular, 200).encode();
        raw[0..4].copy_from_slice(&513i32.to_le_bytes());
        assert!(matches!(Inode::decode(3, &raw), Err(FsError::CorruptInode(3))));
    }

    #[test]
    fn blocks_for_size_counts_first_block() {
        assert_eq!(blocks_for_size(0), 1);
        assert_eq!(blocks_for_size(512), 1);
        assert_eq!(blocks_for_size(513), 2);
        assert_eq!(NUM_BLOCK_PTRS, 252);
    }

    #[test]
    fn dir_entry_layout() {
        let entry = DirEntry::new(9, b"a.txt").unwrap();
        let raw = entry.encode();
        assert_eq!(raw[0], 9);
        assert_eq!(&raw[1..7], b"a.txt\0");
        assert_eq!(DirEntry::decode(&raw).name(), b"a.txt");
        assert!(entry.name_eq(b"a.txt"));
        assert!(!entry.name_eq(b"a.tx"));
        assert!(!entry.name_eq(b"a.txt2"));
    }

    #[test]
    fn dir_entry_rejects_bad_names_and_wide_ids() {
        assert!(matches!(DirEntry::new(3, b""), Err(FsError::InvalidFileName)));
        assert!(matches!(DirEntry::new(3, b"a/b"), Err(FsError::InvalidFileName)));
        assert!(matches!(DirEntry::new(3, &[b'x'; 31]), Err(FsError::InvalidFileName)));
        assert!(DirEntry::new(3, &[b'x'; 30]).is_ok());
        assert!(matches!(DirEntry::new(256, b"ok"), Err(FsError::InodeIdOutOfRange(256))));
    }
}
