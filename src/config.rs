pub const MAGIC: u32 = 2019;

pub const BLOCK_SIZE: usize = 512;
pub const NUM_BLOCKS: usize = 4096;
pub const NUM_INODES: u32 = 126; // Inode slots advertised in the superblock

pub const SUPERBLOCK_ID: u16 = 0; // Block ID for the superblock
pub const BITMAP_BLOCK_ID: u16 = 1; // Block ID for the allocation bitmap
pub const ROOT_INODE_ID: u16 = 2; // First metadata block handed out, always the root

// Bitmap bytes [0, META_REGION_BYTES) cover metadata (inode) blocks, the rest cover data blocks.
pub const META_REGION_BYTES: usize = 16;
pub const META_REGION_END: usize = META_REGION_BYTES * 8;

pub const INODE_HEADER_SIZE: usize = 8; // size (4 bytes) + type (4 bytes)
pub const BLOCK_PTR_SIZE: usize = 2;
pub const NUM_BLOCK_PTRS: usize = (BLOCK_SIZE - INODE_HEADER_SIZE) / BLOCK_PTR_SIZE;
pub const MAX_FILE_SIZE: usize = NUM_BLOCK_PTRS * BLOCK_SIZE;

pub const DIR_ENTRY_SIZE: usize = 32; // 1 byte inode id + 31 bytes NUL-terminated name
pub const MAX_FILE_NAME_LEN: usize = DIR_ENTRY_SIZE - 2; // minus inode id byte and terminator
pub const MAX_DIR_ENTRY_INODE_ID: u16 = u8::MAX as u16;
