//! LLFS is a minimal single-volume file system stored as a fixed-size block image.
//! No permissions, timestamps, links or journaling.
//!
//! LLFS's linear layout (4096 blocks of 512 bytes):
//! - Block 0: Superblock (magic, block count, inode slots)
//! - Block 1: Allocation bitmap, 1 bit per block, 1 = free
//! - Blocks 2..128: Inode blocks, one inode per block, the root at block 2
//! - Blocks 128..4096: Data blocks
//!
//! LLFS's layers (from bottom to top):
//! 1. Block Device: Fixed-size block I/O over a host file or memory.
//! 2. Bitmap: Lowest-free-first allocation of metadata and data blocks.
//! 3. Inode / File: Inode records and append-only content I/O across blocks.
//! 4. Directory / Path: Packed 32-byte records and slash-delimited path walks.
//! 5. Volume: The public operations, keeping allocator, inodes and directories consistent.

mod config;
mod block_dev;
mod structs;
mod superblock;
mod bitmap;
mod inode;
mod file;
mod directory;
mod path;
mod check;
mod fs;
mod error;

pub use block_dev::{BlockDevice, FileDisk, RamDisk};
pub use config::*;
pub use superblock::*;
pub use structs::*;
pub use bitmap::{alloc_block, count_free, free_block, init_bitmap, is_free, BlockKind};
pub use inode::*;
pub use file::{read_span, size_of, type_of, write_span};
pub use directory::{dir_add_entry, dir_lookup, dir_rm_entry, parse_entries, read_dir};
pub use path::*;
pub use check::CheckReport;
pub use fs::*;
pub use error::FsError as Error;
pub use error::Result;
