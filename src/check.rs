//! Whole-volume consistency check.
//! Walks the tree from the root, counts references to every block and compares them with the bitmap.

use core::fmt;

use log::warn;

use crate::bitmap::read_bitmap;
use crate::config::*;
use crate::directory::parse_entries;
use crate::error::{FsError, Result};
use crate::file::read_all;
use crate::inode::get_inode;
use crate::structs::is_data_block;
use crate::BlockDevice;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub files: usize,
    pub directories: usize,
    /// Blocks referenced by the superblock/bitmap reservation or by an inode.
    pub used_blocks: usize,
    /// Allocated in the bitmap but referenced by nothing, e.g. after a failed write.
    pub leaked: Vec<u16>,
    /// Referenced from more than one place.
    pub double_referenced: Vec<u16>,
    /// Referenced but marked free in the bitmap.
    pub referenced_free: Vec<u16>,
    /// Inodes or records that could not be decoded.
    pub problems: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.leaked.is_empty()
            && self.double_referenced.is_empty()
            && self.referenced_free.is_empty()
            && self.problems.is_empty()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} files, {} directories, {} blocks in use",
            self.files, self.directories, self.used_blocks
        )?;
        if !self.leaked.is_empty() {
            writeln!(f, "leaked blocks: {:?}", self.leaked)?;
        }
        if !self.double_referenced.is_empty() {
            writeln!(f, "blocks referenced more than once: {:?}", self.double_referenced)?;
        }
        if !self.referenced_free.is_empty() {
            writeln!(f, "referenced blocks marked free: {:?}", self.referenced_free)?;
        }
        for problem in self.problems.iter() {
            writeln!(f, "{}", problem)?;
        }
        Ok(())
    }
}

pub fn check(device: &impl BlockDevice) -> Result<CheckReport> {
    let num_blocks = device.num_blocks().min(BLOCK_SIZE * 8);
    let mut refs = vec![0u32; num_blocks];
    let mut report = CheckReport::default();
    refs[SUPERBLOCK_ID as usize] += 1;
    refs[BITMAP_BLOCK_ID as usize] += 1;

    let mut pending = vec![(ROOT_INODE_ID, String::from("/"))];
    while let Some((inode_id, path)) = pending.pop() {
        let inode = match get_inode(device, inode_id) {
            Ok(inode) => inode,
            Err(FsError::CorruptInode(_)) | Err(FsError::InvalidBlockId) => {
                report.problems.push(format!("{}: inode {} is not readable", path, inode_id));
                continue;
            }
            Err(e) => return Err(e),
        };

        refs[inode.id as usize] += 1;
        if refs[inode.id as usize] > 1 {
            // Already walked through another record.
            continue;
        }
        for &block_id in inode.ptrs.iter() {
            if is_data_block(block_id) && (block_id as usize) < num_blocks {
                refs[block_id as usize] += 1;
            }
        }

        if !inode.is_dir() {
            report.files += 1;
            continue;
        }
        report.directories += 1;
        let raw = read_all(device, &inode, usize::MAX)?;
        let entries = match parse_entries(inode.id, &raw) {
            Ok(entries) => entries,
            Err(_) => {
                report
                    .problems
                    .push(format!("{}: size {} is not a whole number of records", path, raw.len()));
                continue;
            }
        };
        for entry in entries {
            let child_path = format!("{}{}/", path, entry.name_lossy());
            if entry.inode_id == ROOT_INODE_ID {
                report.problems.push(format!("{}: record points back at the root", child_path));
                continue;
            }
            pending.push((entry.inode_id, child_path));
        }
    }

    let bitmap = read_bitmap(device)?;
    for (block_id, &count) in refs.iter().enumerate() {
        let allocated = !bitmap[block_id];
        if count > 0 {
            report.used_blocks += 1;
        }
        if count > 1 {
            report.double_referenced.push(block_id as u16);
        }
        if count > 0 && !allocated {
            report.referenced_free.push(block_id as u16);
        }
        if count == 0 && allocated {
            report.leaked.push(block_id as u16);
        }
    }

    if !report.is_clean() {
        warn!("consistency check failed: {}", report);
    }
    Ok(report)
}
