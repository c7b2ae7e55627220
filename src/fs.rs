use std::sync::Arc;

use log::{debug, info};

use crate::bitmap::{count_free, init_bitmap, is_free, BlockKind};
use crate::check::{check, CheckReport};
use crate::config::*;
use crate::directory::{dir_add_entry, dir_lookup, dir_rm_entry, read_dir};
use crate::error::{FsError, Result};
use crate::file::{append, read_all};
use crate::inode::{alloc_inode, free_inode, get_inode};
use crate::path::resolve_dir;
use crate::structs::*;
use crate::superblock::{read_superblock, write_superblock};
use crate::BlockDevice;

/// True for "", "/", "//" and so on, which all resolve to the root.
fn names_root(path: &str) -> bool {
    path.split('/').all(str::is_empty)
}

/// Metadata of a single file or directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub inode_id: u16,
    pub ftype: FileType,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub free_inodes: usize,
    pub free_data_blocks: usize,
}

/// An open volume. Every operation goes through this handle;
/// mutating operations take `&mut self`, so one handle serializes all access to its image.
#[derive(Debug)]
pub struct Volume<D: BlockDevice> {
    device: Arc<D>,
    superblock: SuperBlock,
}

impl<D: BlockDevice> Volume<D> {
    /// Creates a fresh volume on `device`, destroying whatever was there.
    pub fn init(device: Arc<D>) -> Result<Self> {
        if device.num_blocks() != NUM_BLOCKS {
            return Err(FsError::InvalidDeviceSize(device.num_blocks()));
        }
        let zero = [0u8; BLOCK_SIZE];
        for block_id in 0..NUM_BLOCKS {
            device.write_block(block_id, &zero)?;
        }

        let superblock = SuperBlock::new();
        write_superblock(&*device, &superblock)?;
        init_bitmap(&*device)?;

        // First metadata block handed out on a fresh bitmap is the root id.
        let root = alloc_inode(&*device, FileType::Directory)?;
        if root.id != ROOT_INODE_ID {
            return Err(FsError::InvalidSuperBlock);
        }
        device.flush()?;
        info!("initialized volume: {} blocks, root inode {}", NUM_BLOCKS, root.id);

        Ok(Self { device, superblock })
    }

    /// Opens an existing volume after checking the superblock and the root directory.
    pub fn mount(device: Arc<D>) -> Result<Self> {
        let superblock = read_superblock(&*device)?;
        if device.num_blocks() != superblock.num_blocks as usize {
            return Err(FsError::InvalidDeviceSize(device.num_blocks()));
        }
        let root = get_inode(&*device, ROOT_INODE_ID)?;
        if !root.is_dir() || is_free(&*device, ROOT_INODE_ID)? {
            return Err(FsError::InvalidSuperBlock);
        }
        debug!("mounted volume: {:?}", superblock);
        Ok(Self { device, superblock })
    }

    fn create(&mut self, name: &str, path: &str, ftype: FileType) -> Result<u16> {
        validate_name(name.as_bytes())?;
        let parent = resolve_dir(&*self.device, path)?;
        match dir_lookup(&*self.device, &parent, name.as_bytes()) {
            Ok(_) => return Err(FsError::NameCollision),
            Err(FsError::NotFound) => {}
            Err(e) => return Err(e),
        }

        let inode = alloc_inode(&*self.device, ftype)?;
        if let Err(e) = dir_add_entry(&*self.device, parent.id, inode.id, name.as_bytes()) {
            free_inode(&*self.device, &inode)?;
            return Err(e);
        }
        debug!("created {:?} {:?} in {:?} as inode {}", ftype, name, path, inode.id);
        Ok(inode.id)
    }

    /// Creates an empty regular file `name` in the directory at `path`.
    pub fn touch(&mut self, name: &str, path: &str) -> Result<u16> {
        self.create(name, path, FileType::Regular)
    }

    /// Creates an empty directory `name` in the directory at `path`.
    pub fn mkdir(&mut self, name: &str, path: &str) -> Result<u16> {
        self.create(name, path, FileType::Directory)
    }

    fn remove(&mut self, name: &str, path: &str, ftype: FileType) -> Result<()> {
        if names_root(name) && names_root(path) {
            return Err(FsError::InvalidRoot);
        }
        let parent = resolve_dir(&*self.device, path)?;
        let inode_id = dir_lookup(&*self.device, &parent, name.as_bytes())?;
        if inode_id == ROOT_INODE_ID {
            return Err(FsError::InvalidRoot);
        }
        let inode = get_inode(&*self.device, inode_id)?;
        if inode.ftype != ftype {
            return Err(FsError::TypeMismatch);
        }
        if inode.is_dir() && inode.size() != 0 {
            return Err(FsError::NotEmpty);
        }

        // Past this point nothing is rolled back.
        free_inode(&*self.device, &inode)?;
        dir_rm_entry(&*self.device, parent.id, name.as_bytes())?;
        debug!("removed {:?} {:?} from {:?} (inode {})", ftype, name, path, inode_id);
        Ok(())
    }

    /// Removes the regular file `name` from the directory at `path`.
    pub fn rm(&mut self, name: &str, path: &str) -> Result<()> {
        self.remove(name, path, FileType::Regular)
    }

    /// Removes the empty directory `name` from the directory at `path`.
    pub fn rmdir(&mut self, name: &str, path: &str) -> Result<()> {
        self.remove(name, path, FileType::Directory)
    }

    fn lookup_child(&self, name: &str, path: &str) -> Result<Inode> {
        let parent = resolve_dir(&*self.device, path)?;
        let inode_id = dir_lookup(&*self.device, &parent, name.as_bytes())?;
        get_inode(&*self.device, inode_id)
    }

    /// Reads up to `max_len` bytes from the start of `name`.
    /// Reading a directory yields its raw records.
    pub fn read(&self, name: &str, path: &str, max_len: usize) -> Result<Vec<u8>> {
        let inode = self.lookup_child(name, path)?;
        read_all(&*self.device, &inode, max_len)
    }

    /// Appends `data` to the regular file `name`, returning its new size.
    pub fn write(&mut self, name: &str, path: &str, data: &[u8]) -> Result<usize> {
        let mut inode = self.lookup_child(name, path)?;
        if inode.ftype != FileType::Regular {
            return Err(FsError::TypeMismatch);
        }
        append(&*self.device, &mut inode, data)?;
        debug!("wrote {} bytes to {:?} in {:?}, size now {}", data.len(), name, path, inode.size());
        Ok(inode.size())
    }

    pub fn size_of(&self, name: &str, path: &str) -> Result<usize> {
        Ok(self.lookup_child(name, path)?.size())
    }

    pub fn stat(&self, name: &str, path: &str) -> Result<Stat> {
        let inode = self.lookup_child(name, path)?;
        Ok(Stat {
            inode_id: inode.id,
            ftype: inode.ftype,
            size: inode.size(),
        })
    }

    /// Records of the directory at `path`, in on-disk order.
    pub fn list(&self, path: &str) -> Result<Vec<DirEntry>> {
        let dir = resolve_dir(&*self.device, path)?;
        read_dir(&*self.device, &dir)
    }

    /// Raw content of the directory at `path`: packed 32-byte records.
    pub fn read_dir_raw(&self, path: &str) -> Result<Vec<u8>> {
        let dir = resolve_dir(&*self.device, path)?;
        read_all(&*self.device, &dir, usize::MAX)
    }

    pub fn usage(&self) -> Result<Usage> {
        Ok(Usage {
            free_inodes: count_free(&*self.device, BlockKind::Metadata)?,
            free_data_blocks: count_free(&*self.device, BlockKind::Data)?,
        })
    }

    pub fn check(&self) -> Result<CheckReport> {
        check(&*self.device)
    }

    pub fn dump(&self) -> String {
        let usage = match self.usage() {
            Ok(usage) => format!(
                "{} free inodes, {} free data blocks",
                usage.free_inodes, usage.free_data_blocks
            ),
            Err(e) => format!("usage unavailable: {}", e),
        };
        format!(
            "magic {}, {} blocks of {} bytes, {} inode slots, root inode {}; {}",
            self.superblock.magic,
            self.superblock.num_blocks,
            BLOCK_SIZE,
            self.superblock.num_inodes,
            ROOT_INODE_ID,
            usage
        )
    }

    pub fn flush(&self) -> Result<()> {
        self.device.flush()
    }

    pub fn root_inode_id(&self) -> u16 {
        ROOT_INODE_ID
    }

    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    pub fn device(&self) -> Arc<D> {
        Arc::clone(&self.device)
    }
}
