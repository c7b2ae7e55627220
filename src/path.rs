//! Path resolution.

use log::trace;

use crate::config::ROOT_INODE_ID;
use crate::directory::dir_lookup;
use crate::error::{FsError, Result};
use crate::inode::get_inode;
use crate::{BlockDevice, Inode};

/// Resolves a slash-delimited path, relative to the root, to an inode id.
/// Empty components are skipped, so "", "/" and "//" all name the root.
pub fn resolve(device: &impl BlockDevice, path: &str) -> Result<u16> {
    let mut current_id = ROOT_INODE_ID;
    for component in path.split('/').filter(|s| !s.is_empty()) {
        let current = get_inode(device, current_id)?;
        if !current.is_dir() {
            return Err(FsError::NotADirectory);
        }
        current_id = dir_lookup(device, &current, component.as_bytes())?;
        trace!("resolve {:?}: {} -> {}", path, component, current_id);
    }
    Ok(current_id)
}

/// Resolves `path` and loads it, requiring a directory.
pub fn resolve_dir(device: &impl BlockDevice, path: &str) -> Result<Inode> {
    let inode = get_inode(device, resolve(device, path)?)?;
    if !inode.is_dir() {
        return Err(FsError::NotADirectory);
    }
    Ok(inode)
}
