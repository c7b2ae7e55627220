use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FsError {
    #[error("backing store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("block id is outside the volume or not releasable")]
    InvalidBlockId,
    #[error("superblock does not describe a valid volume")]
    InvalidSuperBlock,
    #[error("device holds {0} blocks, a volume needs exactly 4096")]
    InvalidDeviceSize(usize),
    #[error("{0} bytes do not fit in one block")]
    BlockOverflow(usize),
    #[error("no such file or directory")]
    NotFound,
    #[error("path component is not a directory")]
    NotADirectory,
    #[error("inode type does not match the requested operation")]
    TypeMismatch,
    #[error("a file with that name already exists")]
    NameCollision,
    #[error("directory is not empty")]
    NotEmpty,
    #[error("no free inode blocks left")]
    OutOfInodes,
    #[error("no free data blocks left")]
    OutOfDataBlocks,
    #[error("the root directory cannot be removed")]
    InvalidRoot,
    #[error("file name is empty, too long or contains '/' or NUL")]
    InvalidFileName,
    #[error("write would exceed the maximum file size")]
    FileTooLarge,
    #[error("inode id {0} does not fit in a directory record")]
    InodeIdOutOfRange(u16),
    #[error("inode {0} is corrupt")]
    CorruptInode(u16),
}

pub type Result<T> = core::result::Result<T, FsError>;
