mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use llfs::*;

fn disk_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("llfs-{}-{}.img", name, std::process::id()))
}

#[test]
fn disk_format_and_layout() {
    let path = disk_path("layout");
    let disk = FileDisk::create(&path).unwrap();
    let mut vol = Volume::init(Arc::new(disk)).unwrap();
    vol.mkdir("var", "/").unwrap();
    vol.flush().unwrap();
    log!("File System initialized: {}", vol.dump());

    let image = fs::read(&path).unwrap();
    assert_eq!(image.len(), NUM_BLOCKS * BLOCK_SIZE);
    // Superblock
    assert_eq!(&image[0..4], &2019i32.to_le_bytes());
    assert_eq!(&image[4..8], &4096i32.to_le_bytes());
    assert_eq!(&image[8..12], &126i32.to_le_bytes());
    // Bitmap: blocks 0..=3 taken (superblock, bitmap, root, var), data blocks 128 and 129 taken.
    let bitmap = &image[BLOCK_SIZE..2 * BLOCK_SIZE];
    assert_eq!(bitmap[0], 0x0F);
    assert_eq!(bitmap[16], 0x3F);
    // Root inode: one record, type directory, first pointer at block 128.
    let root = &image[2 * BLOCK_SIZE..3 * BLOCK_SIZE];
    assert_eq!(&root[0..4], &32i32.to_le_bytes());
    assert_eq!(&root[4..8], &0i32.to_le_bytes());
    assert_eq!(&root[8..10], &128u16.to_le_bytes());
    // Root content: the record for "var" (inode 3).
    let record = &image[128 * BLOCK_SIZE..128 * BLOCK_SIZE + DIR_ENTRY_SIZE];
    assert_eq!(record[0], 3);
    assert_eq!(&record[1..5], b"var\0");

    fs::remove_file(&path).unwrap();
}

#[test]
fn disk_survives_reopen() {
    let path = disk_path("reopen");
    let payload: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
    {
        let mut vol = Volume::init(Arc::new(FileDisk::create(&path).unwrap())).unwrap();
        vol.mkdir("var", "/").unwrap();
        vol.touch("a.bin", "/var").unwrap();
        vol.write("a.bin", "/var", &payload).unwrap();
        vol.flush().unwrap();
    }

    let mut vol = Volume::mount(Arc::new(FileDisk::open(&path).unwrap())).unwrap();
    assert_eq!(vol.size_of("a.bin", "/var").unwrap(), payload.len());
    assert_eq!(vol.read("a.bin", "/var", usize::MAX).unwrap(), payload);
    vol.rm("a.bin", "/var").unwrap();
    vol.rmdir("var", "/").unwrap();
    assert!(vol.check().unwrap().is_clean());

    fs::remove_file(&path).unwrap();
}

#[test]
fn disk_rejects_bad_images() {
    let path = disk_path("bad");
    fs::write(&path, vec![0u8; 1000]).unwrap();
    assert!(matches!(FileDisk::open(&path), Err(Error::InvalidDeviceSize(1))));

    // Right size, never initialized.
    let disk = FileDisk::create(&path).unwrap();
    assert!(matches!(Volume::mount(Arc::new(disk)), Err(Error::InvalidSuperBlock)));

    fs::remove_file(&path).unwrap();
    assert!(matches!(FileDisk::open(&path), Err(Error::Io(_))));
}
