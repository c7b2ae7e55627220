//! Common utilities for tests
#![allow(dead_code)]

use std::sync::Arc;

use llfs::{RamDisk, Volume};

pub const ORANGE: &str = "\x1b[38;5;214m";
pub const RESET: &str = "\x1b[0m";

/// Provides a macro for logging messages during tests.
/// e.g. log!("placeholder") -> println!("[test] placeholder");
#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => {
        println!("{}[test] {}{}", crate::common::ORANGE, format!($($arg)*), crate::common::RESET)
    };
}

pub fn fresh_volume() -> Volume<RamDisk> {
    Volume::init(Arc::new(RamDisk::default())).unwrap()
}

/// Names of a directory listing, the way a shell would print them.
pub fn names(vol: &Volume<RamDisk>, path: &str) -> Vec<String> {
    vol.list(path).unwrap().iter().map(|entry| entry.name_lossy()).collect()
}
