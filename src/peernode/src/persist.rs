//! Artifact writes.
//!
//! Every file is written to `<path>.tmp` and renamed over `<path>`, so a
//! reader sees either the previous content or the new content in full. A
//! failed write leaves the previous file untouched.

use crate::error::{NodeError, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

const PUBLIC_MODE: u32 = 0o644;
const PRIVATE_MODE: u32 = 0o600;

pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| NodeError::io(path, e))
}

/// Replace `path` with `contents`
pub fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    write_with_mode(path, contents, PUBLIC_MODE)
}

/// Replace `path` with `contents`, readable by the owner only from the
/// moment the file is created
pub fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    write_with_mode(path, contents, PRIVATE_MODE)
}

/// Temporary sibling used while writing `path`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_with_mode(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let temp = temp_path(path);

    // A leftover from an interrupted run would keep its old mode
    match fs::remove_file(&temp) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(NodeError::io(&temp, e)),
    }

    if let Err(e) = write_new(&temp, contents, mode) {
        let _ = fs::remove_file(&temp);
        return Err(NodeError::io(&temp, e));
    }

    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(NodeError::io(path, e));
    }

    // Make the rename durable
    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

fn write_new(path: &Path, contents: &[u8], mode: u32) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(mode)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}
