use std::path::{Component, Path};

use taskpilot_protocol::constants::{ALLOWED_MIME_TYPES, MAX_FILE_SIZE};

use crate::TransferError;

/// Checks a candidate file against the size limit and the MIME allow-list.
///
/// Pure: no I/O, no network. The size check runs first, so an oversized file
/// with a disallowed type reports the size problem.
pub fn validate_file(size: u64, mime_type: &str) -> Result<(), TransferError> {
    if size > MAX_FILE_SIZE {
        return Err(TransferError::InvalidFile(format!(
            "File size exceeds {}MB limit",
            MAX_FILE_SIZE / 1024 / 1024
        )));
    }

    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        return Err(TransferError::InvalidFile(
            "File type not allowed. Please upload PDF, DOC, DOCX, TXT, or images.".into(),
        ));
    }

    Ok(())
}

/// Validates that a stored file's display name is safe to save under a
/// download directory.
///
/// Rejects:
/// - Empty names
/// - Absolute paths (Unix `/` or Windows `C:\`)
/// - Parent directory traversal (`..`)
/// - Anything with more than one path component (`sub/file.txt`)
pub fn validate_download_name(name: &str) -> Result<(), TransferError> {
    if name.is_empty() {
        return Err(TransferError::InvalidPath("empty file name".into()));
    }

    let path = Path::new(name);

    if path.is_absolute() {
        return Err(TransferError::InvalidPath(format!(
            "absolute path not allowed: {name}"
        )));
    }

    let mut normal = 0;
    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(TransferError::InvalidPath(format!(
                    "parent directory traversal not allowed: {name}"
                )));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(TransferError::InvalidPath(format!(
                    "absolute path not allowed: {name}"
                )));
            }
            Component::CurDir => {}
            Component::Normal(_) => normal += 1,
        }
    }

    if normal != 1 {
        return Err(TransferError::InvalidPath(format!(
            "file name must not contain directories: {name}"
        )));
    }

    Ok(())
}
