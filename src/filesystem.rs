use std::io;
use std::path::Path;

use thiserror::Error;

use crate::display::Display;
use crate::logging;

#[derive(Error, Debug)]
#[error("Directory could not be created (Path: '{path})': {source}")]
pub struct DirectoryCreationError {
    path: String,
    source: std::io::Error,
}

pub async fn create_directory(dir_to_create: &Path) -> Result<(), DirectoryCreationError> {
    if !dir_to_create.exists() {
        let dir_display = dir_to_create.to_display();
        logging::debug!("Create directory: {}", &dir_display);
        tokio::fs::create_dir_all(dir_to_create)
            .await
            .map_err(|e| DirectoryCreationError {
                path: dir_display,
                source: e,
            })?;
    }
    Ok(())
}

#[derive(Error, Debug)]
pub enum FSDeleteError {
    #[error("delete file '{path}': {source}")]
    DeleteFileError {
        path: String,
        source: std::io::Error,
    },
}

/// Succeeds when the file does not exist.
pub async fn delete_file(file: &Path) -> Result<(), FSDeleteError> {
    logging::debug!("Delete file {}", file.to_display());
    match tokio::fs::remove_file(file).await {
        Ok(()) => Ok(()),
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => Ok(()),
            _ => Err(FSDeleteError::DeleteFileError {
                path: file.to_display(),
                source: e,
            }),
        },
    }
}
