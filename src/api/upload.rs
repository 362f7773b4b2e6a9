use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::ApiError;

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
}

/// Reads the first file part named [`FILE_FIELD`]. Parts without a filename
/// are plain form values and are skipped.
pub async fn read_file_field(multipart: &mut Multipart) -> Result<Option<Upload>, ApiError> {
    let mut seen = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);

        match filename {
            Some(filename) if name == FILE_FIELD => {
                let data = field.bytes().await?;
                return Ok(Some(Upload { filename, data }));
            }
            _ => seen.push(name),
        }
    }

    tracing::warn!("No '{}' part in upload, fields present: {:?}", FILE_FIELD, seen);
    Ok(None)
}

/// Checks filename, extension and content. Returns the lower-cased extension.
pub fn validate_upload(upload: &Upload, allowed_extensions: &[String]) -> Result<String, ApiError> {
    if upload.filename.is_empty() {
        return Err(ApiError::Validation("Empty filename".to_string()));
    }

    let extension = upload
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    if !allowed_extensions.iter().any(|allowed| *allowed == extension) {
        return Err(ApiError::Validation(format!(
            "File type not allowed. Allowed: {}",
            allowed_extensions.join(", ")
        )));
    }

    if upload.data.is_empty() {
        return Err(ApiError::Validation("Uploaded file is empty".to_string()));
    }

    Ok(extension)
}

/// Uniquely named on-disk copy of an upload, removed when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub async fn create(dir: &Path, extension: &str, data: &[u8]) -> Result<Self, ApiError> {
        tokio::fs::create_dir_all(dir).await?;

        // The guard exists before the write so a partial file is removed too.
        let scratch = Self {
            path: dir.join(format!("{}.{}", Uuid::new_v4(), extension)),
        };
        tokio::fs::write(&scratch.path, data).await?;
        tracing::debug!("Saved upload to {}", scratch.path.display());

        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove scratch file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
