// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Image uploads attached to cards.
//!
//! Cards only keep image URLs. Where the bytes live is up to the
//! [`ImageStore`]; [`FsImageStore`] keeps them under a local directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};
use crate::store::StoreFuture;

/// Directory below the store root that holds uploads.
pub const UPLOADS_DIR: &str = "uploads";

/// Extension used when a file name has none.
pub const DEFAULT_EXTENSION: &str = "png";

const URL_SCHEME: &str = "file://";

/// Contract of the image store.
pub trait ImageStore: Send + Sync + 'static {
    /// Keeps `blob` and returns the URL it can be fetched from.
    fn store<'a>(&'a self, blob: Vec<u8>, extension: &'a str) -> StoreFuture<'a, String>;

    /// Deletes a previously stored image. Callers treat failure as best-effort.
    fn remove<'a>(&'a self, url: &'a str) -> StoreFuture<'a, ()>;
}

/// Lowercased extension of `file_name`, or [`DEFAULT_EXTENSION`].
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Upload file name: `{millis}_{hash6}.{ext}`.
///
/// The suffix is the first six hex digits of the content hash, so two
/// uploads in the same millisecond only collide when their bytes match.
pub fn upload_name(millis: i64, blob: &[u8], extension: &str) -> String {
    let digest = hex::encode(Sha256::digest(blob));
    format!("{millis}_{}.{extension}", &digest[..6])
}

/// Image store on the local filesystem, serving `file://` URLs.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsImageStore { root: root.into() }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    /// Maps a URL handed out by this store back to its file.
    fn path_for(&self, url: &str) -> Result<PathBuf> {
        let path = url
            .strip_prefix(URL_SCHEME)
            .map(PathBuf::from)
            .ok_or_else(|| Error::Upload(format!("not a file URL: {url}")))?;

        let uploads = self.uploads_dir();
        if path.parent() != Some(uploads.as_path()) {
            return Err(Error::Upload(format!("not managed by this store: {url}")));
        }
        Ok(path)
    }
}

impl ImageStore for FsImageStore {
    fn store<'a>(&'a self, blob: Vec<u8>, extension: &'a str) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let dir = self.uploads_dir();
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| Error::Upload(format!("{}: {e}", dir.display())))?;

            let name = upload_name(Utc::now().timestamp_millis(), &blob, extension);
            let path = dir.join(name);
            tokio::fs::write(&path, &blob)
                .await
                .map_err(|e| Error::Upload(format!("{}: {e}", path.display())))?;

            debug!(path = %path.display(), bytes = blob.len(), "image stored");
            Ok(format!("{URL_SCHEME}{}", path.display()))
        })
    }

    fn remove<'a>(&'a self, url: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let path = self.path_for(url)?;
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| Error::Upload(format!("{}: {e}", path.display())))?;
            debug!(path = %path.display(), "image removed");
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "images_tests.rs"]
mod tests;
