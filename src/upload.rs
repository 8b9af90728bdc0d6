//! Upload collaborator used by the uplink node
//!
//! The cloud store accepts JSON documents and binary blobs keyed by path.
//! [`FileUploadSink`] mirrors that layout on the local filesystem.

use crate::error::{Result, TelemetryError};
use log::info;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub trait UploadSink {
    fn put_json(&mut self, path: &str, document: &serde_json::Value) -> Result<()>;
    fn put_bytes(&mut self, path: &str, bytes: &[u8], content_type: &str) -> Result<()>;
}

impl<U: UploadSink + ?Sized> UploadSink for &mut U {
    fn put_json(&mut self, path: &str, document: &serde_json::Value) -> Result<()> {
        (**self).put_json(path, document)
    }

    fn put_bytes(&mut self, path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        (**self).put_bytes(path, bytes, content_type)
    }
}

/// One upload captured by [`MemoryUploadSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum Upload {
    Json {
        path: String,
        document: serde_json::Value,
    },
    Bytes {
        path: String,
        len: usize,
        content_type: String,
    },
}

impl Upload {
    pub fn path(&self) -> &str {
        match self {
            Upload::Json { path, .. } | Upload::Bytes { path, .. } => path,
        }
    }
}

/// Keeps every upload in memory, in order
#[derive(Debug, Default)]
pub struct MemoryUploadSink {
    pub uploads: Vec<Upload>,
}

impl MemoryUploadSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Upload> + 'a {
        self.uploads.iter().filter(move |u| u.path().starts_with(prefix))
    }
}

impl UploadSink for MemoryUploadSink {
    fn put_json(&mut self, path: &str, document: &serde_json::Value) -> Result<()> {
        self.uploads.push(Upload::Json {
            path: path.to_string(),
            document: document.clone(),
        });
        Ok(())
    }

    fn put_bytes(&mut self, path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        self.uploads.push(Upload::Bytes {
            path: path.to_string(),
            len: bytes.len(),
            content_type: content_type.to_string(),
        });
        Ok(())
    }
}

/// Mirrors uploads under a local directory
///
/// JSON documents sent to `/a/b` are appended as one line to `<root>/a/b.jsonl`;
/// byte payloads are written verbatim to `<root>/<path>`.
#[derive(Debug, Clone)]
pub struct FileUploadSink {
    root: PathBuf,
    documents: usize,
    blobs: usize,
}

impl FileUploadSink {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            documents: 0,
            blobs: 0,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn blobs(&self) -> usize {
        self.blobs
    }

    /// Map an upload path onto the mirror, refusing anything that escapes it
    fn local_path(&self, upload_path: &str) -> Result<PathBuf> {
        let mut local = self.root.clone();
        for component in upload_path.split('/').filter(|c| !c.is_empty()) {
            if component == "." || component == ".." || component.contains('\\') {
                return Err(TelemetryError::Upload(format!(
                    "refusing upload path '{}'",
                    upload_path
                )));
            }
            local.push(component);
        }
        if local == self.root {
            return Err(TelemetryError::Upload("empty upload path".to_string()));
        }
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(local)
    }
}

impl UploadSink for FileUploadSink {
    fn put_json(&mut self, path: &str, document: &serde_json::Value) -> Result<()> {
        let mut local = self.local_path(path)?;
        local.set_extension("jsonl");

        let mut file = OpenOptions::new().create(true).append(true).open(&local)?;
        writeln!(file, "{}", serde_json::to_string(document)?)?;
        self.documents += 1;
        info!("Uploaded to {}", path);
        Ok(())
    }

    fn put_bytes(&mut self, path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let local = self.local_path(path)?;
        fs::write(&local, bytes)?;
        self.blobs += 1;
        info!("Uploaded {} bytes ({}) to {}", bytes.len(), content_type, path);
        Ok(())
    }
}
