//! Directory entries, stat results and upload payloads

use crate::model::Cid;
use crate::Result;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of an MFS entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Numeric code used by `files/ls`
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(EntryKind::File),
            1 => Some(EntryKind::Directory),
            _ => None,
        }
    }

    /// Textual name used by `files/stat`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "file" => Some(EntryKind::File),
            "directory" => Some(EntryKind::Directory),
            _ => None,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

/// One child of a listed directory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    pub cid: Cid,
}

/// Result of `files/stat`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub cid: Cid,
    /// File size in bytes (0 for directories)
    pub size: u64,
    /// Size of the whole DAG below this entry
    pub cumulative_size: u64,
    pub blocks: u64,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Version information reported by the node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeVersion {
    pub version: String,
    #[serde(default)]
    pub commit: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub system: String,
}

/// Flags for `files/write`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Create the file if it does not exist
    pub create: bool,
    /// Create missing parent directories
    pub parents: bool,
    /// Drop existing content before writing
    pub truncate: bool,
}

impl WriteOptions {
    /// Options used by uploads: create everything, replace content
    pub fn upload() -> Self {
        WriteOptions {
            create: true,
            parents: true,
            truncate: true,
        }
    }
}

/// A named file to be written into a directory
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub name: String,
    pub content: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        UploadFile {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a local file, naming the upload after its file name
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| {
                crate::Error::InvalidName(format!("'{}' has no file name", path.display()))
            })?;
        let content = std::fs::read(path)?;
        Ok(UploadFile::new(name, content))
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_entry_kind_codes() {
        assert_eq!(EntryKind::from_code(0), Some(EntryKind::File));
        assert_eq!(EntryKind::from_code(1), Some(EntryKind::Directory));
        assert_eq!(EntryKind::from_code(7), None);
        assert_eq!(EntryKind::from_name("directory"), Some(EntryKind::Directory));
    }

    #[test]
    fn test_entry_serializes_type_field() {
        let entry = Entry {
            name: "a.txt".into(),
            kind: EntryKind::File,
            size: 3,
            cid: Cid::parse("QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn").unwrap(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["name"], "a.txt");
    }

    #[test]
    fn test_upload_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"remember the milk").unwrap();

        let upload = UploadFile::from_path(&path).unwrap();
        assert_eq!(upload.name, "notes.txt");
        assert_eq!(upload.size(), 17);
    }
}
