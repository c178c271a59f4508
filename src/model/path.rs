//! Normalized absolute paths inside the Mutable File System

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An absolute MFS path, stored as its components
///
/// `"/"` is the root and has no components. Parsing drops empty and `.`
/// components and rejects `..`, so two paths naming the same entry always
/// compare equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MfsPath {
    components: Vec<String>,
}

impl MfsPath {
    /// The root directory
    pub fn root() -> Self {
        MfsPath::default()
    }

    /// Parse and normalize an absolute path
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.starts_with('/') {
            return Err(Error::InvalidPath(format!(
                "'{}' is not absolute (must start with '/')",
                raw
            )));
        }

        let mut components = Vec::new();
        for part in raw.split('/') {
            match part {
                "" | "." => continue,
                ".." => {
                    return Err(Error::InvalidPath(format!(
                        "'{}' contains a '..' component",
                        raw
                    )))
                }
                name => components.push(name.to_string()),
            }
        }

        Ok(MfsPath { components })
    }

    /// Append a single entry name
    pub fn join(&self, name: &str) -> Result<Self> {
        validate_name(name)?;
        let mut components = self.components.clone();
        components.push(name.to_string());
        Ok(MfsPath { components })
    }

    /// The containing directory, `None` for the root
    pub fn parent(&self) -> Option<MfsPath> {
        if self.is_root() {
            return None;
        }
        Some(MfsPath {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    /// The last component, `None` for the root
    pub fn file_name(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Component-wise prefix test (`/a/b` starts with `/a`, `/ab` does not)
    pub fn starts_with(&self, other: &MfsPath) -> bool {
        self.components.starts_with(&other.components)
    }

    /// Re-root a path lying below `from` under `to`
    pub fn rebase(&self, from: &MfsPath, to: &MfsPath) -> Option<MfsPath> {
        if !self.starts_with(from) {
            return None;
        }
        let mut components = to.components.clone();
        components.extend_from_slice(&self.components[from.components.len()..]);
        Some(MfsPath { components })
    }

    /// Number of components below the root
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }
}

/// Check that `name` is usable as a single directory entry
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName("name is empty".into()));
    }
    if name == "." || name == ".." {
        return Err(Error::InvalidName(format!("'{}' is reserved", name)));
    }
    if name.contains('/') {
        return Err(Error::InvalidName(format!(
            "'{}' must not contain '/'",
            name
        )));
    }
    Ok(())
}

impl fmt::Display for MfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl fmt::Debug for MfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MfsPath({})", self)
    }
}

impl FromStr for MfsPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MfsPath::parse(s)
    }
}

impl Serialize for MfsPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MfsPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        MfsPath::parse(&raw).map_err(serde::de::Error::custom)
    }
}
