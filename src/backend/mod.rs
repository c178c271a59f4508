//! Pluggable MFS backends

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::MemoryBackend;

use crate::model::{Cid, Entry, MfsPath, NodeVersion, Stat, WriteOptions};
use crate::Result;
use bytes::Bytes;

/// The node primitives the explorer is built on
///
/// Implementations:
/// - [`HttpBackend`] talks to a Kubo node over its RPC API
/// - [`MemoryBackend`] keeps the whole tree in process, for tests
pub trait MfsBackend: Send + Sync {
    /// Probe the node
    fn version(&self) -> Result<NodeVersion>;

    /// List the children of a directory
    fn ls(&self, path: &MfsPath) -> Result<Vec<Entry>>;

    /// Create a directory
    fn mkdir(&self, path: &MfsPath, parents: bool) -> Result<()>;

    fn stat(&self, path: &MfsPath) -> Result<Stat>;

    /// Fetch the bytes of a file by CID
    fn cat(&self, cid: &Cid) -> Result<Bytes>;

    fn rm(&self, path: &MfsPath, recursive: bool) -> Result<()>;

    /// Copy an entry; `to` is the full destination path
    fn cp(&self, from: &MfsPath, to: &MfsPath) -> Result<()>;

    /// Move an entry; `to` is the full destination path
    fn mv(&self, from: &MfsPath, to: &MfsPath) -> Result<()>;

    fn write(&self, path: &MfsPath, content: Bytes, opts: WriteOptions) -> Result<()>;

    /// Backend identifier for logs
    fn name(&self) -> &str;
}
