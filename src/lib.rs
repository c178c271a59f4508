//! # mfs_explorer
//!
//! A file-manager API over an IPFS node's Mutable File System.
//!
//! mfs_explorer exposes the operations a file browser needs (list,
//! mkdir, read, remove, copy, move, rename, upload) on top of the node's
//! path-addressed view of content-addressed data, returning every result
//! in one uniform response envelope.
//!
//! ## Core Concepts
//!
//! - **Explorer**: The operation surface, taking plain string paths
//! - **Backends**: Kubo RPC over HTTP, or an in-memory tree for tests
//! - **Response**: `{ok, isJson, isAttachment, json | blob}` envelope
//! - **Batches**: Multi-entry operations fanned out over a bounded pool
//!
//! ## Example
//!
//! ```ignore
//! use mfs_explorer::{ClientConfig, Explorer};
//!
//! let explorer = Explorer::start(&ClientConfig::resolve(None)?)?;
//! explorer.create_directory("/", "photos")?;
//! let listing = explorer.list("/")?;
//! ```

pub mod backend;
pub mod config;
pub mod fanout;
pub mod logging;
pub mod model;

mod error;
mod explorer;
mod response;

pub use backend::{HttpBackend, MemoryBackend, MfsBackend};
pub use config::{ClientConfig, DEFAULT_API_URL};
pub use error::{BatchFailure, Error, Result};
pub use explorer::Explorer;
pub use model::{Cid, Entry, EntryKind, MfsPath, NodeVersion, Stat, UploadFile, WriteOptions};
pub use response::{Attachment, Listing, Response};
