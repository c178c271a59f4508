//! Value types exchanged with the node

mod cid;
mod entry;
mod path;

pub use cid::{Cid, Codec};
pub use entry::{Entry, EntryKind, NodeVersion, Stat, UploadFile, WriteOptions};
pub use path::{validate_name, MfsPath};
