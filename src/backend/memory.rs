//! In-process MFS backend

use super::MfsBackend;
use crate::model::{Cid, Codec, Entry, EntryKind, MfsPath, NodeVersion, Stat, WriteOptions};
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Chunk size used when reporting block counts for files
const CHUNK_SIZE: usize = 256 * 1024;

#[derive(Clone, Debug)]
enum Node {
    File(Bytes),
    Directory,
}

type Tree = BTreeMap<MfsPath, Node>;

/// An MFS tree kept entirely in memory
///
/// Follows the node's semantics closely enough to exercise the explorer
/// without a daemon. CIDs are CIDv1 over BLAKE3: raw codec for files,
/// dag-pb for directories (hashing the sorted `(name, cid)` children), so
/// identical content always yields identical CIDs.
pub struct MemoryBackend {
    tree: RwLock<Tree>,
}

impl MemoryBackend {
    /// Create a backend holding only the root directory
    pub fn new() -> Self {
        let mut tree = Tree::new();
        tree.insert(MfsPath::root(), Node::Directory);
        MemoryBackend {
            tree: RwLock::new(tree),
        }
    }

    /// Whether an entry exists at `path`
    pub fn exists(&self, path: &MfsPath) -> bool {
        self.tree.read().contains_key(path)
    }

    /// Content of the file at `path`, if it is a file
    pub fn read_file(&self, path: &MfsPath) -> Option<Bytes> {
        match self.tree.read().get(path) {
            Some(Node::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// Number of entries, root included
    pub fn len(&self) -> usize {
        self.tree.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Paths strictly below `dir`, in order
fn descendants<'a>(
    tree: &'a Tree,
    dir: &'a MfsPath,
) -> impl Iterator<Item = (&'a MfsPath, &'a Node)> {
    tree.range(dir.clone()..)
        .skip_while(move |(p, _)| *p == dir)
        .take_while(move |(p, _)| p.starts_with(dir))
}

fn children<'a>(
    tree: &'a Tree,
    dir: &'a MfsPath,
) -> impl Iterator<Item = (&'a MfsPath, &'a Node)> {
    let depth = dir.depth() + 1;
    descendants(tree, dir).filter(move |(p, _)| p.depth() == depth)
}

fn lookup<'a>(tree: &'a Tree, path: &MfsPath) -> Result<&'a Node> {
    tree.get(path)
        .ok_or_else(|| Error::NotFound(path.to_string()))
}

fn cid_of(tree: &Tree, path: &MfsPath, node: &Node) -> Cid {
    match node {
        Node::File(content) => Cid::from_blake3(Codec::Raw, blake3::hash(content).as_bytes()),
        Node::Directory => {
            let mut hasher = blake3::Hasher::new();
            for (child, child_node) in children(tree, path) {
                hasher.update(child.file_name().unwrap_or_default().as_bytes());
                hasher.update(&[0]);
                hasher.update(cid_of(tree, child, child_node).as_str().as_bytes());
                hasher.update(&[0]);
            }
            Cid::from_blake3(Codec::DagPb, hasher.finalize().as_bytes())
        }
    }
}

fn cumulative_size(tree: &Tree, path: &MfsPath, node: &Node) -> u64 {
    match node {
        Node::File(content) => content.len() as u64,
        Node::Directory => children(tree, path)
            .map(|(child, child_node)| cumulative_size(tree, child, child_node))
            .sum(),
    }
}

fn entry_for(tree: &Tree, path: &MfsPath, node: &Node) -> Entry {
    let (kind, size) = match node {
        Node::File(content) => (EntryKind::File, content.len() as u64),
        Node::Directory => (EntryKind::Directory, 0),
    };
    Entry {
        name: path.file_name().unwrap_or("/").to_string(),
        kind,
        size,
        cid: cid_of(tree, path, node),
    }
}

/// Ensure the parent of `path` is an existing directory, creating it when allowed
fn ensure_parent(tree: &mut Tree, path: &MfsPath, parents: bool) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    let is_dir = tree.get(&parent).map(|n| matches!(n, Node::Directory));
    match is_dir {
        Some(true) => Ok(()),
        Some(false) => Err(Error::NotADirectory(parent.to_string())),
        None if parents => {
            ensure_parent(tree, &parent, true)?;
            tree.insert(parent, Node::Directory);
            Ok(())
        }
        None => Err(Error::NotFound(parent.to_string())),
    }
}

/// Validate a copy/move and return the subtree to transplant
fn subtree_for_transfer(
    tree: &Tree,
    from: &MfsPath,
    to: &MfsPath,
) -> Result<Vec<(MfsPath, Node)>> {
    if from.is_root() {
        return Err(Error::InvalidPath("cannot copy or move the root".into()));
    }
    if to.starts_with(from) {
        return Err(Error::InvalidPath(format!(
            "cannot place {} inside itself at {}",
            from, to
        )));
    }
    let node = lookup(tree, from)?;
    if tree.contains_key(to) {
        return Err(Error::AlreadyExists(to.to_string()));
    }

    let mut entries = vec![(from.clone(), node.clone())];
    entries.extend(descendants(tree, from).map(|(p, n)| (p.clone(), n.clone())));
    Ok(entries)
}

fn transplant(tree: &mut Tree, entries: Vec<(MfsPath, Node)>, from: &MfsPath, to: &MfsPath) {
    for (path, node) in entries {
        if let Some(target) = path.rebase(from, to) {
            tree.insert(target, node);
        }
    }
}

impl MfsBackend for MemoryBackend {
    fn version(&self) -> Result<NodeVersion> {
        Ok(NodeVersion {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: String::new(),
            repo: "memory".to_string(),
            system: "in-process".to_string(),
        })
    }

    fn ls(&self, path: &MfsPath) -> Result<Vec<Entry>> {
        let tree = self.tree.read();
        let node = lookup(&tree, path)?;
        match node {
            Node::File(_) => Ok(vec![entry_for(&tree, path, node)]),
            Node::Directory => Ok(children(&tree, path)
                .map(|(child, child_node)| entry_for(&tree, child, child_node))
                .collect()),
        }
    }

    fn mkdir(&self, path: &MfsPath, parents: bool) -> Result<()> {
        let mut tree = self.tree.write();
        match tree.get(path).cloned() {
            Some(Node::Directory) if parents => return Ok(()),
            Some(_) => return Err(Error::AlreadyExists(path.to_string())),
            None => {}
        }
        ensure_parent(&mut tree, path, parents)?;
        tree.insert(path.clone(), Node::Directory);
        Ok(())
    }

    fn stat(&self, path: &MfsPath) -> Result<Stat> {
        let tree = self.tree.read();
        let node = lookup(&tree, path)?;
        let (kind, size, blocks) = match node {
            Node::File(content) => {
                let chunks = content.len().div_ceil(CHUNK_SIZE);
                let blocks = if chunks > 1 { chunks } else { 0 };
                (EntryKind::File, content.len() as u64, blocks as u64)
            }
            Node::Directory => (
                EntryKind::Directory,
                0,
                children(&tree, path).count() as u64,
            ),
        };
        Ok(Stat {
            cid: cid_of(&tree, path, node),
            size,
            cumulative_size: cumulative_size(&tree, path, node),
            blocks,
            kind,
        })
    }

    fn cat(&self, cid: &Cid) -> Result<Bytes> {
        let tree = self.tree.read();
        for (path, node) in tree.iter() {
            if cid_of(&tree, path, node) != *cid {
                continue;
            }
            return match node {
                Node::File(content) => Ok(content.clone()),
                Node::Directory => Err(Error::IsADirectory(cid.to_string())),
            };
        }
        Err(Error::NotFound(cid.to_string()))
    }

    fn rm(&self, path: &MfsPath, recursive: bool) -> Result<()> {
        if path.is_root() {
            return Err(Error::InvalidPath("cannot remove the root".into()));
        }
        let mut tree = self.tree.write();
        let is_dir = matches!(lookup(&tree, path)?, Node::Directory);

        if is_dir {
            let below: Vec<MfsPath> = descendants(&tree, path).map(|(p, _)| p.clone()).collect();
            if !below.is_empty() && !recursive {
                return Err(Error::DirectoryNotEmpty(path.to_string()));
            }
            for p in below {
                tree.remove(&p);
            }
        }
        tree.remove(path);
        Ok(())
    }

    fn cp(&self, from: &MfsPath, to: &MfsPath) -> Result<()> {
        let mut tree = self.tree.write();
        let entries = subtree_for_transfer(&tree, from, to)?;
        ensure_parent(&mut tree, to, false)?;
        transplant(&mut tree, entries, from, to);
        Ok(())
    }

    fn mv(&self, from: &MfsPath, to: &MfsPath) -> Result<()> {
        let mut tree = self.tree.write();
        let entries = subtree_for_transfer(&tree, from, to)?;
        ensure_parent(&mut tree, to, false)?;
        for (path, _) in &entries {
            tree.remove(path);
        }
        transplant(&mut tree, entries, from, to);
        Ok(())
    }

    fn write(&self, path: &MfsPath, content: Bytes, opts: WriteOptions) -> Result<()> {
        let mut tree = self.tree.write();
        let merged = match tree.get(path).cloned() {
            Some(Node::Directory) => return Err(Error::IsADirectory(path.to_string())),
            Some(Node::File(old)) if !opts.truncate && old.len() > content.len() => {
                let mut buf = BytesMut::with_capacity(old.len());
                buf.extend_from_slice(&content);
                buf.extend_from_slice(&old[content.len()..]);
                buf.freeze()
            }
            Some(Node::File(_)) => content,
            None if !opts.create => return Err(Error::NotFound(path.to_string())),
            None => {
                ensure_parent(&mut tree, path, opts.parents)?;
                content
            }
        };
        tree.insert(path.clone(), Node::File(merged));
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
