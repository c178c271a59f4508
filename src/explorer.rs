//! High-level file-manager API
//!
//! This module provides the main entry point: every operation takes
//! plain string paths, forwards to the backend and wraps the result in a
//! [`Response`] envelope.

use crate::backend::MfsBackend;
use crate::fanout::Fanout;
use crate::model::{validate_name, MfsPath, NodeVersion, Stat, UploadFile, WriteOptions};
use crate::response::Response;
use crate::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;

#[cfg(feature = "http")]
use crate::backend::HttpBackend;
#[cfg(feature = "http")]
use crate::config::ClientConfig;

/// The file-manager interface over an MFS backend
///
/// Provides:
/// - Listing, creating and reading entries
/// - Batch remove/copy/move/upload fanned out in parallel
/// - Rename of a single entry
pub struct Explorer {
    backend: Arc<dyn MfsBackend>,
    fanout: Fanout,
}

impl Explorer {
    /// Connect to the node described by `config`
    ///
    /// Probes the node once, so an `Explorer` always has a live client.
    #[cfg(feature = "http")]
    pub fn start(config: &ClientConfig) -> Result<Self> {
        let backend = HttpBackend::new(config.clone())?;
        let version = backend.version()?;
        tracing::info!(
            api_url = %config.api_url,
            version = %version.version,
            "connected to node"
        );
        Self::with_backend(backend, config.max_parallel)
    }

    /// Build on an arbitrary backend
    pub fn with_backend(backend: impl MfsBackend + 'static, max_parallel: usize) -> Result<Self> {
        Self::with_shared_backend(Arc::new(backend), max_parallel)
    }

    /// Build on a backend that is also held elsewhere
    pub fn with_shared_backend(backend: Arc<dyn MfsBackend>, max_parallel: usize) -> Result<Self> {
        Ok(Explorer {
            backend,
            fanout: Fanout::new(max_parallel)?,
        })
    }

    pub fn backend(&self) -> &dyn MfsBackend {
        self.backend.as_ref()
    }

    pub fn version(&self) -> Result<NodeVersion> {
        self.backend.version()
    }

    pub fn stat(&self, path: &str) -> Result<Stat> {
        self.backend.stat(&MfsPath::parse(path)?)
    }

    /// List the entries of a directory
    pub fn list(&self, path: &str) -> Result<Response> {
        let path = MfsPath::parse(path)?;
        let entries = self.backend.ls(&path)?;
        tracing::debug!(%path, count = entries.len(), "listed directory");
        Ok(Response::listing(entries))
    }

    /// Create `directory` inside `path`; the parent must already exist
    pub fn create_directory(&self, path: &str, directory: &str) -> Result<Response> {
        let target = MfsPath::parse(path)?.join(directory)?;
        self.backend.mkdir(&target, false)?;
        tracing::info!(path = %target, "created directory");
        Ok(Response::empty())
    }

    /// Download a file as an attachment
    pub fn get_file_content(&self, path: &str) -> Result<Response> {
        let path = MfsPath::parse(path)?;
        let stat = self.backend.stat(&path)?;
        if stat.kind.is_dir() {
            return Err(Error::IsADirectory(path.to_string()));
        }

        let content = self.backend.cat(&stat.cid)?;
        let name = path.file_name().unwrap_or_default().to_string();
        tracing::debug!(%path, cid = %stat.cid, size = content.len(), "read file");
        Ok(Response::attachment(name, content))
    }

    /// Remove `filenames` from the directory `path`
    pub fn remove(&self, path: &str, filenames: &[String], recursive: bool) -> Result<Response> {
        let dir = MfsPath::parse(path)?;
        validate_batch(filenames)?;
        if filenames.is_empty() {
            return Ok(Response::empty());
        }

        let backend = &self.backend;
        self.fanout
            .run(filenames, |name| backend.rm(&dir.join(name)?, recursive))
            .into_result("remove")?;

        tracing::info!(path = %dir, count = filenames.len(), recursive, "removed entries");
        Ok(Response::empty())
    }

    /// Copy `filenames` from `path` into the directory `destination`
    pub fn copy(&self, path: &str, destination: &str, filenames: &[String]) -> Result<Response> {
        let (src, dst) = self.transfer_dirs(path, destination, filenames)?;
        if filenames.is_empty() {
            return Ok(Response::empty());
        }

        self.copy_entries(&src, &dst, filenames).into_result("copy")?;

        tracing::info!(from = %src, to = %dst, count = filenames.len(), "copied entries");
        Ok(Response::empty())
    }

    /// Move `filenames` from `path` into the directory `destination`
    ///
    /// Copies every entry first. If any copy fails, the copies that did
    /// succeed are removed again and the sources are left untouched. Sources
    /// are only removed once every copy exists; if some removals then fail
    /// those entries remain in both directories.
    pub fn move_files(
        &self,
        path: &str,
        destination: &str,
        filenames: &[String],
    ) -> Result<Response> {
        let (src, dst) = self.transfer_dirs(path, destination, filenames)?;
        if filenames.is_empty() {
            return Ok(Response::empty());
        }

        let copied = self.copy_entries(&src, &dst, filenames);
        if !copied.is_success() {
            self.roll_back_copies(&dst, &copied.succeeded);
            return Err(copied.into_error("move"));
        }

        let backend = &self.backend;
        self.fanout
            .run(filenames, |name| backend.rm(&src.join(name)?, true))
            .into_result("move")?;

        tracing::info!(from = %src, to = %dst, count = filenames.len(), "moved entries");
        Ok(Response::empty())
    }

    /// Rename the entry at `path` to `new_name` within its directory
    ///
    /// The node's `files/mv` replaces an existing file and moves into an
    /// existing directory, so a taken name is refused before moving.
    pub fn rename(&self, path: &str, new_name: &str) -> Result<Response> {
        let from = MfsPath::parse(path)?;
        let parent = from
            .parent()
            .ok_or_else(|| Error::InvalidPath("cannot rename the root".into()))?;
        let to = parent.join(new_name)?;

        self.backend.stat(&from)?;
        if to == from {
            return Ok(Response::empty());
        }
        match self.backend.stat(&to) {
            Ok(_) => return Err(Error::AlreadyExists(to.to_string())),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        self.backend.mv(&from, &to)?;
        tracing::info!(from = %from, to = %to, "renamed entry");
        Ok(Response::empty())
    }

    /// Write `files` into the directory `path`, creating it when missing
    pub fn upload(&self, path: &str, files: &[UploadFile]) -> Result<Response> {
        let dir = MfsPath::parse(path)?;
        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        validate_batch(&names)?;
        if files.is_empty() {
            return Ok(Response::empty());
        }

        let backend = &self.backend;
        self.fanout
            .run(&names, |name| {
                let file = files
                    .iter()
                    .find(|f| f.name == name)
                    .ok_or_else(|| Error::NotFound(name.to_string()))?;
                backend.write(&dir.join(name)?, file.content.clone(), WriteOptions::upload())
            })
            .into_result("upload")?;

        let bytes: usize = files.iter().map(UploadFile::size).sum();
        tracing::info!(path = %dir, count = files.len(), bytes, "uploaded files");
        Ok(Response::empty())
    }

    /// Parse the directories of a copy/move and reject self-nesting
    fn transfer_dirs(
        &self,
        path: &str,
        destination: &str,
        filenames: &[String],
    ) -> Result<(MfsPath, MfsPath)> {
        let src = MfsPath::parse(path)?;
        let dst = MfsPath::parse(destination)?;
        validate_batch(filenames)?;

        for name in filenames {
            let entry = src.join(name)?;
            if dst.starts_with(&entry) {
                return Err(Error::InvalidPath(format!(
                    "cannot place {} inside itself at {}",
                    entry, dst
                )));
            }
        }
        Ok((src, dst))
    }

    fn copy_entries(
        &self,
        src: &MfsPath,
        dst: &MfsPath,
        filenames: &[String],
    ) -> crate::fanout::BatchOutcome {
        let backend = &self.backend;
        self.fanout
            .run(filenames, |name| backend.cp(&src.join(name)?, &dst.join(name)?))
    }

    fn roll_back_copies(&self, dst: &MfsPath, copied: &[String]) {
        if copied.is_empty() {
            return;
        }
        let backend = &self.backend;
        let outcome = self
            .fanout
            .run(copied, |name| backend.rm(&dst.join(name)?, true));
        for failure in &outcome.failed {
            tracing::warn!(
                path = %dst,
                name = %failure.name,
                error = %failure.message,
                "failed to roll back copy"
            );
        }
    }
}

/// Reject invalid or repeated entry names before any call is made
fn validate_batch(names: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        validate_name(name)?;
        if !seen.insert(name.as_str()) {
            return Err(Error::InvalidName(format!("'{}' is listed twice", name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::model::{Cid, Entry, EntryKind};
    use bytes::Bytes;

    fn p(s: &str) -> MfsPath {
        MfsPath::parse(s).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn setup() -> (Arc<MemoryBackend>, Explorer) {
        let backend = Arc::new(MemoryBackend::new());
        let explorer = Explorer::with_shared_backend(backend.clone(), 4).unwrap();
        (backend, explorer)
    }

    fn put(backend: &MemoryBackend, path: &str, content: &'static [u8]) {
        backend
            .write(&p(path), Bytes::from_static(content), WriteOptions::upload())
            .unwrap();
    }

    /// Delegates to a memory backend but fails chosen copies or removals
    struct Faulty {
        inner: Arc<MemoryBackend>,
        refuse_cp: Option<MfsPath>,
        refuse_rm: Option<MfsPath>,
    }

    impl Faulty {
        fn injected() -> Error {
            Error::Api {
                status: 500,
                message: "injected failure".into(),
            }
        }
    }

    impl MfsBackend for Faulty {
        fn version(&self) -> Result<NodeVersion> {
            self.inner.version()
        }
        fn ls(&self, path: &MfsPath) -> Result<Vec<Entry>> {
            self.inner.ls(path)
        }
        fn mkdir(&self, path: &MfsPath, parents: bool) -> Result<()> {
            self.inner.mkdir(path, parents)
        }
        fn stat(&self, path: &MfsPath) -> Result<Stat> {
            self.inner.stat(path)
        }
        fn cat(&self, cid: &Cid) -> Result<Bytes> {
            self.inner.cat(cid)
        }
        fn rm(&self, path: &MfsPath, recursive: bool) -> Result<()> {
            if self.refuse_rm.as_ref() == Some(path) {
                return Err(Self::injected());
            }
            self.inner.rm(path, recursive)
        }
        fn cp(&self, from: &MfsPath, to: &MfsPath) -> Result<()> {
            if self.refuse_cp.as_ref() == Some(to) {
                return Err(Self::injected());
            }
            self.inner.cp(from, to)
        }
        fn mv(&self, from: &MfsPath, to: &MfsPath) -> Result<()> {
            self.inner.mv(from, to)
        }
        fn write(&self, path: &MfsPath, content: Bytes, opts: WriteOptions) -> Result<()> {
            self.inner.write(path, content, opts)
        }
        fn name(&self) -> &str {
            "faulty"
        }
    }

    #[test]
    fn test_list_returns_json_envelope() {
        let (backend, explorer) = setup();
        put(&backend, "/docs/a.txt", b"a");
        backend.mkdir(&p("/docs/sub"), false).unwrap();

        let response = explorer.list("/docs").unwrap();
        assert!(response.ok);
        assert!(response.is_json);
        assert!(!response.is_attachment);

        let listing = response.json.as_ref().unwrap();
        assert!(listing.success);
        let kinds: Vec<_> = listing.data.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            kinds,
            vec![("a.txt", EntryKind::File), ("sub", EntryKind::Directory)]
        );
    }

    #[test]
    fn test_list_missing_directory() {
        let (_, explorer) = setup();
        assert!(explorer.list("/missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_create_directory() {
        let (backend, explorer) = setup();
        let response = explorer.create_directory("/", "photos").unwrap();
        assert!(!response.is_json && !response.is_attachment);
        assert!(backend.exists(&p("/photos")));

        // No implicit parents
        assert!(explorer.create_directory("/a/b", "c").unwrap_err().is_not_found());
        assert!(matches!(
            explorer.create_directory("/", "x/y"),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn test_get_file_content_returns_attachment() {
        let (backend, explorer) = setup();
        put(&backend, "/notes/todo.md", b"- ship it");

        let response = explorer.get_file_content("/notes/todo.md").unwrap();
        assert!(response.is_attachment);
        let blob = response.blob.as_ref().unwrap();
        assert_eq!(blob.name, "todo.md");
        assert_eq!(blob.content().as_ref(), b"- ship it");
    }

    #[test]
    fn test_get_file_content_rejects_directory() {
        let (backend, explorer) = setup();
        backend.mkdir(&p("/dir"), false).unwrap();
        assert!(matches!(
            explorer.get_file_content("/dir"),
            Err(Error::IsADirectory(_))
        ));
    }

    #[test]
    fn test_remove_batch() {
        let (backend, explorer) = setup();
        put(&backend, "/d/a", b"a");
        put(&backend, "/d/b", b"b");
        put(&backend, "/d/sub/c", b"c");

        explorer.remove("/d", &names(&["a", "sub"]), true).unwrap();
        assert!(!backend.exists(&p("/d/a")));
        assert!(!backend.exists(&p("/d/sub")));
        assert!(backend.exists(&p("/d/b")));
    }

    #[test]
    fn test_remove_reports_partial_failure() {
        let (backend, explorer) = setup();
        put(&backend, "/d/a", b"a");

        let err = explorer
            .remove("/d", &names(&["a", "ghost"]), true)
            .unwrap_err();
        match err {
            Error::Batch {
                operation,
                failed,
                completed,
            } => {
                assert_eq!(operation, "remove");
                assert_eq!(failed[0].name, "ghost");
                assert_eq!(completed, names(&["a"]));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // No rollback for removals
        assert!(!backend.exists(&p("/d/a")));
    }

    #[test]
    fn test_remove_non_recursive_keeps_full_directory() {
        let (backend, explorer) = setup();
        put(&backend, "/d/sub/c", b"c");
        assert!(explorer.remove("/d", &names(&["sub"]), false).is_err());
        assert!(backend.exists(&p("/d/sub/c")));
    }

    #[test]
    fn test_empty_batch_makes_no_calls() {
        let (backend, explorer) = setup();
        explorer.remove("/nowhere", &[], true).unwrap();
        explorer.copy("/a", "/b", &[]).unwrap();
        explorer.upload("/c", &[]).unwrap();
        assert!(backend.is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let (backend, explorer) = setup();
        put(&backend, "/d/a", b"a");
        assert!(matches!(
            explorer.remove("/d", &names(&["a", "a"]), true),
            Err(Error::InvalidName(_))
        ));
        assert!(backend.exists(&p("/d/a")));
    }

    #[test]
    fn test_copy_into_directory() {
        let (backend, explorer) = setup();
        put(&backend, "/src/a.txt", b"A");
        put(&backend, "/src/pics/p.png", b"P");
        backend.mkdir(&p("/dst"), false).unwrap();

        explorer
            .copy("/src", "/dst", &names(&["a.txt", "pics"]))
            .unwrap();
        assert_eq!(backend.read_file(&p("/dst/a.txt")).unwrap().as_ref(), b"A");
        assert!(backend.exists(&p("/dst/pics/p.png")));
        assert!(backend.exists(&p("/src/a.txt")));
    }

    #[test]
    fn test_copy_to_base_directory() {
        let (backend, explorer) = setup();
        put(&backend, "/deep/nested/file.txt", b"x");

        explorer
            .copy("/deep/nested", "/", &names(&["file.txt"]))
            .unwrap();
        assert!(backend.exists(&p("/file.txt")));
    }

    #[test]
    fn test_copy_into_itself_rejected() {
        let (backend, explorer) = setup();
        put(&backend, "/a/b/c", b"c");
        assert!(matches!(
            explorer.copy("/", "/a/b", &names(&["a"])),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_move_files() {
        let (backend, explorer) = setup();
        put(&backend, "/in/one", b"1");
        put(&backend, "/in/two", b"2");
        backend.mkdir(&p("/out"), false).unwrap();

        explorer
            .move_files("/in", "/out", &names(&["one", "two"]))
            .unwrap();
        assert!(!backend.exists(&p("/in/one")));
        assert!(!backend.exists(&p("/in/two")));
        assert_eq!(backend.read_file(&p("/out/two")).unwrap().as_ref(), b"2");
    }

    #[test]
    fn test_move_rolls_back_when_a_copy_fails() {
        let inner = Arc::new(MemoryBackend::new());
        put(&inner, "/in/one", b"1");
        put(&inner, "/in/two", b"2");
        inner.mkdir(&p("/out"), false).unwrap();

        let backend = Faulty {
            inner: inner.clone(),
            refuse_cp: Some(p("/out/two")),
            refuse_rm: None,
        };
        let explorer = Explorer::with_backend(backend, 2).unwrap();

        let err = explorer
            .move_files("/in", "/out", &names(&["one", "two"]))
            .unwrap_err();
        assert!(matches!(err, Error::Batch { operation: "move", .. }));

        // Sources intact, partial copy undone
        assert!(inner.exists(&p("/in/one")));
        assert!(inner.exists(&p("/in/two")));
        assert!(!inner.exists(&p("/out/one")));
        assert!(!inner.exists(&p("/out/two")));
    }

    #[test]
    fn test_move_keeps_both_copies_when_a_removal_fails() {
        let inner = Arc::new(MemoryBackend::new());
        put(&inner, "/in/one", b"1");
        put(&inner, "/in/two", b"2");
        inner.mkdir(&p("/out"), false).unwrap();

        let backend = Faulty {
            inner: inner.clone(),
            refuse_cp: None,
            refuse_rm: Some(p("/in/two")),
        };
        let explorer = Explorer::with_backend(backend, 2).unwrap();

        let err = explorer
            .move_files("/in", "/out", &names(&["one", "two"]))
            .unwrap_err();
        match err {
            Error::Batch {
                operation,
                failed,
                completed,
            } => {
                assert_eq!(operation, "move");
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].name, "two");
                assert_eq!(completed, names(&["one"]));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(!inner.exists(&p("/in/one")));
        assert!(inner.exists(&p("/out/one")));
        assert_eq!(inner.read_file(&p("/in/two")).unwrap().as_ref(), b"2");
        assert_eq!(inner.read_file(&p("/out/two")).unwrap().as_ref(), b"2");
    }

    #[test]
    fn test_move_onto_existing_entry_keeps_both() {
        let (backend, explorer) = setup();
        put(&backend, "/in/f", b"new");
        put(&backend, "/out/f", b"old");

        assert!(explorer.move_files("/in", "/out", &names(&["f"])).is_err());
        assert_eq!(backend.read_file(&p("/in/f")).unwrap().as_ref(), b"new");
        assert_eq!(backend.read_file(&p("/out/f")).unwrap().as_ref(), b"old");
    }

    #[test]
    fn test_rename() {
        let (backend, explorer) = setup();
        put(&backend, "/d/old.txt", b"x");

        explorer.rename("/d/old.txt", "new.txt").unwrap();
        assert!(!backend.exists(&p("/d/old.txt")));
        assert!(backend.exists(&p("/d/new.txt")));
    }

    #[test]
    fn test_rename_edge_cases() {
        let (backend, explorer) = setup();
        put(&backend, "/d/a", b"a");
        put(&backend, "/d/b", b"b");

        assert!(matches!(
            explorer.rename("/", "x"),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            explorer.rename("/d/a", "../b"),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(
            explorer.rename("/d/a", "b"),
            Err(Error::AlreadyExists(_))
        ));
        // Same name is a no-op
        explorer.rename("/d/a", "a").unwrap();
        assert!(backend.exists(&p("/d/a")));
    }

    #[test]
    fn test_rename_onto_directory_is_refused() {
        let (backend, explorer) = setup();
        put(&backend, "/d/a", b"a");
        backend.mkdir(&p("/d/sub"), false).unwrap();

        assert!(matches!(
            explorer.rename("/d/a", "sub"),
            Err(Error::AlreadyExists(_))
        ));
        assert!(backend.exists(&p("/d/a")));
        assert!(!backend.exists(&p("/d/sub/a")));
    }

    #[test]
    fn test_rename_missing_entry() {
        let (_, explorer) = setup();
        assert!(explorer.rename("/d/ghost", "ghost").unwrap_err().is_not_found());
        assert!(explorer.rename("/d/ghost", "other").unwrap_err().is_not_found());
    }

    #[test]
    fn test_upload_creates_parents_and_truncates() {
        let (backend, explorer) = setup();
        put(&backend, "/up/b.txt", b"a much longer previous body");

        let files = vec![
            UploadFile::new("a.txt", Bytes::from_static(b"alpha")),
            UploadFile::new("b.txt", Bytes::from_static(b"beta")),
        ];
        explorer.upload("/up", &files).unwrap();
        explorer.upload("/fresh/dir", &files[..1]).unwrap();

        assert_eq!(backend.read_file(&p("/up/a.txt")).unwrap().as_ref(), b"alpha");
        assert_eq!(backend.read_file(&p("/up/b.txt")).unwrap().as_ref(), b"beta");
        assert!(backend.exists(&p("/fresh/dir/a.txt")));
    }

    #[test]
    fn test_stat_and_version() {
        let (backend, explorer) = setup();
        put(&backend, "/f", b"four");

        let stat = explorer.stat("/f").unwrap();
        assert_eq!(stat.size, 4);
        assert_eq!(stat.kind, EntryKind::File);
        assert_eq!(explorer.version().unwrap().repo, "memory");
        assert_eq!(explorer.backend().name(), "memory");
    }

    #[test]
    fn test_relative_paths_rejected() {
        let (_, explorer) = setup();
        assert!(matches!(explorer.list("docs"), Err(Error::InvalidPath(_))));
    }
}
