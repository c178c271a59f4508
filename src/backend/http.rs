//! Kubo RPC backend
//!
//! Every command is a `POST {api_url}/api/v0/<command>` with arguments in
//! the query string. Failures come back as non-2xx responses carrying
//! `{"Message": ..., "Code": ..., "Type": "error"}`.

use crate::config::ClientConfig;
use crate::{Error, Result};

#[cfg(feature = "http")]
use super::MfsBackend;
#[cfg(feature = "http")]
use crate::model::{Cid, Entry, EntryKind, MfsPath, NodeVersion, Stat, WriteOptions};
#[cfg(feature = "http")]
use bytes::Bytes;

/// Body of a failed RPC call
#[derive(Debug, serde::Deserialize)]
struct ApiError {
    #[serde(rename = "Message")]
    message: String,
}

/// Turn a failed RPC response into a typed error
///
/// The node only reports errors as text, so the well-known messages are
/// matched to keep `NotFound`/`AlreadyExists` distinguishable for callers.
pub(crate) fn classify_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<ApiError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let lower = message.to_lowercase();

    if lower.contains("does not exist") || lower.contains("not found") {
        Error::NotFound(message)
    } else if lower.contains("already has entry") || lower.contains("already exists") {
        Error::AlreadyExists(message)
    } else if lower.contains("not a directory") {
        Error::NotADirectory(message)
    } else if lower.contains("is a directory") {
        Error::IsADirectory(message)
    } else {
        Error::Api { status, message }
    }
}

#[cfg(feature = "http")]
fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Backend talking to a Kubo node
#[cfg(feature = "http")]
pub struct HttpBackend {
    config: ClientConfig,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpBackend {
    /// Create a new backend for the configured endpoint
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(HttpBackend { config, client })
    }

    /// Create a backend from the environment (IPFS_API_URL etc.)
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::default().apply_env()?)
    }

    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    /// Build the full URL for a command
    fn url(&self, command: &str) -> String {
        format!(
            "{}/api/v0/{}",
            self.config.api_url.trim_end_matches('/'),
            command
        )
    }

    /// Issue a command and return the successful response
    fn call(
        &self,
        command: &str,
        query: &[(&str, &str)],
        form: Option<reqwest::blocking::multipart::Form>,
    ) -> Result<reqwest::blocking::Response> {
        tracing::debug!(command, ?query, "rpc call");

        let mut request = self.client.post(self.url(command)).query(query);
        if let Some(form) = form {
            request = request.multipart(form);
        }

        let response = request.send().map_err(|e| Error::Http(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let error = classify_error(status.as_u16(), &body);
        tracing::debug!(command, status = status.as_u16(), %error, "rpc failed");
        Err(error)
    }

    /// Issue a command and decode its JSON body
    fn call_json<T: serde::de::DeserializeOwned>(
        &self,
        command: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.call(command, query, None)?;
        let text = response.text().map_err(|e| Error::Http(e.to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(feature = "http")]
impl MfsBackend for HttpBackend {
    fn version(&self) -> Result<NodeVersion> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct VersionResponse {
            version: String,
            #[serde(default)]
            commit: String,
            #[serde(default)]
            repo: String,
            #[serde(default)]
            system: String,
        }

        let data: VersionResponse = self.call_json("version", &[])?;
        Ok(NodeVersion {
            version: data.version,
            commit: data.commit,
            repo: data.repo,
            system: data.system,
        })
    }

    fn ls(&self, path: &MfsPath) -> Result<Vec<Entry>> {
        #[derive(serde::Deserialize)]
        struct LsResponse {
            #[serde(rename = "Entries", default)]
            entries: Option<Vec<LsEntry>>,
        }
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct LsEntry {
            name: String,
            #[serde(rename = "Type")]
            kind: u8,
            #[serde(default)]
            size: u64,
            hash: String,
        }

        let path = path.to_string();
        let data: LsResponse =
            self.call_json("files/ls", &[("arg", path.as_str()), ("long", "true")])?;

        data.entries
            .unwrap_or_default()
            .into_iter()
            .map(|e| {
                let kind = EntryKind::from_code(e.kind).ok_or_else(|| Error::Api {
                    status: 200,
                    message: format!("unknown entry type {} for '{}'", e.kind, e.name),
                })?;
                Ok(Entry {
                    cid: Cid::parse(&e.hash)?,
                    name: e.name,
                    kind,
                    size: e.size,
                })
            })
            .collect()
    }

    fn mkdir(&self, path: &MfsPath, parents: bool) -> Result<()> {
        let path = path.to_string();
        self.call(
            "files/mkdir",
            &[("arg", path.as_str()), ("parents", flag(parents))],
            None,
        )?;
        Ok(())
    }

    fn stat(&self, path: &MfsPath) -> Result<Stat> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct StatResponse {
            hash: String,
            size: u64,
            cumulative_size: u64,
            blocks: u64,
            #[serde(rename = "Type")]
            kind: String,
        }

        let path = path.to_string();
        let data: StatResponse = self.call_json("files/stat", &[("arg", path.as_str())])?;
        let kind = EntryKind::from_name(&data.kind).ok_or_else(|| Error::Api {
            status: 200,
            message: format!("unknown entry type '{}' for {}", data.kind, path),
        })?;

        Ok(Stat {
            cid: Cid::parse(&data.hash)?,
            size: data.size,
            cumulative_size: data.cumulative_size,
            blocks: data.blocks,
            kind,
        })
    }

    fn cat(&self, cid: &Cid) -> Result<Bytes> {
        let response = self.call("cat", &[("arg", cid.as_str())], None)?;
        response.bytes().map_err(|e| Error::Http(e.to_string()))
    }

    fn rm(&self, path: &MfsPath, recursive: bool) -> Result<()> {
        let path = path.to_string();
        self.call(
            "files/rm",
            &[("arg", path.as_str()), ("recursive", flag(recursive))],
            None,
        )?;
        Ok(())
    }

    fn cp(&self, from: &MfsPath, to: &MfsPath) -> Result<()> {
        let (from, to) = (from.to_string(), to.to_string());
        self.call("files/cp", &[("arg", from.as_str()), ("arg", to.as_str())], None)?;
        Ok(())
    }

    fn mv(&self, from: &MfsPath, to: &MfsPath) -> Result<()> {
        let (from, to) = (from.to_string(), to.to_string());
        self.call("files/mv", &[("arg", from.as_str()), ("arg", to.as_str())], None)?;
        Ok(())
    }

    fn write(&self, path: &MfsPath, content: Bytes, opts: WriteOptions) -> Result<()> {
        let file_name = path.file_name().unwrap_or("file").to_string();
        let part = reqwest::blocking::multipart::Part::bytes(content.to_vec())
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| Error::Http(e.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new().part("file", part);

        let path = path.to_string();
        self.call(
            "files/write",
            &[
                ("arg", path.as_str()),
                ("create", flag(opts.create)),
                ("parents", flag(opts.parents)),
                ("truncate", flag(opts.truncate)),
            ],
            Some(form),
        )?;
        Ok(())
    }

    fn name(&self) -> &str {
        "kubo-rpc"
    }
}

/// Stub implementation when the http feature is disabled
#[cfg(not(feature = "http"))]
pub struct HttpBackend;

#[cfg(not(feature = "http"))]
impl HttpBackend {
    pub fn new(_config: ClientConfig) -> Result<Self> {
        Err(Error::Config(
            "HTTP backend not enabled. Compile with --features http".into(),
        ))
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::default())
    }
}
