//! A fake Kubo RPC endpoint for integration tests
//!
//! Records every request and answers through a caller-supplied handler.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::io::Read;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const EMPTY_DIR_CID: &str = "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn";
pub const FILE_CID: &str = "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku";

/// One request as seen by the fake node
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    /// Path without query, e.g. `/api/v0/files/ls`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    /// Command name, e.g. `files/ls`
    pub fn command(&self) -> &str {
        self.path.trim_start_matches("/api/v0/")
    }

    /// All `arg` values in order
    pub fn args(&self) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == "arg")
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

pub type Reply = (u16, Vec<u8>);

pub fn json(status: u16, value: serde_json::Value) -> Reply {
    (status, value.to_string().into_bytes())
}

pub fn ok_empty() -> Reply {
    (200, Vec::new())
}

pub fn not_found() -> Reply {
    json(
        500,
        serde_json::json!({"Message": "file does not exist", "Code": 0, "Type": "error"}),
    )
}

/// `files/stat` answer for a small file
pub fn file_stat(size: u64) -> Reply {
    json(
        200,
        serde_json::json!({
            "Hash": FILE_CID,
            "Size": size,
            "CumulativeSize": size + 11,
            "Blocks": 0,
            "Type": "file"
        }),
    )
}

pub fn version_reply() -> Reply {
    json(
        200,
        serde_json::json!({
            "Version": "0.29.0",
            "Commit": "3f0947b",
            "Repo": "16",
            "System": "amd64/linux",
            "Golang": "go1.22.4"
        }),
    )
}

/// Handler that answers `version` and otherwise defers to `inner`
pub fn with_version<F>(inner: F) -> impl Fn(&Recorded) -> Reply + Send + 'static
where
    F: Fn(&Recorded) -> Reply + Send + 'static,
{
    move |req| {
        if req.command() == "version" {
            version_reply()
        } else {
            inner(req)
        }
    }
}

pub struct FakeNode {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    stop: mpsc::Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeNode {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&Recorded) -> Reply + Send + 'static,
    {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("Failed to start fake node");
        let port = server.server_addr().to_ip().unwrap().port();
        let url = format!("http://127.0.0.1:{}", port);

        let requests = Arc::new(Mutex::new(Vec::new()));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let log = requests.clone();
        let handle = thread::spawn(move || loop {
            if stop_rx.try_recv().is_ok() {
                break;
            }

            match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(mut request)) => {
                    let mut body = Vec::new();
                    let _ = request.as_reader().read_to_end(&mut body);

                    let parsed = reqwest::Url::parse(&format!("http://fake{}", request.url()))
                        .expect("request url");
                    let recorded = Recorded {
                        method: request.method().to_string(),
                        path: parsed.path().to_string(),
                        query: parsed
                            .query_pairs()
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                            .collect(),
                        body,
                    };

                    let (status, payload) = handler(&recorded);
                    log.lock().push(recorded);

                    let response = tiny_http::Response::from_data(payload)
                        .with_status_code(status)
                        .with_header(
                            tiny_http::Header::from_bytes(
                                &b"Content-Type"[..],
                                &b"application/json"[..],
                            )
                            .unwrap(),
                        );
                    let _ = request.respond(response);
                }
                Ok(None) => {}
                Err(_) => break,
            }
        });

        FakeNode {
            url,
            requests,
            stop: stop_tx,
            handle: Some(handle),
        }
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    /// Requests for one command
    pub fn requests_for(&self, command: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.command() == command)
            .collect()
    }
}

impl Drop for FakeNode {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
