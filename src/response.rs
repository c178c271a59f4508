//! Uniform response envelope returned by every explorer operation
//!
//! Serializes as `{ok, isJson, isAttachment, json?, blob?}` so callers that
//! consumed the file-manager API over JSON see the same shape.

use crate::model::Entry;
use bytes::Bytes;
use serde::Serialize;

/// Payload of a listing response
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub success: bool,
    pub data: Vec<Entry>,
}

/// Downloaded file content
///
/// Only `name` and `size` are serialized; the bytes are read with
/// [`Attachment::content`].
#[derive(Clone, Debug, Serialize)]
pub struct Attachment {
    pub name: String,
    pub size: usize,
    #[serde(skip)]
    content: Bytes,
}

impl Attachment {
    pub fn new(name: impl Into<String>, content: Bytes) -> Self {
        Attachment {
            name: name.into(),
            size: content.len(),
            content,
        }
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }
}

/// The response envelope
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub ok: bool,
    pub is_json: bool,
    pub is_attachment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<Listing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<Attachment>,
}

impl Response {
    /// Success with no payload
    pub fn empty() -> Self {
        Response {
            ok: true,
            is_json: false,
            is_attachment: false,
            json: None,
            blob: None,
        }
    }

    /// Success carrying a directory listing
    pub fn listing(entries: Vec<Entry>) -> Self {
        Response {
            is_json: true,
            json: Some(Listing {
                success: true,
                data: entries,
            }),
            ..Response::empty()
        }
    }

    /// Success carrying file content
    pub fn attachment(name: impl Into<String>, content: Bytes) -> Self {
        Response {
            is_attachment: true,
            blob: Some(Attachment::new(name, content)),
            ..Response::empty()
        }
    }

    /// Listed entries, empty for non-listing responses
    pub fn entries(&self) -> &[Entry] {
        self.json.as_ref().map(|l| l.data.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cid, EntryKind};

    #[test]
    fn test_empty_envelope_shape() {
        let json = serde_json::to_value(Response::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ok": true, "isJson": false, "isAttachment": false})
        );
    }

    #[test]
    fn test_listing_envelope_shape() {
        let entry = Entry {
            name: "docs".into(),
            kind: EntryKind::Directory,
            size: 0,
            cid: Cid::parse("QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn").unwrap(),
        };
        let response = Response::listing(vec![entry]);
        assert_eq!(response.entries().len(), 1);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["isJson"], true);
        assert_eq!(json["json"]["success"], true);
        assert_eq!(json["json"]["data"][0]["type"], "directory");
        assert!(json.get("blob").is_none());
    }

    #[test]
    fn test_attachment_keeps_bytes_out_of_json() {
        let response = Response::attachment("a.bin", Bytes::from_static(b"\x00\x01\x02"));
        assert_eq!(response.blob.as_ref().unwrap().content().as_ref(), b"\x00\x01\x02");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["isAttachment"], true);
        assert_eq!(json["blob"], serde_json::json!({"name": "a.bin", "size": 3}));
    }
}
