// CLASSIFICATION: COMMUNITY
// Filename: envelope.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Relay envelope codec.
//!
//! Requests travel to the bridge as a JSON [`RequestEnvelope`]; the browser
//! side answers with a [`ReplyEnvelope`] which is turned back into a
//! response-shaped [`CyResponse`]. Reply bytes are charset-sniffed rather
//! than assumed to be UTF-8, and trailing filler the bridge pads replies
//! with is ignored.

use std::borrow::Cow;

use encoding_rs::Encoding;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{CyError, CyResult, HttpErrorKind};
use crate::transport::{Headers, HttpRequest, HttpResponse, Params};

const PREVIEW_LEN: usize = 200;

/// Request as carried over the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// HTTP method.
    pub command: String,
    pub url: String,
    pub params: Option<Params>,
    /// JSON body as-is, or a raw body as a UTF-8 string.
    pub data: Option<Value>,
    pub headers: Option<Headers>,
}

impl RequestEnvelope {
    /// Rebuild the request this envelope was encoded from. A string `data`
    /// comes back as a raw body.
    pub fn into_request(self) -> HttpRequest {
        let (json, data) = match self.data {
            Some(Value::String(text)) => (None, Some(text.into_bytes())),
            Some(other) => (Some(other), None),
            None => (None, None),
        };
        HttpRequest {
            method: self.command,
            url: self.url,
            params: self.params,
            json,
            data,
            headers: self.headers,
            timeout: None,
        }
    }
}

/// Reply relayed back by the bridge. `status == 0` means nobody answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub status: u16,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reason: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

impl ReplyEnvelope {
    pub fn has_receiver(&self) -> bool {
        self.status != 0
    }

    pub fn into_response(self, url: impl Into<String>) -> CyResponse {
        CyResponse {
            url: url.into(),
            status_code: self.status,
            reason: self.reason,
            text: self.text,
        }
    }
}

/// Encode a request for relaying.
pub fn encode(request: &HttpRequest) -> CyResult<RequestEnvelope> {
    let encoding_err = |reason: &str| CyError::Encoding {
        url: request.url.clone(),
        reason: reason.to_string(),
    };
    if !is_absolute_url(&request.url) {
        return Err(encoding_err("url must be absolute"));
    }
    let data = match (&request.json, &request.data) {
        (Some(_), Some(_)) => return Err(encoding_err("both json and raw body supplied")),
        (Some(json), None) => Some(json.clone()),
        (None, Some(raw)) => {
            let text = std::str::from_utf8(raw)
                .map_err(|_| encoding_err("raw body is not UTF-8; base64-encode binary payloads"))?;
            Some(Value::String(text.to_string()))
        }
        (None, None) => None,
    };
    Ok(RequestEnvelope {
        command: request.method.clone(),
        url: request.url.clone(),
        params: request.params.clone(),
        data,
        headers: request.headers.clone(),
    })
}

/// Decode relayed bytes into a reply envelope.
pub fn decode_reply(bytes: &[u8]) -> CyResult<ReplyEnvelope> {
    decode_json(bytes)
}

/// Sniff the charset of `bytes`, strip bridge padding and parse as JSON.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> CyResult<T> {
    let text = sniff_text(bytes);
    let trimmed = strip_padding(&text);
    serde_json::from_str(trimmed).map_err(|e| CyError::RelayDecode {
        detail: format!("{e}; content: {}", preview(trimmed)),
    })
}

/// Decode bytes using a BOM if present, otherwise a statistical guess.
pub fn sniff_text(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        debug!("reply charset from BOM: {}", encoding.name());
        let (text, _) = encoding.decode_with_bom_removal(bytes);
        return text;
    }
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, _, had_errors) = encoding.decode(bytes);
    debug!(
        "reply charset guessed as {}{}",
        encoding.name(),
        if had_errors { " (with replacements)" } else { "" }
    );
    text
}

fn strip_padding(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\0')
}

fn preview(text: &str) -> String {
    if text.is_empty() {
        return "None".into();
    }
    text.chars().take(PREVIEW_LEN).collect()
}

fn is_absolute_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    matches!(rest, Some(r) if !r.is_empty() && !r.starts_with('/'))
}

/// Response-shaped value returned by both direct and relayed calls.
#[derive(Debug, Clone, PartialEq)]
pub struct CyResponse {
    pub url: String,
    pub status_code: u16,
    pub reason: String,
    pub text: String,
}

impl CyResponse {
    pub fn from_http(url: impl Into<String>, response: HttpResponse) -> Self {
        Self {
            url: url.into(),
            status_code: response.status,
            text: String::from_utf8_lossy(&response.body).into_owned(),
            reason: response.reason,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Parse `text` as JSON.
    pub fn json(&self) -> CyResult<Value> {
        self.json_as()
    }

    pub fn json_as<T: DeserializeOwned>(&self) -> CyResult<T> {
        serde_json::from_str(&self.text).map_err(|e| CyError::Json {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }

    /// Fail for 4xx/5xx statuses.
    pub fn raise_for_status(&self) -> CyResult<()> {
        match HttpErrorKind::from_status(self.status_code) {
            Some(kind) => Err(CyError::Http {
                status: self.status_code,
                kind,
                reason: self.reason.clone(),
                url: self.url.clone(),
                body: self.text.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl std::fmt::Display for CyResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<CyResponse [{}]>", self.status_code)
    }
}
