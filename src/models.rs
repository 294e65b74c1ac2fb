use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

use crate::error::ClientError;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Representation requested from the `get` endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GetType {
    /// Envelope whose value is base64(deflate(data)).
    Compact,
    /// Stored bytes as the response body.
    Raw,
    /// Deflated stored bytes as the response body.
    Deflate,
}

impl GetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GetType::Compact => "compact",
            GetType::Raw => "raw",
            GetType::Deflate => "deflate",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "compact" => Some(GetType::Compact),
            "raw" => Some(GetType::Raw),
            "deflate" => Some(GetType::Deflate),
            _ => None,
        }
    }
}

impl fmt::Display for GetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bounds of a range query. Unset bounds are never sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub limit: Option<u64>,
    pub end: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Get { key: String, get_type: Option<GetType> },
    Set { key: String, value: String },
    /// `setp` with a caller supplied key: base64 of the raw file bytes.
    SetFile { key: String, path: PathBuf },
    /// `setp` with a key derived from the file content hash.
    SetContent { path: PathBuf },
    Remove { key: String },
    Range(RangeQuery),
    Search { term: String, limit: Option<u64> },
    Stat { client: Option<String> },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Get { key, get_type: None } => write!(f, "Get<key={}>", key),
            Command::Get { key, get_type: Some(t) } => write!(f, "Get<key={}, type={}>", key, t),
            Command::Set { key, value } => write!(f, "Set<key={}, value={}>", key, value),
            Command::SetFile { key, path } => write!(f, "SetFile<key={}, path={}>", key, path.display()),
            Command::SetContent { path } => write!(f, "SetContent<path={}>", path.display()),
            Command::Remove { key } => write!(f, "Remove<key={}>", key),
            Command::Range(q) => write!(
                f,
                "Range<start={:?}, limit={:?}, end={:?}>",
                q.start, q.limit, q.end
            ),
            Command::Search { term, limit } => write!(f, "Search<term={}, limit={:?}>", term, limit),
            Command::Stat { client } => write!(f, "Stat<client={:?}>", client),
        }
    }
}

/// JSON object returned by every raftstore endpoint.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    #[serde(alias = "CODE")]
    pub code: i64,
    #[serde(default, alias = "VALUE")]
    pub value: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub md5sum: Option<String>,
}

/// A response body, decoded when it has the envelope shape.
///
/// `raw` always keeps the verbatim body so that anything unexpected can be
/// printed for diagnostics instead of being parsed further.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub raw: String,
    pub envelope: Option<Envelope>,
}

impl Reply {
    pub fn from_body(raw: String) -> Self {
        let envelope = match serde_json::from_str::<Envelope>(&raw) {
            Ok(envelope) => {
                if envelope.code != 0 {
                    log::debug!(
                        "Request failed with code {}: {}",
                        envelope.code,
                        envelope.info.as_deref().unwrap_or("")
                    );
                }
                Some(envelope)
            }
            Err(err) => {
                log::debug!("Response is not an envelope: {}", err);
                None
            }
        };
        Reply { raw, envelope }
    }

    pub fn is_ok(&self) -> bool {
        matches!(&self.envelope, Some(envelope) if envelope.code == 0)
    }

    /// The `value` field of a successful envelope.
    pub fn value(&self) -> Option<&str> {
        match &self.envelope {
            Some(envelope) if envelope.code == 0 => envelope.value.as_deref(),
            _ => None,
        }
    }

    /// Decodes the JSON array carried inside `value` by range and search
    /// replies. `None` when the reply failed or the value is not an array.
    pub fn items(&self) -> Option<Vec<serde_json::Value>> {
        let value = self.value()?;
        match serde_json::from_str::<Vec<serde_json::Value>>(value) {
            Ok(items) => Some(items),
            Err(err) => {
                log::warn!("Cannot decode list value: {}", err);
                None
            }
        }
    }

    pub fn raw_text(&self) -> &str {
        self.raw.trim_end()
    }
}
