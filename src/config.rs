use std::time::Duration;

use clap::ValueEnum;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1/raftstore/api/dbproject/v1/";

/// Casing applied to every request parameter name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FieldCase {
    #[default]
    Lower,
    Upper,
}

impl FieldCase {
    pub fn apply(&self, field: &str) -> String {
        match self {
            FieldCase::Lower => field.to_lowercase(),
            FieldCase::Upper => field.to_uppercase(),
        }
    }
}

/// How `setp` turns a file into a stored value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum UploadMode {
    /// `setp <key> <file>`: base64 of the raw bytes under the given key.
    Compact,
    /// `setp <file>`: key is the content hash plus the file extension.
    #[default]
    ContentAddressed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: Option<String>,
}

/// Everything a `RaftStoreClient` needs, fixed for the lifetime of the run.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Option<Credentials>,
    pub field_case: FieldCase,
    pub upload_mode: UploadMode,
    /// `None` keeps the transport default.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            credentials: None,
            field_case: FieldCase::default(),
            upload_mode: UploadMode::default(),
            timeout: None,
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.credentials = Some(Credentials {
            user: user.into(),
            password,
        });
        self
    }

    pub fn with_field_case(mut self, field_case: FieldCase) -> Self {
        self.field_case = field_case;
        self
    }

    pub fn with_upload_mode(mut self, upload_mode: UploadMode) -> Self {
        self.upload_mode = upload_mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
