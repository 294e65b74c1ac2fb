use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde_json::{Map, Value};

use crate::config::{ClientConfig, Credentials, FieldCase};
use crate::error::ClientError;
use crate::models::{GetType, RangeQuery, Reply, Result};
use crate::upload::{Upload, COMPACT_TYPE};

/// Relative to the database base URL; the stat endpoint is not per database.
const STAT_PATH: &str = "../../v1/stat";

/// Blocking HTTP client for the raftstore API
pub struct RaftStoreClient {
    base_url: Url,
    credentials: Option<Credentials>,
    field_case: FieldCase,
    client: Client,
}

impl RaftStoreClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ClientError::Config(format!("invalid base URL '{}': {}", base, e)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(RaftStoreClient {
            base_url,
            credentials: config.credentials.clone(),
            field_case: config.field_case,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Config(format!("invalid endpoint '{}': {}", path, e)))
    }

    /// Cases parameter names and drops the ones without a value.
    fn params(&self, pairs: &[(&str, Option<String>)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .filter_map(|(name, value)| {
                value
                    .as_ref()
                    .map(|v| (self.field_case.apply(name), v.clone()))
            })
            .collect()
    }

    fn send(&self, mut request: RequestBuilder) -> Result<Response> {
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.user, credentials.password.as_deref());
        }

        let response = request.send()?;
        let status = response.status();
        log::debug!("{} {}", status, response.url());
        if status != StatusCode::OK {
            return Err(ClientError::HttpStatus(status));
        }
        Ok(response)
    }

    fn query(&self, path: &str, params: Vec<(String, String)>) -> Result<Reply> {
        let url = self.endpoint(path)?;
        log::debug!("GET {} {:?}", url, params);

        let response = self.send(self.client.get(url).query(&params))?;
        let body = response.text()?;
        Ok(Reply::from_body(body))
    }

    /// `GET get`. Only `None` and `GetType::Compact` produce an envelope;
    /// use `fetch` for the raw representations.
    pub fn get(&self, key: &str, get_type: Option<GetType>) -> Result<Reply> {
        let params = self.params(&[
            ("key", Some(key.to_owned())),
            ("type", get_type.map(|t| t.as_str().to_owned())),
        ]);
        self.query("get", params)
    }

    /// `GET get` with `type=raw` or `type=deflate`: the body is the stored
    /// value itself. Deflated bodies are inflated before returning.
    pub fn fetch(&self, key: &str, get_type: GetType) -> Result<Vec<u8>> {
        let url = self.endpoint("get")?;
        let params = self.params(&[
            ("key", Some(key.to_owned())),
            ("type", Some(get_type.as_str().to_owned())),
        ]);
        log::debug!("GET {} {:?}", url, params);

        let response = self.send(self.client.get(url).query(&params))?;
        let body = response.bytes()?;
        match get_type {
            GetType::Deflate => crate::upload::inflate(&body)
                .map_err(|e| ClientError::Decode(format!("invalid deflate body: {}", e))),
            _ => Ok(body.to_vec()),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<Reply> {
        let params = self.params(&[
            ("key", Some(key.to_owned())),
            ("value", Some(value.to_owned())),
        ]);
        self.query("set", params)
    }

    /// `POST set` with a JSON body.
    pub fn upload(&self, upload: &Upload) -> Result<Reply> {
        let url = self.endpoint("set")?;

        let mut body = Map::new();
        body.insert(self.field_case.apply("key"), Value::from(upload.key.clone()));
        body.insert(self.field_case.apply("value"), Value::from(upload.value.clone()));
        body.insert(self.field_case.apply("type"), Value::from(COMPACT_TYPE));
        if let Some(md5sum) = &upload.md5sum {
            body.insert(self.field_case.apply("md5sum"), Value::from(md5sum.clone()));
        }
        log::debug!("POST {} key={} ({} bytes encoded)", url, upload.key, upload.value.len());

        let response = self.send(self.client.post(url).json(&body))?;
        let text = response.text()?;
        Ok(Reply::from_body(text))
    }

    pub fn remove(&self, key: &str) -> Result<Reply> {
        let params = self.params(&[("key", Some(key.to_owned()))]);
        self.query("remove", params)
    }

    pub fn range(&self, range: &RangeQuery) -> Result<Reply> {
        let params = self.params(&[
            ("start", range.start.clone()),
            ("limit", range.limit.map(|l| l.to_string())),
            ("end", range.end.clone()),
        ]);
        self.query("range", params)
    }

    pub fn search(&self, term: &str, limit: Option<u64>) -> Result<Reply> {
        let params = self.params(&[
            ("search", Some(term.to_owned())),
            ("limit", limit.map(|l| l.to_string())),
        ]);
        self.query("search", params)
    }

    pub fn stat(&self, client: Option<&str>) -> Result<Reply> {
        let params = self.params(&[("client", client.map(str::to_owned))]);
        self.query(STAT_PATH, params)
    }

    /// URL serving the stored bytes of `key` directly.
    pub fn retrieval_url(&self, key: &str) -> Result<Url> {
        let mut url = self.endpoint("get")?;
        url.query_pairs_mut()
            .append_pair(&self.field_case.apply("key"), key)
            .append_pair(&self.field_case.apply("type"), GetType::Raw.as_str());
        Ok(url)
    }
}
