//! Request method and per-call options.

use std::fmt;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::RequestBuilder;
use serde_json::Value;

/// Field name the instance API reads the token from.
pub(crate) const AUTH_FIELD: &str = "auth";

/// HTTP methods the instance API is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// One multipart file field.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Options forwarded verbatim to the transport.
///
/// The client only ever adds the `auth` field (API calls) or the `jwt`
/// cookie (media calls). Everything set here goes out untouched.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    json: Option<Value>,
    query: Option<Vec<(String, String)>>,
    files: Vec<FilePart>,
    headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON request body. Only object bodies receive the `auth` field.
    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Replace the query parameters. An empty iterator still counts as
    /// "params supplied" for token injection.
    pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query = Some(
            params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Append one query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    /// Attach a multipart file field.
    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.files.push(FilePart {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
        });
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json_body(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    pub fn query_params(&self) -> Option<&[(String, String)]> {
        self.query.as_deref()
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    /// Add `auth = token` to the JSON object body and to the query params,
    /// whichever were supplied. Both may receive it.
    pub(crate) fn inject_auth(&mut self, token: &str) {
        if let Some(Value::Object(body)) = self.json.as_mut() {
            body.insert(AUTH_FIELD.to_string(), Value::String(token.to_string()));
        }
        if let Some(query) = self.query.as_mut() {
            query.retain(|(k, _)| k != AUTH_FIELD);
            query.push((AUTH_FIELD.to_string(), token.to_string()));
        }
    }

    pub(crate) fn apply(self, mut req: RequestBuilder) -> RequestBuilder {
        if let Some(body) = &self.json {
            req = req.json(body);
        }
        if let Some(query) = &self.query {
            req = req.query(query);
        }
        if !self.files.is_empty() {
            let form = self.files.into_iter().fold(Form::new(), |form, part| {
                form.part(part.field, Part::bytes(part.bytes).file_name(part.file_name))
            });
            req = req.multipart(form);
        }
        for (name, value) in &self.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        req
    }
}
