//! pict-rs media service uploads.
//!
//! The media service lives at `{instance_url}/pictrs` and reads the token
//! from a `jwt` cookie, not from the `auth` field the instance API uses.

use std::fs;
use std::path::Path;

use reqwest::header::COOKIE;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::request::{Method, RequestOptions};
use crate::requestor::{send_json, Requestor};

const UPLOAD_ENDPOINT: &str = "image";
const BACKGROUNDED_ENDPOINT: &str = "image/backgrounded";
const IMAGE_FIELD: &str = "images[]";

/// One uploaded file with its public URLs.
///
/// The raw `file` and `delete_token` fields are folded into the URLs and
/// dropped. Any other field the media service returned is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub image_url: String,
    pub delete_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UploadedImage {
    fn from_entry(base_url: &str, entry: Value) -> Result<Self> {
        let Value::Object(mut extra) = entry else {
            return Err(malformed("file entry is not an object"));
        };
        let file = take_string(&mut extra, "file")?;
        let delete_token = take_string(&mut extra, "delete_token")?;

        Ok(Self {
            image_url: [base_url, "image", &file].join("/"),
            delete_url: [base_url, "image", "delete", &delete_token, &file].join("/"),
            extra,
        })
    }
}

/// Upload helper bound to a [`Requestor`].
#[derive(Debug, Clone, Copy)]
pub struct Image<'a> {
    requestor: &'a Requestor,
}

impl<'a> Image<'a> {
    pub fn new(requestor: &'a Requestor) -> Self {
        Self { requestor }
    }

    pub fn pictrs_base_url(&self) -> String {
        format!("{}/pictrs", self.requestor.instance_url())
    }

    pub fn auth_token(&self) -> Option<&'a str> {
        self.requestor.auth().token()
    }

    /// Upload and wait for the media service to validate the file.
    ///
    /// `Ok(None)` when the request failed under the suppressing policy or the
    /// response carried no `files`. A file that cannot be read is always an
    /// error.
    pub fn upload(&self, image_path: impl AsRef<Path>) -> Result<Option<Vec<UploadedImage>>> {
        let options = image_form(image_path.as_ref())?;
        let Some(data) = self.make_request(Method::Post, UPLOAD_ENDPOINT, options)? else {
            return Ok(None);
        };

        let files = match data {
            Value::Object(mut map) => map.remove("files"),
            _ => None,
        };
        let Some(Value::Array(files)) = files else {
            return Ok(None);
        };

        let base_url = self.pictrs_base_url();
        let uploaded = files
            .into_iter()
            .map(|entry| UploadedImage::from_entry(&base_url, entry))
            .collect::<Result<Vec<_>>>();

        self.requestor.policy().resolve(uploaded)
    }

    /// Upload for background processing and return the upload id.
    ///
    /// Unlike every other call this one errors under either policy when the
    /// media service does not hand back exactly one upload.
    pub fn async_upload(&self, image_path: impl AsRef<Path>) -> Result<String> {
        let options = image_form(image_path.as_ref())?;
        let data = self
            .make_request(Method::Post, BACKGROUNDED_ENDPOINT, options)?
            .ok_or(Error::UploadRejected("request failed"))?;

        let uploads = data
            .get("uploads")
            .and_then(Value::as_array)
            .ok_or(Error::UploadRejected("information about upload_id not present"))?;
        let [upload] = uploads.as_slice() else {
            return Err(Error::UploadRejected("expected exactly one uploaded item"));
        };

        upload
            .get("upload_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(Error::UploadRejected("upload entry has no upload_id"))
    }

    pub(crate) fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Option<Value>> {
        log::info!("Requesting image {} on {}", method, endpoint);

        let url = format!("{}/{}", self.pictrs_base_url(), endpoint);
        let mut req = self.requestor.http().request(method.into(), url.as_str());
        if let Some(token) = self.auth_token().filter(|t| !t.is_empty()) {
            req = req.header(COOKIE, format!("jwt={}", token));
        }
        let req = options.apply(req);

        self.requestor.policy().resolve(send_json(method, &url, req))
    }
}

// ── Free functions ──────────────────────────────────────────────────

/// Read the whole file up front so the handle is closed before sending.
fn image_form(path: &Path) -> Result<RequestOptions> {
    let bytes = fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    Ok(RequestOptions::new().file(IMAGE_FIELD, file_name, bytes))
}

fn take_string(entry: &mut Map<String, Value>, key: &str) -> Result<String> {
    match entry.remove(key) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(malformed(&format!("file entry missing `{}`", key))),
    }
}

fn malformed(reason: &str) -> Error {
    Error::MalformedResponse {
        endpoint: UPLOAD_ENDPOINT.to_string(),
        reason: reason.to_string(),
    }
}
