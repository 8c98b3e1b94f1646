//! Lemmy instance HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required).
//! Discovery at construction, then one request per call.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{json, Value};

use crate::auth::Authentication;
use crate::config::ClientConfig;
use crate::error::{error_chain, Error, Result};
use crate::nodeinfo::{NodeInfo, EXPECTED_SOFTWARE};
use crate::policy::ErrorPolicy;
use crate::request::{Method, RequestOptions};

// ── Constants ───────────────────────────────────────────────────────

const API_PATH: &str = "/api/v3";
const NODEINFO_PATH: &str = "/nodeinfo/2.0.json";
const LOGIN_ENDPOINT: &str = "/user/login";

/// `Sec-Fetch-Site` for discovery. API calls send [`API_FETCH_SITE`];
/// the two differ on purpose.
const DISCOVERY_FETCH_SITE: &str = "cross-site";
const API_FETCH_SITE: &str = "none";

/// Client for one Lemmy instance.
///
/// Owns the token. [`Image`](crate::Image) borrows the requestor to reach
/// the media service with the same credentials.
#[derive(Debug)]
pub struct Requestor {
    http: Client,
    instance_url: String,
    auth: Authentication,
    policy: ErrorPolicy,
    nodeinfo: Option<NodeInfo>,
}

impl Requestor {
    /// Connect to `instance_url` and fetch its nodeinfo.
    ///
    /// With `raise_exceptions = false` a failed discovery is logged and the
    /// client is still returned.
    pub fn new(instance_url: impl Into<String>, raise_exceptions: bool) -> Result<Self> {
        Self::with_config(ClientConfig::new(instance_url).raise_exceptions(raise_exceptions))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(None::<Duration>)
            .build()
            .map_err(Error::Build)?;

        let mut requestor = Self {
            http,
            instance_url: config.instance_url.clone(),
            auth: Authentication::new(),
            policy: ErrorPolicy::from_raise_exceptions(config.raise_exceptions),
            nodeinfo: None,
        };

        let fetched = requestor.fetch_nodeinfo(config.discovery_timeout());
        requestor.nodeinfo = requestor.policy.resolve(fetched)?;

        if let Some(info) = &requestor.nodeinfo {
            if info.is_lemmy() {
                log::info!(
                    "Connected successfully to Lemmy v{} instance {}",
                    info.software_version().unwrap_or("unknown"),
                    requestor.instance_url,
                );
            } else {
                log::error!(
                    "Domain name does not appear to contain {} software, but instead '{}'",
                    EXPECTED_SOFTWARE,
                    info.software_name().unwrap_or("none"),
                );
            }
        }

        Ok(requestor)
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn api_url(&self) -> String {
        format!("{}{}", self.instance_url, API_PATH)
    }

    /// Discovery document, if it could be fetched at construction.
    pub fn nodeinfo(&self) -> Option<&NodeInfo> {
        self.nodeinfo.as_ref()
    }

    pub fn auth(&self) -> &Authentication {
        &self.auth
    }

    /// Mutable access for callers that already hold a token.
    pub fn auth_mut(&mut self) -> &mut Authentication {
        &mut self.auth
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn raises(&self) -> bool {
        self.policy.raises()
    }

    pub fn set_raise_exceptions(&mut self, raise_exceptions: bool) {
        self.policy = ErrorPolicy::from_raise_exceptions(raise_exceptions);
    }

    /// Call `{api_url}{endpoint}` and return the decoded JSON body.
    ///
    /// When authenticated, `auth` is added to the JSON body and to the
    /// query params (whichever are present). Failures follow the policy:
    /// `Ok(None)` when suppressing, `Err` when propagating.
    pub fn api(
        &self,
        method: Method,
        endpoint: &str,
        mut options: RequestOptions,
    ) -> Result<Option<Value>> {
        log::info!("Requesting API {} {}", method, endpoint);

        if let Some(token) = self.auth.token().filter(|t| !t.is_empty()) {
            log::debug!("Injecting auth token into {} {}", method, endpoint);
            options.inject_auth(token);
        }

        let url = format!("{}{}", self.api_url(), endpoint);
        let req = self
            .http
            .request(method.into(), url)
            .headers(browser_headers(API_FETCH_SITE));
        let req = options.apply(req);

        self.policy.resolve(send_json(method, endpoint, req))
    }

    /// Log in and keep the returned token.
    ///
    /// Returns whether a token is held afterwards. A response without a
    /// `jwt` leaves the current token untouched.
    pub fn log_in(
        &mut self,
        username_or_email: &str,
        password: &str,
        totp: Option<&str>,
    ) -> Result<bool> {
        let payload = json!({
            "username_or_email": username_or_email,
            "password": password,
            "totp_2fa_token": totp,
        });

        let data = self.api(Method::Post, LOGIN_ENDPOINT, RequestOptions::new().json(payload))?;
        if let Some(data) = data {
            match data.get("jwt").and_then(Value::as_str) {
                Some(jwt) => {
                    log::debug!("Logged in as {}", username_or_email);
                    self.auth.set_token(jwt);
                }
                None => log::error!("Login response for {} carried no jwt", username_or_email),
            }
        }

        Ok(self.auth.token().is_some())
    }

    /// Forget the token. No request is made.
    pub fn log_out(&mut self) {
        self.auth.clear();
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn fetch_nodeinfo(&self, timeout: Duration) -> Result<NodeInfo> {
        let url = format!("{}{}", self.instance_url, NODEINFO_PATH);
        let fetched = self
            .http
            .get(url.as_str())
            .headers(browser_headers(DISCOVERY_FETCH_SITE))
            .timeout(timeout)
            .send()
            .and_then(|resp| resp.text());

        let detail = match fetched {
            Ok(body) => match serde_json::from_str::<Value>(&body) {
                Ok(document) => return Ok(NodeInfo::new(document)),
                Err(err) => error_chain(&err),
            },
            Err(err) => error_chain(&err),
        };
        Err(Error::Discovery { url, detail })
    }
}

// ── Free functions ──────────────────────────────────────────────────

/// Browser-like header set. Only `Sec-Fetch-Site` varies.
fn browser_headers(fetch_site: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let fixed = [
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", fetch_site),
        ("sec-fetch-user", "?1"),
        ("sec-gpc", "1"),
    ];
    for (name, value) in fixed {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

/// Send the request and decode a JSON body from a success response.
pub(crate) fn send_json(method: Method, endpoint: &str, req: RequestBuilder) -> Result<Value> {
    let transport = |source: reqwest::Error| Error::transport(method, endpoint, source);

    let response = req.send().map_err(transport)?;
    let status = response.status();
    let body = response.text().map_err(transport)?;

    if !status.is_success() {
        return Err(Error::Status {
            method,
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| Error::Decode {
        method,
        endpoint: endpoint.to_string(),
        source,
    })
}
