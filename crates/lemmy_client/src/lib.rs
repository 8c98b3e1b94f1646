//! Lemmy instance API client.
//!
//! This crate covers the instance wire contract: nodeinfo discovery,
//! login/logout, generic authenticated `/api/v3` calls, and image uploads
//! to the pict-rs media service behind the instance.
//!
//! Blocking only. No retries. No pagination. No response schema checks.

mod auth;
mod config;
mod error;
mod image;
mod nodeinfo;
mod policy;
mod request;
mod requestor;

pub use auth::Authentication;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use image::{Image, UploadedImage};
pub use nodeinfo::{NodeInfo, EXPECTED_SOFTWARE};
pub use policy::ErrorPolicy;
pub use request::{FilePart, Method, RequestOptions};
pub use requestor::Requestor;
