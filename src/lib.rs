//! Bearer-authenticated request pipeline.
//!
//! Credentials are attached to every call, expired sessions are refreshed behind a single-flight
//! guard, and failures surface through a swappable toast sink.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod path;
pub mod report;
pub mod request;
pub mod response;
pub mod storage;
pub mod toast;
pub mod token;

pub use client::RequestClient;
#[cfg(feature = "reqwest")] pub use client::ReqwestRequestClient;
pub use request::RequestSpec;
pub use response::ApiResponse;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::OnceCell;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
