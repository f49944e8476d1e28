//! Transport primitives the request pipeline dispatches through.
//!
//! [`HttpTransport`] is the pipeline's only dependency on an HTTP stack. A transport resolves a
//! [`TransportRequest`] into a [`TransportResponse`] for 2xx statuses and into a
//! [`TransportFailure`] for everything else, so the pipeline can branch on the status and the
//! server-supplied `message` without knowing which client produced them.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::_prelude::*;

/// Header carrying the bearer credential.
pub const AUTHORIZATION: &str = "authorization";

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportFailure>> + 'a + Send>>;

/// Abstraction over HTTP clients capable of dispatching pipeline requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// concurrent call of a [`RequestClient`](crate::client::RequestClient) and by the auth service
/// that refreshes its credentials.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Dispatches `request`; non-2xx statuses must resolve to [`TransportFailure`].
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// HTTP methods understood by the pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	#[default]
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
	/// `HEAD`
	Head,
	/// `OPTIONS`
	Options,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
			Method::Head => "HEAD",
			Method::Options => "OPTIONS",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
			Method::Head => reqwest::Method::HEAD,
			Method::Options => reqwest::Method::OPTIONS,
		}
	}
}

/// Fully resolved request handed to a transport.
///
/// Header names are stored lowercase.
#[derive(Clone)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL with path variables already substituted.
	pub url: Url,
	/// Request headers keyed by lowercase name.
	pub headers: BTreeMap<String, String>,
	/// Query parameters appended to the URL.
	pub query: Vec<(String, String)>,
	/// JSON body, if any.
	pub body: Option<serde_json::Value>,
}
impl TransportRequest {
	/// Creates an empty request for `method` + `url`.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: BTreeMap::new(), query: Vec::new(), body: None }
	}

	/// Looks up a header case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Sets or replaces a header.
	pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
		self.headers.insert(name.to_ascii_lowercase(), value.into());
	}

	/// Returns the bearer token carried by the `authorization` header.
	pub fn bearer(&self) -> Option<&str> {
		self.header(AUTHORIZATION)?.strip_prefix("Bearer ")
	}

	/// Attaches `token` as a bearer credential.
	pub fn set_bearer(&mut self, token: &str) {
		self.set_header(AUTHORIZATION, format!("Bearer {token}"));
	}
}
impl Debug for TransportRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				let value = if name == AUTHORIZATION { "<redacted>" } else { value.as_str() };

				(name.as_str(), value)
			})
			.collect::<BTreeMap<_, _>>();

		f.debug_struct("TransportRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("query", &self.query)
			.field("has_body", &self.body.is_some())
			.finish()
	}
}

/// Successful (2xx) transport response.
#[derive(Clone, Debug, Default)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers keyed by lowercase name.
	pub headers: BTreeMap<String, String>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Builds a response carrying a JSON body.
	pub fn json(status: u16, body: &serde_json::Value) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.to_string().into_bytes() }
	}

	/// Decodes the body as `T`; an empty body decodes as JSON `null`.
	pub fn decode<T>(&self) -> Result<T>
	where
		T: serde::de::DeserializeOwned,
	{
		let bytes: &[u8] =
			if self.body.iter().all(u8::is_ascii_whitespace) { b"null" } else { &self.body };
		let mut de = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { status: Some(self.status), source })
	}
}

/// Failure reported by a transport: a non-2xx status or a network error.
#[derive(Clone, Debug, ThisError)]
#[error("{message}")]
pub struct TransportFailure {
	/// HTTP status, absent for network failures.
	pub status: Option<u16>,
	/// Transport-level description.
	pub message: String,
	/// Parsed JSON error body, if the server sent one.
	pub body: Option<serde_json::Value>,
}
impl TransportFailure {
	/// Failure for a non-2xx response.
	pub fn from_status(status: u16, body: Option<serde_json::Value>) -> Self {
		Self { status: Some(status), message: format!("Request failed with status code {status}."), body }
	}

	/// Failure raised before any response was received.
	pub fn network(message: impl Into<String>) -> Self {
		Self { status: None, message: message.into(), body: None }
	}

	/// Non-empty `message` field of the error body.
	pub fn server_message(&self) -> Option<&str> {
		self.body
			.as_ref()?
			.get("message")?
			.as_str()
			.filter(|message| !message.is_empty())
	}

	/// Returns `true` for HTTP 401.
	pub fn is_unauthorized(&self) -> bool {
		self.status == Some(401)
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportFailure {
	fn from(e: ReqwestError) -> Self {
		Self { status: e.status().map(|code| code.as_u16()), message: e.to_string(), body: None }
	}
}

/// Thin wrapper around [`ReqwestClient`] implementing [`HttpTransport`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = client.request(request.method.into(), request.url);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if !request.query.is_empty() {
				builder = builder.query(&request.query);
			}
			if let Some(body) = &request.body {
				builder = builder.json(body);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await?.to_vec();

			if status.is_success() {
				Ok(TransportResponse { status: status.as_u16(), headers, body })
			} else {
				Err(TransportFailure::from_status(status.as_u16(), serde_json::from_slice(&body).ok()))
			}
		})
	}
}
