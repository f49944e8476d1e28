//! Declarative request description consumed by [`RequestClient`](crate::client::RequestClient).

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{Method, TransportRequest},
	path,
};

/// Caller-supplied description of one logical call.
///
/// The three behavior flags default to `false`:
///
/// - `ignore_auth` sends the call without a bearer token and opts it out of refresh-and-retry.
/// - `silent_error` suppresses the user notification for ordinary failures. Session expiry is
///   still reported.
/// - `throw_error` makes [`RequestClient::request`](crate::client::RequestClient::request)
///   return `Err` instead of a failure [`ApiResponse`](crate::response::ApiResponse).
#[derive(Clone, Debug, Default)]
pub struct RequestSpec {
	/// HTTP method.
	pub method: Method,
	/// URL template, relative to the client's base URL or absolute.
	pub url: String,
	/// Values for the template's placeholders.
	pub path_variables: BTreeMap<String, String>,
	/// Query parameters.
	pub query: Vec<(String, String)>,
	/// Extra headers.
	pub headers: BTreeMap<String, String>,
	/// JSON body.
	pub body: Option<serde_json::Value>,
	/// Skip bearer injection and the refresh protocol.
	pub ignore_auth: bool,
	/// Suppress user notification of ordinary failures.
	pub silent_error: bool,
	/// Raise failures instead of returning them as a value.
	pub throw_error: bool,
}
impl RequestSpec {
	/// Creates a spec for `method` + URL template.
	pub fn new(method: Method, url: impl Into<String>) -> Self {
		Self { method, url: url.into(), ..Default::default() }
	}

	/// `GET` shorthand.
	pub fn get(url: impl Into<String>) -> Self {
		Self::new(Method::Get, url)
	}

	/// `POST` shorthand.
	pub fn post(url: impl Into<String>) -> Self {
		Self::new(Method::Post, url)
	}

	/// `PUT` shorthand.
	pub fn put(url: impl Into<String>) -> Self {
		Self::new(Method::Put, url)
	}

	/// `PATCH` shorthand.
	pub fn patch(url: impl Into<String>) -> Self {
		Self::new(Method::Patch, url)
	}

	/// `DELETE` shorthand.
	pub fn delete(url: impl Into<String>) -> Self {
		Self::new(Method::Delete, url)
	}

	/// Supplies the value for placeholder `name`; numbers and strings both work.
	pub fn path_variable(mut self, name: impl Into<String>, value: impl ToString) -> Self {
		self.path_variables.insert(name.into(), value.to_string());

		self
	}

	/// Appends a query parameter.
	pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((name.into(), value.to_string()));

		self
	}

	/// Sets a header; names are case-insensitive.
	pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
		self.headers.insert(name.to_ascii_lowercase(), value.into());

		self
	}

	/// Sets a raw JSON body.
	pub fn body(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `body` as the JSON body.
	pub fn json<B>(self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		let value =
			serde_json::to_value(body).map_err(|source| ConfigError::InvalidBody { source })?;

		Ok(self.body(value))
	}

	/// Sets `ignore_auth`.
	pub fn ignore_auth(mut self, ignore: bool) -> Self {
		self.ignore_auth = ignore;

		self
	}

	/// Sets `silent_error`.
	pub fn silent_error(mut self, silent: bool) -> Self {
		self.silent_error = silent;

		self
	}

	/// Sets `throw_error`.
	pub fn throw_error(mut self, throw: bool) -> Self {
		self.throw_error = throw;

		self
	}

	/// Resolves the template against `base` into a dispatchable request.
	pub fn resolve(&self, base: Option<&Url>) -> Result<TransportRequest, ConfigError> {
		let resolved = path::substitute(&self.url, &self.path_variables)?;
		let mut request = TransportRequest::new(self.method, path::join(base, &resolved)?);

		for (name, value) in &self.headers {
			request.set_header(name, value.as_str());
		}

		request.query = self.query.clone();
		request.body = self.body.clone();

		Ok(request)
	}
}
