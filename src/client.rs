//! Request pipeline: bearer injection, one-shot refresh-and-replay on 401, and failure reporting.
//!
//! Every logical call runs strictly in order: outgoing interceptor (bearer), dispatch, failure
//! interceptor, and at most one replay. The failure interceptor only refreshes for a 401 on the
//! initial attempt of an authenticated call; the replay's own 401 is final, which bounds every
//! call to a single refresh. Refresh itself is single-flight inside [`TokenStore`], so a burst of
//! expired calls produces one exchange.
//!
//! Three entry points expose the result/raise duality explicitly:
//!
//! - [`RequestClient::request_result`] never raises for call failures.
//! - [`RequestClient::request_or_raise`] always raises.
//! - [`RequestClient::request`] raises only when `throw_error` is set.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, HttpAuthService},
	config::ClientConfig,
	error::AuthError,
	http::{HttpTransport, TransportRequest, TransportResponse},
	obs::{self, FlowKind},
	report::ErrorReporter,
	request::RequestSpec,
	response::ApiResponse,
	storage::KeyValueStorage,
	token::TokenStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestRequestClient = RequestClient<ReqwestTransport>;

/// Per-call retry marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
	Initial,
	Replayed,
}

/// Why dispatch stopped without a response.
enum Interrupt {
	/// Refresh failed; the session-expired notice has already been shown.
	SessionExpired(AuthError),
	/// Ordinary failure, still subject to `silent_error` reporting.
	Failed(Error),
}

/// Authenticated request pipeline over an [`HttpTransport`].
///
/// The token store and error reporter are explicit collaborators so tests and embedding
/// applications can substitute their own instances.
pub struct RequestClient<C>
where
	C: ?Sized + HttpTransport,
{
	transport: Arc<C>,
	tokens: Arc<TokenStore>,
	reporter: Arc<ErrorReporter>,
	base_url: Option<Url>,
	session_expired_message: String,
	failure_message: String,
}
impl<C> RequestClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Assembles a client from its collaborators.
	pub fn new(
		transport: impl Into<Arc<C>>,
		tokens: Arc<TokenStore>,
		reporter: Arc<ErrorReporter>,
		config: &ClientConfig,
	) -> Self {
		Self {
			transport: transport.into(),
			tokens,
			reporter,
			base_url: config.base_url.clone(),
			session_expired_message: config.session_expired_message.clone(),
			failure_message: config.failure_message.clone(),
		}
	}

	/// Token store backing this client.
	pub fn tokens(&self) -> &Arc<TokenStore> {
		&self.tokens
	}

	/// Reporter receiving user-facing failures.
	pub fn reporter(&self) -> &Arc<ErrorReporter> {
		&self.reporter
	}

	/// Base URL relative templates are joined onto.
	pub fn base_url(&self) -> Option<&Url> {
		self.base_url.as_ref()
	}

	/// Runs `spec`; failures become [`ApiResponse::Failure`] unless `spec.throw_error` is set.
	pub async fn request<T>(&self, spec: &RequestSpec) -> Result<ApiResponse<T>>
	where
		T: DeserializeOwned,
	{
		match self.run(spec).await {
			Ok(data) => Ok(ApiResponse::Success { data }),
			Err(e) if spec.throw_error => Err(e),
			Err(e) => Ok(self.failure(&e)),
		}
	}

	/// Runs `spec`, always folding failures into [`ApiResponse::Failure`].
	pub async fn request_result<T>(&self, spec: &RequestSpec) -> ApiResponse<T>
	where
		T: DeserializeOwned,
	{
		match self.run(spec).await {
			Ok(data) => ApiResponse::Success { data },
			Err(e) => self.failure(&e),
		}
	}

	/// Runs `spec`, returning the decoded body or the failure.
	pub async fn request_or_raise<T>(&self, spec: &RequestSpec) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.run(spec).await
	}

	async fn run<T>(&self, spec: &RequestSpec) -> Result<T>
	where
		T: DeserializeOwned,
	{
		obs::observe(FlowKind::Request, "request", async {
			let outcome = match self.dispatch(spec).await {
				Ok(response) => response.decode::<T>(),
				Err(Interrupt::SessionExpired(e)) => return Err(Error::from(e)),
				Err(Interrupt::Failed(e)) => Err(e),
			};

			outcome.inspect_err(|e| self.report(spec, e))
		})
		.await
	}

	async fn dispatch(&self, spec: &RequestSpec) -> Result<TransportResponse, Interrupt> {
		let template = spec
			.resolve(self.base_url.as_ref())
			.map_err(|e| Interrupt::Failed(e.into()))?;
		let mut attempt = Attempt::Initial;
		let mut renewed: Option<CredentialPair> = None;

		loop {
			let request = self.authorize(spec, template.clone(), renewed.as_ref());
			let sent_access = request.bearer().map(ToOwned::to_owned);
			let failure = match self.transport.send(request).await {
				Ok(response) => return Ok(response),
				Err(failure) => failure,
			};

			if !failure.is_unauthorized() || spec.ignore_auth || attempt == Attempt::Replayed {
				return Err(Interrupt::Failed(failure.into()));
			}

			attempt = Attempt::Replayed;

			match self.tokens.refresh_token_after(sent_access.as_deref()).await {
				Ok(Some(pair)) if pair.access_token().is_some() => renewed = Some(pair),
				Ok(_) => return Err(Interrupt::Failed(failure.into())),
				Err(e) => {
					// Usually already erased by the store's teardown; a failed erase is retried here
					// and, if it fails again, becomes the reported cause.
					let e = match self.tokens.clear() {
						Ok(()) => e,
						Err(storage) => AuthError::Storage(storage),
					};

					self.reporter.show_error(&self.session_expired_message);

					return Err(Interrupt::SessionExpired(e));
				},
			}
		}
	}

	/// Outgoing interceptor: attaches the renewed or stored access token unless exempted.
	fn authorize(
		&self,
		spec: &RequestSpec,
		mut request: TransportRequest,
		renewed: Option<&CredentialPair>,
	) -> TransportRequest {
		if spec.ignore_auth {
			return request;
		}

		let stored;
		let access = match renewed {
			Some(pair) => pair.access_token(),
			None => {
				stored = self.tokens.get_token();

				stored.as_ref().and_then(CredentialPair::access_token)
			},
		};

		if let Some(access) = access {
			request.set_bearer(access);
		}

		request
	}

	fn report(&self, spec: &RequestSpec, e: &Error) {
		if spec.silent_error {
			return;
		}

		self.reporter.show_error(&e.user_message(&self.failure_message));
	}

	fn failure<T>(&self, e: &Error) -> ApiResponse<T> {
		ApiResponse::Failure {
			error_code: e.error_code(),
			error_message: e.user_message(&self.failure_message),
		}
	}
}
impl<C> RequestClient<C>
where
	C: HttpTransport,
{
	/// Wires a client whose auth service talks to `config`'s endpoints over the same transport.
	pub fn with_transport(
		transport: impl Into<Arc<C>>,
		storage: Arc<dyn KeyValueStorage>,
		reporter: Arc<ErrorReporter>,
		config: &ClientConfig,
	) -> Result<Self> {
		let transport = transport.into();
		let auth = HttpAuthService::<C>::new(
			transport.clone(),
			config.refresh_url()?,
			config.logout_url()?,
		);
		let tokens =
			TokenStore::new(storage, Arc::new(auth)).with_key(config.storage_key.clone());

		Ok(Self::new(transport, Arc::new(tokens), reporter, config))
	}
}
#[cfg(feature = "reqwest")]
impl RequestClient<ReqwestTransport> {
	/// Builds a reqwest-backed client reporting through [`ErrorReporter::global`].
	pub fn from_config(config: &ClientConfig, storage: Arc<dyn KeyValueStorage>) -> Result<Self> {
		let client = ReqwestClient::builder().build().map_err(|e| Error::Config(e.into()))?;

		Self::from_config_with_client(config, storage, client)
	}

	/// Like [`RequestClient::from_config`], reusing a caller-configured reqwest client.
	pub fn from_config_with_client(
		config: &ClientConfig,
		storage: Arc<dyn KeyValueStorage>,
		client: ReqwestClient,
	) -> Result<Self> {
		let transport = Arc::new(ReqwestTransport::with_client(client));
		let auth = HttpAuthService::<ReqwestTransport>::new(
			transport.clone(),
			config.refresh_url()?,
			config.logout_url()?,
		);
		let tokens =
			TokenStore::new(storage, Arc::new(auth)).with_key(config.storage_key.clone());

		Ok(Self::new(transport, Arc::new(tokens), ErrorReporter::global(), config))
	}
}
impl<C> Clone for RequestClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			tokens: self.tokens.clone(),
			reporter: self.reporter.clone(),
			base_url: self.base_url.clone(),
			session_expired_message: self.session_expired_message.clone(),
			failure_message: self.failure_message.clone(),
		}
	}
}
impl<C> Debug for RequestClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestClient")
			.field("base_url", &self.base_url.as_ref().map(Url::as_str))
			.field("tokens", &self.tokens)
			.finish()
	}
}
