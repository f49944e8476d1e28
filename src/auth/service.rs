//! Remote auth service contract (refresh + logout) and its HTTP implementation.

// self
use crate::{
	_prelude::*,
	auth::CredentialPair,
	error::AuthError,
	http::{HttpTransport, Method, TransportRequest},
};

/// Boxed future returned by [`AuthService`] methods.
pub type AuthFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AuthError>> + 'a + Send>>;

/// Remote endpoints that issue and revoke credential pairs.
pub trait AuthService
where
	Self: Send + Sync,
{
	/// Exchanges `refresh_token` for a new pair; `None` when the service answered without one.
	fn refresh<'a>(&'a self, refresh_token: &'a str) -> AuthFuture<'a, Option<CredentialPair>>;

	/// Ends the remote session described by `credentials`.
	fn logout<'a>(&'a self, credentials: Option<&'a CredentialPair>) -> AuthFuture<'a, ()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
	refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshEnvelope {
	#[serde(default)]
	data: Option<CredentialPair>,
}

/// [`AuthService`] speaking JSON over an [`HttpTransport`].
///
/// Refresh posts `{"refreshToken": ..}` and expects `{"data": {"access": .., "refresh": ..}}`.
/// Logout posts an empty request carrying the current bearer token.
pub struct HttpAuthService<C>
where
	C: ?Sized + HttpTransport,
{
	transport: Arc<C>,
	refresh_url: Url,
	logout_url: Url,
}
impl<C> HttpAuthService<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a service bound to the provided endpoints.
	pub fn new(transport: impl Into<Arc<C>>, refresh_url: Url, logout_url: Url) -> Self {
		Self { transport: transport.into(), refresh_url, logout_url }
	}

	/// Refresh endpoint URL.
	pub fn refresh_url(&self) -> &Url {
		&self.refresh_url
	}

	/// Logout endpoint URL.
	pub fn logout_url(&self) -> &Url {
		&self.logout_url
	}
}
impl<C> AuthService for HttpAuthService<C>
where
	C: ?Sized + HttpTransport,
{
	fn refresh<'a>(&'a self, refresh_token: &'a str) -> AuthFuture<'a, Option<CredentialPair>> {
		Box::pin(async move {
			let mut request = TransportRequest::new(Method::Post, self.refresh_url.clone());

			request.body = Some(
				serde_json::to_value(RefreshBody { refresh_token }).map_err(|e| {
					AuthError::MalformedResponse { status: None, message: e.to_string() }
				})?,
			);

			let response = self.transport.send(request).await?;
			let envelope =
				response.decode::<Option<RefreshEnvelope>>().map_err(|e| {
					AuthError::MalformedResponse { status: e.status(), message: e.to_string() }
				})?;

			Ok(envelope.and_then(|envelope| envelope.data))
		})
	}

	fn logout<'a>(&'a self, credentials: Option<&'a CredentialPair>) -> AuthFuture<'a, ()> {
		Box::pin(async move {
			let mut request = TransportRequest::new(Method::Post, self.logout_url.clone());

			if let Some(access) = credentials.and_then(CredentialPair::access_token) {
				request.set_bearer(access);
			}

			self.transport.send(request).await?;

			Ok(())
		})
	}
}
impl<C> Debug for HttpAuthService<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpAuthService")
			.field("refresh_url", &self.refresh_url.as_str())
			.field("logout_url", &self.logout_url.as_str())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::http::{TransportFailure, TransportFuture, TransportResponse};

	struct CannedTransport {
		outcome: Result<TransportResponse, TransportFailure>,
		seen: Mutex<Vec<TransportRequest>>,
	}
	impl CannedTransport {
		fn new(outcome: Result<TransportResponse, TransportFailure>) -> Self {
			Self { outcome, seen: Mutex::new(Vec::new()) }
		}
	}
	impl HttpTransport for CannedTransport {
		fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
			self.seen.lock().push(request);

			let outcome = self.outcome.clone();

			Box::pin(async move { outcome })
		}
	}

	fn service(transport: Arc<CannedTransport>) -> HttpAuthService<CannedTransport> {
		HttpAuthService::<CannedTransport>::new(
			transport,
			Url::parse("https://auth.example.com/auth/refresh").expect("Refresh URL should parse."),
			Url::parse("https://auth.example.com/auth/logout").expect("Logout URL should parse."),
		)
	}

	#[tokio::test]
	async fn refresh_posts_camel_case_body_and_unwraps_data() {
		let transport = Arc::new(CannedTransport::new(Ok(TransportResponse::json(
			200,
			&serde_json::json!({ "data": { "access": "a2", "refresh": "r2" } }),
		))));
		let pair = service(transport.clone())
			.refresh("r1")
			.await
			.expect("Refresh should succeed.")
			.expect("Refresh should yield a pair.");

		assert_eq!(pair.access_token(), Some("a2"));

		let seen = transport.seen.lock();

		assert_eq!(seen[0].method, Method::Post);
		assert_eq!(seen[0].body, Some(serde_json::json!({ "refreshToken": "r1" })));
	}

	#[tokio::test]
	async fn refresh_without_data_yields_none() {
		let transport = Arc::new(CannedTransport::new(Ok(TransportResponse::json(
			200,
			&serde_json::json!({ "data": null }),
		))));

		assert_eq!(service(transport).refresh("r1").await, Ok(None));
	}

	#[tokio::test]
	async fn refresh_rejection_maps_to_auth_error() {
		let transport = Arc::new(CannedTransport::new(Err(TransportFailure::from_status(
			401,
			Some(serde_json::json!({ "message": "Refresh token expired." })),
		))));
		let err = service(transport).refresh("r1").await.expect_err("Rejection should fail.");

		assert_eq!(err.status(), Some(401));
		assert_eq!(err.server_message(), Some("Refresh token expired."));
	}

	#[tokio::test]
	async fn logout_carries_current_bearer() {
		let transport = Arc::new(CannedTransport::new(Ok(TransportResponse::default())));
		let pair = CredentialPair::new("a1", "r1");

		service(transport.clone()).logout(Some(&pair)).await.expect("Logout should succeed.");

		assert_eq!(transport.seen.lock()[0].bearer(), Some("a1"));
	}
}
