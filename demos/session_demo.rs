//! Walks through a session lifecycle against a local mock API.
//!
//! 1. Seed the token store with an expired access token.
//! 2. Call a protected endpoint; the 401 triggers one refresh and a replay with the new token.
//! 3. Swap the toast sink and hit an endpoint that fails with a server message.
//! 4. Log out, which calls the logout endpoint and erases local credentials.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;
// self
use authed_request::{
	ReqwestRequestClient, RequestSpec,
	auth::CredentialPair,
	config::ClientConfig,
	report::ErrorReporter,
	storage::MemoryStorage,
	toast::Toast,
};

#[derive(Debug, Deserialize)]
struct Profile {
	id: u64,
	name: String,
}

struct PrefixedToast;
impl Toast for PrefixedToast {
	fn show(&self, message: &str) {
		println!("[toast] {message}");
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer demo-access-1");
			then.status(401).json_body(json!({ "message": "Access token expired." }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").json_body(json!({ "refreshToken": "demo-refresh-1" }));
			then.status(200)
				.json_body(json!({ "data": { "access": "demo-access-2", "refresh": "demo-refresh-2" } }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer demo-access-2");
			then.status(200).json_body(json!({ "id": 7, "name": "Ada" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(PATCH).path("/me");
			then.status(422).json_body(json!({ "message": "Name must not be empty." }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/logout");
			then.status(204);
		})
		.await;

	let config = ClientConfig::with_base_url(&server.base_url())?;
	let client = ReqwestRequestClient::from_config(&config, Arc::new(MemoryStorage::default()))?;

	client.tokens().set_token(&CredentialPair::new("demo-access-1", "demo-refresh-1"))?;

	let profile = client.request_or_raise::<Profile>(&RequestSpec::get("/me")).await?;

	println!("Signed in as #{} {}.", profile.id, profile.name);
	println!("Refresh metrics: {:?}.", client.tokens().refresh_metrics());

	ErrorReporter::global().set_toast(Arc::new(PrefixedToast));

	let update = client
		.request_result::<serde_json::Value>(&RequestSpec::patch("/me").body(json!({ "name": "" })))
		.await;

	println!("Update result: {}.", serde_json::to_string(&update)?);

	client.tokens().remove_token().await?;

	println!("Stored credentials after logout: {:?}.", client.tokens().get_token());

	Ok(())
}
