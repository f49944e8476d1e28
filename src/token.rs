//! Token store: persisted credential pair, single-flight refresh, and session teardown.
//!
//! [`TokenStore::refresh_token`] coalesces concurrent callers onto one in-flight exchange. The
//! first caller runs the exchange inside a shared [`OnceCell`]; everyone who arrives before it
//! completes awaits the same cell and receives the same outcome, success or failure. The flight
//! slot is cleared once the exchange settles so a later expiry starts a fresh flight.
//! [`TokenStore::refresh_token_after`] also skips the network entirely when the stored access
//! token already differs from the one the caller was rejected with.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{AuthService, CredentialPair},
	error::AuthError,
	obs::{self, FlowKind},
	storage::{KeyValueStorage, StorageError},
};

/// Storage key holding the serialized credential pair.
pub const DEFAULT_STORAGE_KEY: &str = "auth_token";

type RefreshOutcome = Result<Option<CredentialPair>, AuthError>;
type Flight = Arc<OnceCell<RefreshOutcome>>;

/// Owner of the persisted credential pair.
pub struct TokenStore {
	storage: Arc<dyn KeyValueStorage>,
	auth: Arc<dyn AuthService>,
	key: String,
	inflight: Mutex<Option<Flight>>,
	metrics: RefreshMetrics,
}
impl TokenStore {
	/// Creates a store persisting under [`DEFAULT_STORAGE_KEY`].
	pub fn new(storage: Arc<dyn KeyValueStorage>, auth: Arc<dyn AuthService>) -> Self {
		Self {
			storage,
			auth,
			key: DEFAULT_STORAGE_KEY.into(),
			inflight: Mutex::new(None),
			metrics: RefreshMetrics::default(),
		}
	}

	/// Overrides the storage key.
	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = key.into();

		self
	}

	/// Storage key holding the pair.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Refresh counters for this store.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Reads the stored pair; missing, unreadable, or malformed data yields `None`.
	pub fn get_token(&self) -> Option<CredentialPair> {
		let raw = self.storage.get(&self.key).ok()??;

		serde_json::from_str(&raw).ok()
	}

	/// Persists `pair`, replacing any previous value.
	pub fn set_token(&self, pair: &CredentialPair) -> Result<(), StorageError> {
		let raw = serde_json::to_string(pair)
			.map_err(|e| StorageError::Serialization { message: e.to_string() })?;

		self.storage.set(&self.key, raw)
	}

	/// Erases the stored pair without contacting the auth service.
	pub fn clear(&self) -> Result<(), StorageError> {
		obs::observe_sync(FlowKind::Erase, "clear", || self.storage.remove(&self.key))
	}

	/// Exchanges the stored refresh token for a new pair.
	///
	/// Returns `Ok(None)` when the service answered without a pair; storage is left untouched in
	/// that case. Any failure tears the session down through [`TokenStore::remove_token`] before
	/// the error is returned.
	pub async fn refresh_token(&self) -> Result<Option<CredentialPair>, AuthError> {
		self.refresh_token_after(None).await
	}

	/// Like [`TokenStore::refresh_token`], but returns the stored pair without an exchange when
	/// its access token is no longer `stale_access`.
	pub async fn refresh_token_after(
		&self,
		stale_access: Option<&str>,
	) -> Result<Option<CredentialPair>, AuthError> {
		let rotated = stale_access.and_then(|stale| {
			self.get_token()
				.filter(|current| current.access_token().is_some_and(|access| access != stale))
		});

		if let Some(current) = rotated {
			self.metrics.record_reused();

			return Ok(Some(current));
		}

		let flight = self.inflight.lock().get_or_insert_with(|| Arc::new(OnceCell::new())).clone();
		let mut led = false;
		let outcome = flight
			.get_or_init(|| {
				led = true;

				self.fly(&flight)
			})
			.await
			.clone();

		if !led {
			self.metrics.record_coalesced();
		}

		outcome
	}

	/// Ends the session: remote logout, then an unconditional local erase.
	///
	/// The erase also runs if this future is dropped mid-logout. A logout failure is returned
	/// after the erase has happened.
	pub async fn remove_token(&self) -> Result<(), AuthError> {
		obs::observe(FlowKind::Logout, "remove_token", async {
			let current = self.get_token();
			let guard = EraseGuard::new(self);
			let logout = self.auth.logout(current.as_ref()).await;
			let erased = guard.erase();

			logout?;
			erased?;

			Ok::<_, AuthError>(())
		})
		.await
	}

	async fn fly(&self, flight: &Flight) -> RefreshOutcome {
		self.metrics.record_attempt();

		let result = obs::observe(FlowKind::Refresh, "refresh_token", async {
			let outcome = self.exchange().await;

			// The exchange error is what callers see; a failed teardown is only counted.
			if outcome.is_err() && self.remove_token().await.is_err() {
				self.metrics.record_teardown_failure();
			}

			outcome
		})
		.await;

		{
			let mut slot = self.inflight.lock();

			if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, flight)) {
				*slot = None;
			}
		}

		match &result {
			Ok(_) => self.metrics.record_success(),
			Err(_) => self.metrics.record_failure(),
		}

		result
	}

	async fn exchange(&self) -> RefreshOutcome {
		let current = self.get_token();
		let refresh = current
			.as_ref()
			.and_then(CredentialPair::refresh_token)
			.ok_or(AuthError::MissingRefreshToken)?;
		let renewed = self.auth.refresh(refresh).await?;

		if let Some(pair) = &renewed {
			self.set_token(pair)?;
		}

		Ok(renewed)
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore")
			.field("key", &self.key)
			.field("refresh_in_flight", &self.inflight.lock().is_some())
			.field("metrics", &self.metrics)
			.finish()
	}
}

/// Erases the stored pair when dropped unless [`EraseGuard::erase`] already ran.
struct EraseGuard<'a> {
	store: &'a TokenStore,
	armed: bool,
}
impl<'a> EraseGuard<'a> {
	fn new(store: &'a TokenStore) -> Self {
		Self { store, armed: true }
	}

	fn erase(mut self) -> Result<(), StorageError> {
		self.armed = false;

		self.store.clear()
	}
}
impl Drop for EraseGuard<'_> {
	fn drop(&mut self) {
		if self.armed {
			// `clear` records its own failure; a drop has nowhere to return it.
			let _ = self.store.clear();
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		sync::atomic::{AtomicBool, AtomicUsize, Ordering},
		time::Duration,
	};
	// self
	use super::*;
	use crate::{auth::AuthFuture, storage::MemoryStorage};

	struct FakeAuth {
		refresh_outcome: Mutex<RefreshOutcome>,
		logout_outcome: Result<(), AuthError>,
		delay: Option<Duration>,
		refresh_calls: AtomicUsize,
		logout_calls: AtomicUsize,
	}
	impl FakeAuth {
		fn issuing(pair: CredentialPair) -> Self {
			Self {
				refresh_outcome: Mutex::new(Ok(Some(pair))),
				logout_outcome: Ok(()),
				delay: None,
				refresh_calls: AtomicUsize::new(0),
				logout_calls: AtomicUsize::new(0),
			}
		}

		fn rejecting(err: AuthError) -> Self {
			let auth = Self::issuing(CredentialPair::default());

			*auth.refresh_outcome.lock() = Err(err);

			auth
		}

		fn with_delay(mut self, delay: Duration) -> Self {
			self.delay = Some(delay);

			self
		}

		fn with_logout_failure(mut self) -> Self {
			self.logout_outcome = Err(AuthError::Network { message: "logout unreachable".into() });

			self
		}
	}
	impl AuthService for FakeAuth {
		fn refresh<'a>(&'a self, _refresh: &'a str) -> AuthFuture<'a, Option<CredentialPair>> {
			Box::pin(async move {
				self.refresh_calls.fetch_add(1, Ordering::SeqCst);

				if let Some(delay) = self.delay {
					tokio::time::sleep(delay).await;
				}

				self.refresh_outcome.lock().clone()
			})
		}

		fn logout<'a>(&'a self, _credentials: Option<&'a CredentialPair>) -> AuthFuture<'a, ()> {
			Box::pin(async move {
				self.logout_calls.fetch_add(1, Ordering::SeqCst);

				self.logout_outcome.clone()
			})
		}
	}

	/// Memory storage whose erase can be made to fail.
	#[derive(Default)]
	struct StickyStorage {
		inner: MemoryStorage,
		fail_removes: AtomicBool,
	}
	impl KeyValueStorage for StickyStorage {
		fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
			self.inner.get(key)
		}

		fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
			self.inner.set(key, value)
		}

		fn remove(&self, key: &str) -> Result<(), StorageError> {
			if self.fail_removes.load(Ordering::SeqCst) {
				return Err(StorageError::Backend { message: "disk unavailable".into() });
			}

			self.inner.remove(key)
		}
	}

	fn store_with(auth: Arc<FakeAuth>) -> (TokenStore, MemoryStorage) {
		let storage = MemoryStorage::default();
		let store = TokenStore::new(Arc::new(storage.clone()), auth);

		(store, storage)
	}

	#[test]
	fn get_token_tolerates_missing_and_malformed_data() {
		let (store, storage) = store_with(Arc::new(FakeAuth::issuing(CredentialPair::default())));

		assert!(store.get_token().is_none());

		storage.set(DEFAULT_STORAGE_KEY, "{not json".into()).expect("Memory set should succeed.");

		assert!(store.get_token().is_none());

		store.set_token(&CredentialPair::new("a1", "r1")).expect("Set should succeed.");

		assert_eq!(store.get_token(), Some(CredentialPair::new("a1", "r1")));
	}

	#[tokio::test]
	async fn refresh_persists_new_pair() {
		let auth = Arc::new(FakeAuth::issuing(CredentialPair::new("a2", "r2")));
		let (store, _) = store_with(auth.clone());

		store.set_token(&CredentialPair::new("a1", "r1")).expect("Seed should succeed.");

		let pair = store
			.refresh_token()
			.await
			.expect("Refresh should succeed.")
			.expect("Refresh should yield a pair.");

		assert_eq!(pair.access_token(), Some("a2"));
		assert_eq!(store.get_token(), Some(CredentialPair::new("a2", "r2")));
		assert_eq!(store.refresh_metrics().successes(), 1);
	}

	#[tokio::test]
	async fn refresh_without_refresh_token_tears_session_down() {
		let auth = Arc::new(FakeAuth::issuing(CredentialPair::new("unused", "unused")));
		let (store, storage) = store_with(auth.clone());
		let mut access_only = CredentialPair::new("a1", "");

		access_only.refresh = None;
		store.set_token(&access_only).expect("Seed should succeed.");

		let err = store.refresh_token().await.expect_err("Missing refresh token should fail.");

		assert_eq!(err, AuthError::MissingRefreshToken);
		assert!(storage.is_empty());
		assert_eq!(auth.refresh_calls.load(Ordering::SeqCst), 0);
		assert_eq!(auth.logout_calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn rejected_refresh_erases_credentials() {
		let rejection = AuthError::Rejected {
			status: 401,
			message: "Request failed with status code 401.".into(),
			server_message: None,
		};
		let auth = Arc::new(FakeAuth::rejecting(rejection.clone()).with_logout_failure());
		let (store, storage) = store_with(auth);

		store.set_token(&CredentialPair::new("a1", "r1")).expect("Seed should succeed.");

		let err = store.refresh_token().await.expect_err("Rejected refresh should fail.");

		assert_eq!(err, rejection);
		assert!(storage.is_empty());
		assert_eq!(store.refresh_metrics().failures(), 1);
	}

	#[tokio::test]
	async fn empty_refresh_response_keeps_storage() {
		let auth = Arc::new(FakeAuth::issuing(CredentialPair::default()));

		*auth.refresh_outcome.lock() = Ok(None);

		let (store, _) = store_with(auth);

		store.set_token(&CredentialPair::new("a1", "r1")).expect("Seed should succeed.");

		assert_eq!(store.refresh_token().await, Ok(None));
		assert_eq!(store.get_token(), Some(CredentialPair::new("a1", "r1")));
	}

	#[tokio::test]
	async fn remove_token_erases_even_when_logout_fails() {
		let auth =
			Arc::new(FakeAuth::issuing(CredentialPair::default()).with_logout_failure());
		let (store, storage) = store_with(auth.clone());

		store.set_token(&CredentialPair::new("a1", "r1")).expect("Seed should succeed.");

		let err = store.remove_token().await.expect_err("Logout failure should surface.");

		assert!(matches!(err, AuthError::Network { .. }));
		assert!(storage.is_empty());
		assert_eq!(auth.logout_calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn concurrent_refreshes_share_one_exchange() {
		let auth = Arc::new(
			FakeAuth::issuing(CredentialPair::new("a2", "r2"))
				.with_delay(Duration::from_millis(50)),
		);
		let (store, _) = store_with(auth.clone());

		store.set_token(&CredentialPair::new("a1", "r1")).expect("Seed should succeed.");

		let (first, second, third) =
			tokio::join!(store.refresh_token(), store.refresh_token(), store.refresh_token());

		for outcome in [first, second, third] {
			let pair = outcome.expect("Refresh should succeed.").expect("Pair should exist.");

			assert_eq!(pair.access_token(), Some("a2"));
		}

		assert_eq!(auth.refresh_calls.load(Ordering::SeqCst), 1);
		assert_eq!(store.refresh_metrics().attempts(), 1);
		assert_eq!(store.refresh_metrics().coalesced(), 2);

		// The settled flight is released; the next expiry triggers a new exchange.
		store.refresh_token().await.expect("Second flight should succeed.");

		assert_eq!(auth.refresh_calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn concurrent_failures_share_one_teardown() {
		let auth = Arc::new(
			FakeAuth::rejecting(AuthError::Network { message: "offline".into() })
				.with_delay(Duration::from_millis(50)),
		);
		let (store, storage) = store_with(auth.clone());

		store.set_token(&CredentialPair::new("a1", "r1")).expect("Seed should succeed.");

		let (first, second) = tokio::join!(store.refresh_token(), store.refresh_token());

		assert!(first.is_err());
		assert_eq!(first, second);
		assert!(storage.is_empty());
		assert_eq!(auth.refresh_calls.load(Ordering::SeqCst), 1);
		assert_eq!(auth.logout_calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn rotated_pair_is_reused_without_exchange() {
		let auth = Arc::new(FakeAuth::issuing(CredentialPair::new("unused", "unused")));
		let (store, _) = store_with(auth.clone());

		store.set_token(&CredentialPair::new("a2", "r2")).expect("Seed should succeed.");

		let pair = store
			.refresh_token_after(Some("a1"))
			.await
			.expect("Reuse should succeed.")
			.expect("Reuse should yield the stored pair.");

		assert_eq!(pair.access_token(), Some("a2"));
		assert_eq!(auth.refresh_calls.load(Ordering::SeqCst), 0);
		assert_eq!(store.refresh_metrics().reused(), 1);
	}

	#[tokio::test]
	async fn failed_teardown_is_counted_and_pair_stays_visible() {
		let auth = Arc::new(FakeAuth::rejecting(AuthError::Network { message: "offline".into() }));
		let storage = Arc::new(StickyStorage::default());
		let store = TokenStore::new(storage.clone(), auth.clone());

		store.set_token(&CredentialPair::new("a1", "r1")).expect("Seed should succeed.");
		storage.fail_removes.store(true, Ordering::SeqCst);

		let err = store.refresh_token().await.expect_err("Refresh should fail.");

		assert!(matches!(err, AuthError::Network { .. }));
		assert_eq!(auth.logout_calls.load(Ordering::SeqCst), 1);
		assert_eq!(store.refresh_metrics().teardown_failures(), 1);
		assert_eq!(store.get_token(), Some(CredentialPair::new("a1", "r1")));
		assert!(store.clear().is_err());

		storage.fail_removes.store(false, Ordering::SeqCst);
		store.clear().expect("Erase should succeed once storage recovers.");

		assert_eq!(store.get_token(), None);
	}

	#[tokio::test]
	async fn cancelled_leader_hands_flight_to_waiter() {
		let auth = Arc::new(
			FakeAuth::issuing(CredentialPair::new("a2", "r2"))
				.with_delay(Duration::from_millis(50)),
		);
		let (store, _) = store_with(auth.clone());

		store.set_token(&CredentialPair::new("a1", "r1")).expect("Seed should succeed.");

		let (leader, waiter) = tokio::join!(
			tokio::time::timeout(Duration::from_millis(10), store.refresh_token()),
			store.refresh_token(),
		);

		assert!(leader.is_err());

		let pair = waiter.expect("Waiter should finish the flight.").expect("Pair should exist.");

		assert_eq!(pair.access_token(), Some("a2"));
		assert_eq!(store.get_token(), Some(CredentialPair::new("a2", "r2")));
		// The cancelled exchange plus the waiter's own.
		assert_eq!(auth.refresh_calls.load(Ordering::SeqCst), 2);
		assert!(store.inflight.lock().is_none());
	}
}
