use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::domain::errors::AuthError;
use crate::domain::identity::{AuthProvider, Identity};

// Shared password policy for sign-up across backend variants.
pub const MIN_PASSWORD_LEN: usize = 6;

// Session change pushed by a backend outside any explicit operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionUpdate {
    SignedIn(Identity),
    SignedOut,
}

// Port for credential backends. Two variants exist: a live backend
// delegating to an external identity provider and a simulated backend
// with an in-memory user table. Both honor the same error contract.
#[async_trait]
pub trait CredentialBackend: Send + Sync {
    async fn sign_in_federated(&self) -> Result<Identity, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Identity, AuthError>;

    // Duplicate email is rejected before password strength.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity, AuthError>;

    // Clears any locally held session; calling it again is a no-op.
    async fn sign_out(&self);

    // Reports whether a backend-held session is currently valid.
    // No side effects.
    async fn validate_session(&self) -> bool;

    // The live variant succeeds silently for unknown emails to prevent
    // account enumeration; the simulated variant fails with
    // InvalidCredentials so tests stay deterministic.
    async fn reset_password(&self, email: &str) -> Result<(), AuthError>;

    // Ambient session-change channel. Yields a receiver at most once;
    // the simulated variant has no ambient source.
    fn session_updates(&self) -> Option<mpsc::UnboundedReceiver<SessionUpdate>> {
        None
    }

    fn current_identity(&self) -> Option<Identity>;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}

// Port for durable identity persistence, keyed by id with unique email.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn upsert(&self, identity: &Identity) -> Result<(), String>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, String>;
}

// Raw credential shape returned by the external identity provider.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderCredential {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

// Provider-boundary failure before classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderError {
    pub code: String,
    pub detail: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            detail: detail.into(),
        }
    }

    pub fn network() -> Self {
        Self::new("network", "transport failure")
    }
}

// Session change pushed by the provider, before mapping to an Identity.
#[derive(Clone, Debug)]
pub enum ProviderSessionEvent {
    SignedIn {
        credential: ProviderCredential,
        provider: AuthProvider,
    },
    SignedOut,
}

// Port for the external identity provider consumed by the live backend.
// Each operation is an opaque asynchronous capability returning a raw
// credential or a coded error; classification happens in the backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn federated_sign_in(&self) -> Result<ProviderCredential, ProviderError>;

    async fn password_sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderCredential, ProviderError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<ProviderCredential, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    async fn session_valid(&self) -> Result<bool, ProviderError>;

    async fn reset_password(&self, email: &str) -> Result<(), ProviderError>;

    // Ambient push notifications from the provider, if the transport
    // supports them. Yields a receiver at most once.
    fn session_events(&self) -> Option<mpsc::UnboundedReceiver<ProviderSessionEvent>> {
        None
    }
}
