use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::domain::errors::AuthError;
use crate::domain::identity::Identity;
use crate::domain::ports::{CredentialBackend, IdentityStore, SessionUpdate};
use crate::domain::state::SessionState;

// Owns the single source-of-truth session state, forwards backend
// operations, and republishes backend-driven changes. Failures never
// propagate to callers; they are absorbed into a Failed state the
// presentation layer observes.
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn CredentialBackend>,
    state: watch::Sender<SessionState>,
    identity_store: Option<Arc<dyn IdentityStore>>,
}

impl SessionCoordinator {
    pub fn new(backend: Arc<dyn CredentialBackend>) -> Self {
        Self::build(backend, None)
    }

    pub fn with_identity_store(
        backend: Arc<dyn CredentialBackend>,
        identity_store: Arc<dyn IdentityStore>,
    ) -> Self {
        Self::build(backend, Some(identity_store))
    }

    fn build(
        backend: Arc<dyn CredentialBackend>,
        identity_store: Option<Arc<dyn IdentityStore>>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::SignedOut);
        let ambient = backend.session_updates();
        let coordinator = Self {
            inner: Arc::new(Inner {
                backend,
                state,
                identity_store,
            }),
        };
        if let Some(updates) = ambient {
            coordinator.spawn_ambient_forwarder(updates);
        }
        coordinator
    }

    // Drains the backend's ambient channel into the state slot. Each
    // update replaces the state wholesale, so a push arriving while an
    // explicit operation is in flight still leaves one complete value.
    fn spawn_ambient_forwarder(&self, mut updates: mpsc::UnboundedReceiver<SessionUpdate>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                let next = match update {
                    SessionUpdate::SignedIn(identity) => {
                        Inner::persist_identity(&inner.identity_store, &identity).await;
                        info!(email = %identity.email, "ambient sign-in");
                        SessionState::SignedIn(identity)
                    }
                    SessionUpdate::SignedOut => {
                        info!("ambient sign-out");
                        SessionState::SignedOut
                    }
                };
                inner.state.send_replace(next);
            }
        });
    }

    pub async fn sign_in_federated(&self) {
        self.authenticate(self.inner.backend.sign_in_federated())
            .await;
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) {
        self.authenticate(self.inner.backend.sign_in_with_password(email, password))
            .await;
    }

    pub async fn sign_up(&self, email: &str, password: &str, display_name: Option<&str>) {
        self.authenticate(self.inner.backend.sign_up(email, password, display_name))
            .await;
    }

    // Every sign-in/sign-up attempt passes through Authenticating; the
    // outcome published last wins when attempts overlap.
    async fn authenticate<F>(&self, operation: F)
    where
        F: Future<Output = Result<Identity, AuthError>>,
    {
        self.inner.state.send_replace(SessionState::Authenticating);

        match operation.await {
            Ok(identity) => {
                Inner::persist_identity(&self.inner.identity_store, &identity).await;
                info!(email = %identity.email, "signed in");
                self.inner
                    .state
                    .send_replace(SessionState::SignedIn(identity));
            }
            Err(error) => {
                warn!(error = %error, "authentication failed");
                self.inner.state.send_replace(SessionState::Failed(error));
            }
        }
    }

    pub async fn sign_out(&self) {
        self.inner.backend.sign_out().await;
        info!("signed out");
        self.inner.state.send_replace(SessionState::SignedOut);
    }

    pub async fn validate_session(&self) -> bool {
        self.inner.backend.validate_session().await
    }

    pub async fn reset_password(&self, email: &str) {
        if let Err(error) = self.inner.backend.reset_password(email).await {
            warn!(error = %error, "password reset failed");
            self.inner.state.send_replace(SessionState::Failed(error));
        }
    }

    // Clears a Failed state back to SignedOut without retrying.
    pub fn acknowledge_error(&self) {
        self.inner.state.send_if_modified(|state| {
            if matches!(state, SessionState::Failed(_)) {
                *state = SessionState::SignedOut;
                true
            } else {
                false
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    // Derived projections, recomputed from the current state on every
    // read so they cannot drift from it.
    pub fn is_busy(&self) -> bool {
        self.inner.state.borrow().is_busy()
    }

    pub fn last_error_message(&self) -> Option<String> {
        self.inner.state.borrow().error().map(AuthError::user_message)
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.inner.state.borrow().identity().cloned()
    }
}

impl Inner {
    // Best-effort persistence; a store failure is logged, never surfaced.
    async fn persist_identity(store: &Option<Arc<dyn IdentityStore>>, identity: &Identity) {
        if let Some(store) = store {
            if let Err(error) = store.upsert(identity).await {
                warn!(error = %error, "failed to persist identity");
            }
        }
    }
}
