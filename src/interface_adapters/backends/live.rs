use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::domain::errors::AuthError;
use crate::domain::identity::{AuthProvider, Identity};
use crate::domain::ports::{
    Clock, CredentialBackend, IdentityProvider, ProviderCredential, ProviderError,
    ProviderSessionEvent, SessionUpdate,
};

// Fixed mapping from provider error codes to the classified error set.
fn classify(error: ProviderError) -> AuthError {
    match error.code.as_str() {
        "invalid-email" | "wrong-password" | "user-not-found" => AuthError::InvalidCredentials,
        "email-in-use" => AuthError::EmailAlreadyRegistered,
        "weak-password" => AuthError::WeakPassword,
        "network" => AuthError::Network,
        "cancelled" => AuthError::Cancelled,
        "provider-failure" => AuthError::ProviderFailure,
        _ => AuthError::Unknown(error.detail),
    }
}

fn identity_from_credential(
    credential: ProviderCredential,
    provider: AuthProvider,
    now_epoch_seconds: u64,
) -> Identity {
    // The provider uid is not reused as our key: every authentication
    // mints a distinct record, federated and password ones included.
    Identity {
        id: uuid::Uuid::new_v4(),
        email: credential.email,
        display_name: credential.display_name,
        profile_image_url: credential.photo_url,
        provider,
        created_at: now_epoch_seconds,
        last_login_at: now_epoch_seconds,
    }
}

// Credential backend delegating every operation to an external
// identity provider. Owns the ambient session-change channel and
// forwards provider push events as SessionUpdates.
pub struct LiveBackend<P, C> {
    provider: P,
    clock: C,
    current: Arc<watch::Sender<Option<Identity>>>,
}

impl<P, C> LiveBackend<P, C>
where
    P: IdentityProvider,
    C: Clock,
{
    pub fn new(provider: P, clock: C) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            provider,
            clock,
            current: Arc::new(current),
        }
    }

    fn remember(&self, credential: ProviderCredential, provider: AuthProvider) -> Identity {
        let identity =
            identity_from_credential(credential, provider, self.clock.now_epoch_seconds());
        self.current.send_replace(Some(identity.clone()));
        identity
    }
}

#[async_trait]
impl<P, C> CredentialBackend for LiveBackend<P, C>
where
    P: IdentityProvider,
    C: Clock + Clone + 'static,
{
    async fn sign_in_federated(&self) -> Result<Identity, AuthError> {
        let credential = self.provider.federated_sign_in().await.map_err(classify)?;
        Ok(self.remember(credential, AuthProvider::Federated))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let credential = self
            .provider
            .password_sign_in(email, password)
            .await
            .map_err(classify)?;
        Ok(self.remember(credential, AuthProvider::Password))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity, AuthError> {
        let credential = self
            .provider
            .sign_up(email, password, display_name)
            .await
            .map_err(classify)?;
        Ok(self.remember(credential, AuthProvider::Password))
    }

    async fn sign_out(&self) {
        // Provider-side revocation is best effort; the local session
        // always clears.
        if let Err(error) = self.provider.sign_out().await {
            warn!(code = %error.code, "provider sign-out failed");
        }
        self.current.send_replace(None);
    }

    async fn validate_session(&self) -> bool {
        self.provider.session_valid().await.unwrap_or(false)
    }

    async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        self.provider.reset_password(email).await.map_err(classify)
    }

    fn session_updates(&self) -> Option<mpsc::UnboundedReceiver<SessionUpdate>> {
        let mut events = self.provider.session_events()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let clock = self.clock.clone();
        let current = Arc::clone(&self.current);

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let update = match event {
                    ProviderSessionEvent::SignedIn {
                        credential,
                        provider,
                    } => {
                        let identity = identity_from_credential(
                            credential,
                            provider,
                            clock.now_epoch_seconds(),
                        );
                        current.send_replace(Some(identity.clone()));
                        SessionUpdate::SignedIn(identity)
                    }
                    ProviderSessionEvent::SignedOut => {
                        current.send_replace(None);
                        SessionUpdate::SignedOut
                    }
                };
                if tx.send(update).is_err() {
                    break;
                }
            }
        });

        Some(rx)
    }

    fn current_identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }
}
