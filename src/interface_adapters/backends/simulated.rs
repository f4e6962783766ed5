use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use crate::domain::errors::AuthError;
use crate::domain::identity::{AuthProvider, Identity};
use crate::domain::ports::{Clock, CredentialBackend, MIN_PASSWORD_LEN};

// Fixed identity handed out by the simulated federated flow.
const FEDERATED_TEST_EMAIL: &str = "test@federated.dev";
const FEDERATED_TEST_NAME: &str = "Test Driver (Federated)";

// Account record held by the in-memory user table.
#[derive(Clone, Debug)]
struct SimulatedAccount {
    password: String,
    display_name: Option<String>,
}

// In-memory credential backend for local/offline development and
// tests. Reproduces the live backend's success/error contract; the
// optional latency holds the authenticating state long enough for
// subscribers to observe it.
pub struct SimulatedBackend<C> {
    accounts: Mutex<HashMap<String, SimulatedAccount>>,
    current: watch::Sender<Option<Identity>>,
    clock: C,
    latency: Duration,
}

impl<C: Clock> SimulatedBackend<C> {
    pub fn new(clock: C) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current,
            clock,
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    // Register an account without going through sign_up validation.
    pub async fn seed_account(&self, email: &str, password: &str, display_name: Option<&str>) {
        let mut accounts = self.accounts.lock().await;
        accounts.insert(
            email.to_string(),
            SimulatedAccount {
                password: password.to_string(),
                display_name: display_name.map(str::to_string),
            },
        );
    }

    pub async fn has_account(&self, email: &str) -> bool {
        let accounts = self.accounts.lock().await;
        accounts.contains_key(email)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn remember(&self, identity: Identity) -> Identity {
        self.current.send_replace(Some(identity.clone()));
        identity
    }
}

#[async_trait]
impl<C: Clock> CredentialBackend for SimulatedBackend<C> {
    async fn sign_in_federated(&self) -> Result<Identity, AuthError> {
        self.simulate_latency().await;

        let identity = Identity::new(
            FEDERATED_TEST_EMAIL,
            Some(FEDERATED_TEST_NAME.to_string()),
            AuthProvider::Federated,
            self.clock.now_epoch_seconds(),
        );
        Ok(self.remember(identity))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        self.simulate_latency().await;

        let accounts = self.accounts.lock().await;
        match accounts.get(email) {
            Some(account) if account.password == password => {
                let identity = Identity::new(
                    email,
                    account.display_name.clone(),
                    AuthProvider::Password,
                    self.clock.now_epoch_seconds(),
                );
                Ok(self.remember(identity))
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity, AuthError> {
        self.simulate_latency().await;

        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(email) {
            return Err(AuthError::EmailAlreadyRegistered);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        accounts.insert(
            email.to_string(),
            SimulatedAccount {
                password: password.to_string(),
                display_name: display_name.map(str::to_string),
            },
        );

        let identity = Identity::new(
            email,
            display_name.map(str::to_string),
            AuthProvider::Password,
            self.clock.now_epoch_seconds(),
        );
        Ok(self.remember(identity))
    }

    async fn sign_out(&self) {
        self.current.send_replace(None);
    }

    async fn validate_session(&self) -> bool {
        self.current.borrow().is_some()
    }

    async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        self.simulate_latency().await;

        let accounts = self.accounts.lock().await;
        if accounts.contains_key(email) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    fn current_identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }
}
