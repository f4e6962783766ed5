use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::domain::identity::Identity;
use crate::domain::ports::{
    Clock, IdentityProvider, IdentityStore, ProviderCredential, ProviderError,
    ProviderSessionEvent,
};
use crate::domain::state::SessionState;

// Shared fixed time source for deterministic tests.
#[derive(Clone, Copy)]
pub(crate) struct FixedClock(pub(crate) u64);

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> u64 {
        self.0
    }
}

pub(crate) fn sample_credential() -> ProviderCredential {
    ProviderCredential {
        uid: "provider-uid-1".to_string(),
        email: "driver@example.com".to_string(),
        display_name: Some("Driver".to_string()),
        photo_url: None,
    }
}

// Identity provider fake whose per-operation outcomes are set up front.
// The event sender feeds the ambient push channel.
pub(crate) struct ScriptedProvider {
    pub(crate) federated: Result<ProviderCredential, ProviderError>,
    pub(crate) password: Result<ProviderCredential, ProviderError>,
    pub(crate) sign_up: Result<ProviderCredential, ProviderError>,
    pub(crate) sign_out: Result<(), ProviderError>,
    pub(crate) session_valid: Result<bool, ProviderError>,
    pub(crate) reset_password: Result<(), ProviderError>,
    events_tx: mpsc::UnboundedSender<ProviderSessionEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<ProviderSessionEvent>>>,
}

impl ScriptedProvider {
    pub(crate) fn with_credential(credential: ProviderCredential) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            federated: Ok(credential.clone()),
            password: Ok(credential.clone()),
            sign_up: Ok(credential),
            sign_out: Ok(()),
            session_valid: Ok(true),
            reset_password: Ok(()),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    pub(crate) fn event_sender(&self) -> mpsc::UnboundedSender<ProviderSessionEvent> {
        self.events_tx.clone()
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    async fn federated_sign_in(&self) -> Result<ProviderCredential, ProviderError> {
        self.federated.clone()
    }

    async fn password_sign_in(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<ProviderCredential, ProviderError> {
        self.password.clone()
    }

    async fn sign_up(
        &self,
        _email: &str,
        _password: &str,
        _display_name: Option<&str>,
    ) -> Result<ProviderCredential, ProviderError> {
        self.sign_up.clone()
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_out.clone()
    }

    async fn session_valid(&self) -> Result<bool, ProviderError> {
        self.session_valid.clone()
    }

    async fn reset_password(&self, _email: &str) -> Result<(), ProviderError> {
        self.reset_password.clone()
    }

    fn session_events(&self) -> Option<mpsc::UnboundedReceiver<ProviderSessionEvent>> {
        self.events_rx
            .lock()
            .expect("events mutex poisoned")
            .take()
    }
}

// Identity store fake that records upserts and can simulate failure.
#[derive(Clone, Default)]
pub(crate) struct RecordingIdentityStore {
    upserts: Arc<Mutex<Vec<Identity>>>,
    should_fail_upsert: bool,
}

impl RecordingIdentityStore {
    pub(crate) fn failing() -> Self {
        Self {
            upserts: Arc::new(Mutex::new(Vec::new())),
            should_fail_upsert: true,
        }
    }

    pub(crate) fn recorded_upserts(&self) -> Vec<Identity> {
        self.upserts.lock().expect("upserts mutex poisoned").clone()
    }
}

#[async_trait]
impl IdentityStore for RecordingIdentityStore {
    async fn upsert(&self, identity: &Identity) -> Result<(), String> {
        if self.should_fail_upsert {
            return Err("upsert failed".to_string());
        }
        let mut upserts = self.upserts.lock().expect("upserts mutex poisoned");
        upserts.push(identity.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, String> {
        let upserts = self.upserts.lock().expect("upserts mutex poisoned");
        Ok(upserts
            .iter()
            .rev()
            .find(|identity| identity.email == email)
            .cloned())
    }
}

// Records every observed session state, starting with the current one.
// Backends need nonzero latency for intermediate states to be held
// long enough to observe.
pub(crate) struct StateRecorder {
    states: Arc<Mutex<Vec<SessionState>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl StateRecorder {
    pub(crate) fn attach(mut receiver: watch::Receiver<SessionState>) -> Self {
        let states = Arc::new(Mutex::new(vec![receiver.borrow().clone()]));
        let sink = Arc::clone(&states);
        let handle = tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let state = receiver.borrow_and_update().clone();
                sink.lock().expect("states mutex poisoned").push(state);
            }
        });
        Self { states, handle }
    }

    pub(crate) async fn finish(self) -> Vec<SessionState> {
        // Give the recorder a beat to drain the final change.
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.handle.abort();
        let _ = self.handle.await;
        self.states
            .lock()
            .expect("states mutex poisoned")
            .clone()
    }
}
