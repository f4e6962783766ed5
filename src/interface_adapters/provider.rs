use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::ports::{
    IdentityProvider, ProviderCredential, ProviderError, ProviderSessionEvent,
};

// Error envelope returned by the provider on non-success statuses.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct PasswordSignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ResetPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionStatusResponse {
    valid: bool,
}

// Thin reqwest client for the external identity provider endpoints.
// Transport failures become "network"; undecodable error bodies become
// "provider-failure"; everything else keeps the provider's own code.
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    events_tx: mpsc::UnboundedSender<ProviderSessionEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<ProviderSessionEvent>>>,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            http,
            base_url: base_url.into(),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        })
    }

    // Handle for transports that receive provider push notifications
    // (for example a websocket listener) to feed the ambient channel.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<ProviderSessionEvent> {
        self.events_tx.clone()
    }

    async fn post_credential<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ProviderCredential, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|_| ProviderError::network())?;

        if response.status().is_success() {
            return response
                .json::<ProviderCredential>()
                .await
                .map_err(|_| ProviderError::network());
        }

        Err(Self::decode_error(response).await)
    }

    async fn post_unit<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|_| ProviderError::network())?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(Self::decode_error(response).await)
    }

    async fn decode_error(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        match response.json::<ProviderErrorBody>().await {
            Ok(body) => ProviderError::new(body.code, body.message),
            Err(_) => ProviderError::new("provider-failure", format!("unexpected status {status}")),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn federated_sign_in(&self) -> Result<ProviderCredential, ProviderError> {
        // The interactive part of the federated flow happens on the
        // device; this endpoint completes the token exchange.
        self.post_credential("/auth/federated", &serde_json::json!({}))
            .await
    }

    async fn password_sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderCredential, ProviderError> {
        self.post_credential(
            "/auth/password/sign-in",
            &PasswordSignInRequest { email, password },
        )
        .await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<ProviderCredential, ProviderError> {
        self.post_credential(
            "/auth/password/sign-up",
            &SignUpRequest {
                email,
                password,
                display_name,
            },
        )
        .await
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.post_unit("/auth/sign-out", &serde_json::json!({})).await
    }

    async fn session_valid(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/auth/session", self.base_url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|_| ProviderError::network())?;

        if response.status().is_success() {
            let status = response
                .json::<SessionStatusResponse>()
                .await
                .map_err(|_| ProviderError::network())?;
            return Ok(status.valid);
        }

        Err(Self::decode_error(response).await)
    }

    async fn reset_password(&self, email: &str) -> Result<(), ProviderError> {
        // The provider answers success whether or not the email is
        // registered, so accounts cannot be enumerated through resets.
        self.post_unit("/auth/password/reset", &ResetPasswordRequest { email })
            .await
    }

    fn session_events(&self) -> Option<mpsc::UnboundedReceiver<ProviderSessionEvent>> {
        self.events_rx.lock().ok()?.take()
    }
}
