use std::{env, time::Duration};

// Runtime wiring knobs (not domain policy).

// Which credential backend the app wires at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Live,
    Simulated,
}

pub fn backend_kind() -> BackendKind {
    match env::var("AUTH_BACKEND").as_deref() {
        Ok("live") => BackendKind::Live,
        _ => BackendKind::Simulated,
    }
}

pub fn provider_base_url() -> String {
    env::var("IDENTITY_PROVIDER_URL").unwrap_or_else(|_| "http://127.0.0.1:3002".to_string())
}

pub fn provider_timeout() -> Duration {
    let millis = env::var("IDENTITY_PROVIDER_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

// Holds the authenticating state long enough to watch it locally.
pub fn simulated_latency() -> Duration {
    let millis = env::var("SIMULATED_LATENCY_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(250);
    Duration::from_millis(millis)
}

pub fn database_url() -> Option<String> {
    env::var("DATABASE_URL").ok()
}
