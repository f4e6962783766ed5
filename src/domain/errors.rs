use std::fmt;

// Classified authentication errors; raw provider errors never cross
// this boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthError {
    Cancelled,
    Network,
    InvalidCredentials,
    EmailAlreadyRegistered,
    WeakPassword,
    ProviderFailure,
    Unknown(String),
}

impl AuthError {
    // Human-readable text shown by the presentation layer.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Cancelled => "Sign in was cancelled".to_string(),
            AuthError::Network => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            AuthError::InvalidCredentials => "Invalid credentials. Please try again.".to_string(),
            AuthError::EmailAlreadyRegistered => {
                "This email is already registered. Try signing in instead.".to_string()
            }
            AuthError::WeakPassword => {
                "Password must be at least 6 characters long.".to_string()
            }
            AuthError::ProviderFailure => {
                "The sign-in provider failed. Please try again.".to_string()
            }
            AuthError::Unknown(detail) => format!("Authentication failed: {detail}"),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}
