use crate::domain::errors::AuthError;
use crate::domain::identity::Identity;

// Single current authentication-status value observed by the UI.
// Replaced wholesale on every transition, never field-mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    Authenticating,
    SignedIn(Identity),
    Failed(AuthError),
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Authenticating)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AuthError> {
        match self {
            SessionState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::SignedOut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::AuthProvider;

    #[test]
    fn when_signed_in_then_projections_expose_the_identity_only() {
        let identity = Identity::new("a@b.com", None, AuthProvider::Password, 1_700_000_000);
        let state = SessionState::SignedIn(identity.clone());

        assert!(state.is_signed_in());
        assert!(!state.is_busy());
        assert_eq!(state.identity(), Some(&identity));
        assert_eq!(state.error(), None);
    }

    #[test]
    fn when_failed_then_projections_expose_the_error_only() {
        let state = SessionState::Failed(AuthError::InvalidCredentials);

        assert!(!state.is_signed_in());
        assert!(!state.is_busy());
        assert_eq!(state.identity(), None);
        assert_eq!(state.error(), Some(&AuthError::InvalidCredentials));
    }

    #[test]
    fn when_authenticating_then_state_is_busy() {
        assert!(SessionState::Authenticating.is_busy());
        assert!(!SessionState::SignedOut.is_busy());
    }

    #[test]
    fn when_defaulted_then_state_is_signed_out() {
        assert_eq!(SessionState::default(), SessionState::SignedOut);
    }
}
