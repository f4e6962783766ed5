use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Which credential path vouched for an identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Federated,
    Password,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Federated => "federated",
            AuthProvider::Password => "password",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "federated" => Some(AuthProvider::Federated),
            "password" => Some(AuthProvider::Password),
            _ => None,
        }
    }
}

// Durable profile record for an authenticated user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub provider: AuthProvider,
    pub created_at: u64,
    pub last_login_at: u64,
}

impl Identity {
    // Fresh record minted at authentication time.
    pub fn new(
        email: impl Into<String>,
        display_name: Option<String>,
        provider: AuthProvider,
        now_epoch_seconds: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            display_name,
            profile_image_url: None,
            provider,
            created_at: now_epoch_seconds,
            last_login_at: now_epoch_seconds,
        }
    }
}

// Equality is by id only; profile fields may drift between providers.
impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Identity {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_ids_match_then_identities_are_equal_despite_other_fields() {
        let mut left = Identity::new("a@b.com", None, AuthProvider::Password, 1_700_000_000);
        let mut right = left.clone();
        right.email = "other@b.com".to_string();
        right.display_name = Some("Other".to_string());
        right.last_login_at = 1_700_000_999;

        assert_eq!(left, right);

        left.id = Uuid::new_v4();
        assert_ne!(left, right);
    }

    #[test]
    fn when_minted_then_created_and_last_login_match_the_clock() {
        let identity = Identity::new(
            "a@b.com",
            Some("Driver".to_string()),
            AuthProvider::Federated,
            1_700_000_000,
        );

        assert_eq!(identity.created_at, 1_700_000_000);
        assert_eq!(identity.last_login_at, 1_700_000_000);
        assert_eq!(identity.provider, AuthProvider::Federated);
    }

    #[test]
    fn when_provider_tag_round_trips_through_str_then_value_is_preserved() {
        for provider in [AuthProvider::Federated, AuthProvider::Password] {
            assert_eq!(AuthProvider::parse(provider.as_str()), Some(provider));
        }
        assert_eq!(AuthProvider::parse("guest"), None);
    }
}
