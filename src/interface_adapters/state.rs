use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::identity::{AuthProvider, Identity};
use crate::domain::ports::{Clock, IdentityStore};

// System clock adapter used outside tests.
#[derive(Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

// In-memory identity store adapter for offline development.
#[derive(Clone, Default)]
pub struct InMemoryIdentityStore {
    identities: Arc<Mutex<HashMap<Uuid, Identity>>>,
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn upsert(&self, identity: &Identity) -> Result<(), String> {
        let mut identities = self.identities.lock().await;
        // Email stays unique across records.
        let duplicate = identities
            .values()
            .any(|existing| existing.email == identity.email && existing.id != identity.id);
        if duplicate {
            return Err(format!("email already stored: {}", identity.email));
        }
        identities.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, String> {
        let identities = self.identities.lock().await;
        Ok(identities
            .values()
            .find(|identity| identity.email == email)
            .cloned())
    }
}

// PostgreSQL-backed identity store for durable persistence.
#[derive(Clone)]
pub struct PostgresIdentityStore {
    pub db: PgPool,
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    async fn upsert(&self, identity: &Identity) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO identities (id, email, display_name, profile_image_url, provider, created_at, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                profile_image_url = EXCLUDED.profile_image_url,
                provider = EXCLUDED.provider,
                last_login_at = EXCLUDED.last_login_at
            "#,
        )
        .bind(identity.id.to_string())
        .bind(&identity.email)
        .bind(&identity.display_name)
        .bind(&identity.profile_image_url)
        .bind(identity.provider.as_str())
        .bind(identity.created_at as i64)
        .bind(identity.last_login_at as i64)
        .execute(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, String> {
        let row = sqlx::query(
            r#"
            SELECT id, email, display_name, profile_image_url, provider, created_at, last_login_at
            FROM identities
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: String = row.try_get("id").map_err(|err| err.to_string())?;
        let id = Uuid::parse_str(&id).map_err(|err| err.to_string())?;
        let provider: String = row.try_get("provider").map_err(|err| err.to_string())?;
        let provider = AuthProvider::parse(&provider)
            .ok_or_else(|| format!("unknown provider tag: {provider}"))?;
        let created_at: i64 = row.try_get("created_at").map_err(|err| err.to_string())?;
        let last_login_at: i64 = row.try_get("last_login_at").map_err(|err| err.to_string())?;

        Ok(Some(Identity {
            id,
            email: row.try_get("email").map_err(|err| err.to_string())?,
            display_name: row.try_get("display_name").map_err(|err| err.to_string())?,
            profile_image_url: row
                .try_get("profile_image_url")
                .map_err(|err| err.to_string())?,
            provider,
            created_at: created_at as u64,
            last_login_at: last_login_at as u64,
        }))
    }
}
