use crate::core::{AppError, Result as AppResult};
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::LocalBoxFuture;
use rand::{distributions::Alphanumeric, Rng};
use sqlx::MySqlPool;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

/// Header carrying the operator's API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Number of leading key characters stored in clear for lookup
pub const KEY_PREFIX_LEN: usize = 8;

/// Paths served without credentials
const PUBLIC_PATHS: [&str; 3] = ["/", "/health", "/ready"];

/// The authenticated dashboard operator; recorded as `collectedBy` / `refundedBy`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub key_id: String,
    pub name: String,
}

impl FromRequest for Operator {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Operator>()
                .cloned()
                .ok_or_else(|| AppError::unauthorized("Authentication required")),
        )
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKeyRecord {
    pub id: String,
    pub operator_name: String,
    pub key_prefix: String,
    pub key_hash: String,
    pub is_active: bool,
}

/// Lookup of operator API keys
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn find_by_prefix(&self, prefix: &str) -> AppResult<Option<ApiKeyRecord>>;

    /// Record that a key was just used
    async fn touch(&self, id: &str, at: DateTime<Utc>) -> AppResult<()>;
}

pub struct MySqlApiKeyStore {
    pool: MySqlPool,
}

impl MySqlApiKeyStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Store a new key for `operator_name`; returns the record (the clear key is not kept)
    pub async fn create(&self, operator_name: &str, api_key: &str) -> AppResult<ApiKeyRecord> {
        let record = ApiKeyRecord {
            id: uuid::Uuid::new_v4().to_string(),
            operator_name: operator_name.to_string(),
            key_prefix: key_prefix(api_key)?.to_string(),
            key_hash: hash_api_key(api_key)?,
            is_active: true,
        };

        sqlx::query(
            r#"
            INSERT INTO api_keys (id, operator_name, key_prefix, key_hash, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.operator_name)
        .bind(&record.key_prefix)
        .bind(&record.key_hash)
        .bind(record.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(record)
    }
}

#[async_trait]
impl ApiKeyStore for MySqlApiKeyStore {
    async fn find_by_prefix(&self, prefix: &str) -> AppResult<Option<ApiKeyRecord>> {
        sqlx::query_as::<_, ApiKeyRecord>(
            r#"
            SELECT id, operator_name, key_prefix, key_hash, is_active
            FROM api_keys
            WHERE key_prefix = ?
            LIMIT 1
            "#,
        )
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn touch(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}

/// API key authentication middleware
pub struct ApiKeyAuth {
    store: Arc<dyn ApiKeyStore>,
}

impl ApiKeyAuth {
    pub fn new(store: Arc<dyn ApiKeyStore>) -> Self {
        Self { store }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthMiddleware {
            service: Rc::new(service),
            store: self.store.clone(),
        }))
    }
}

pub struct ApiKeyAuthMiddleware<S> {
    service: Rc<S>,
    store: Arc<dyn ApiKeyStore>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let store = self.store.clone();

        Box::pin(async move {
            if PUBLIC_PATHS.contains(&req.path()) {
                return svc.call(req).await;
            }

            let api_key = req
                .headers()
                .get(API_KEY_HEADER)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| Error::from(AppError::unauthorized("Missing X-API-Key header")))?;

            let operator = authenticate(store.as_ref(), &api_key)
                .await
                .map_err(Error::from)?;

            tracing::debug!(operator = operator.name.as_str(), "Operator authenticated");
            req.extensions_mut().insert(operator);

            svc.call(req).await
        })
    }
}

/// Clear-text lookup prefix of a key
pub fn key_prefix(api_key: &str) -> AppResult<&str> {
    api_key
        .get(..KEY_PREFIX_LEN)
        .filter(|_| api_key.len() > KEY_PREFIX_LEN)
        .ok_or_else(|| AppError::unauthorized("Invalid API key"))
}

/// Resolve an API key to its operator: prefix lookup, then Argon2 verification
pub async fn authenticate(store: &dyn ApiKeyStore, api_key: &str) -> AppResult<Operator> {
    let prefix = key_prefix(api_key)?;

    let record = store
        .find_by_prefix(prefix)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid API key"))?;

    if !record.is_active {
        return Err(AppError::unauthorized("API key is inactive"));
    }

    if !verify_api_key(api_key, &record.key_hash)? {
        tracing::warn!(key_prefix = prefix, "API key verification failed");
        return Err(AppError::unauthorized("Invalid API key"));
    }

    if let Err(e) = store.touch(&record.id, Utc::now()).await {
        tracing::warn!(key_id = record.id.as_str(), error = %e, "Failed to record API key use");
    }

    Ok(Operator {
        key_id: record.id,
        name: record.operator_name,
    })
}

/// Generate a fresh API key: `smk_` followed by 40 alphanumeric characters
pub fn generate_api_key() -> String {
    let body: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect();
    format!("smk_{}", body)
}

/// Helper function to hash API keys using Argon2
pub fn hash_api_key(api_key: &str) -> AppResult<String> {
    use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(api_key.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Failed to hash API key: {}", e)))
}

/// Helper function to verify API keys using Argon2
pub fn verify_api_key(api_key: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Invalid hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(api_key.as_bytes(), &parsed_hash)
        .is_ok())
}
