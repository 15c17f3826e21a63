pub mod auth;
pub mod error_handler;
pub mod rate_limit;
pub mod request_id;

pub use auth::{
    authenticate, generate_api_key, hash_api_key, verify_api_key, ApiKeyAuth, ApiKeyRecord,
    ApiKeyStore, MySqlApiKeyStore, Operator,
};
pub use error_handler::configure_extractors;
pub use rate_limit::RateLimiter;
pub use request_id::{RequestId, RequestIdValue};
