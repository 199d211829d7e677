use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tonic::metadata::MetadataMap;
use crate::model::account::Account;
use crate::utils::config::Configuration;
use crate::utils::context::ServiceContext;
use crate::utils::errors::{ErrorCode, WardenError};

///
/// The claims carried in a session token.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,   // The account id.
    pub email: String,
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

pub fn sign(config: &Configuration, now: DateTime<Utc>, account: &Account)
    -> Result<String, WardenError> {

    let claims = Claims {
        sub: account.account_id.clone(),
        email: account.email.clone(),
        admin: account.is_admin,
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.token_lifetime_hours)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.token_secret.as_bytes()))
        .map_err(|err| ErrorCode::TokenSigningError
            .with_msg(&format!("Unable to sign token: {}", err)))
}

///
/// Decode and check a token. Expiry is checked against the service clock
/// rather than the library's wall clock, so a fixed clock behaves.
///
pub fn verify(config: &Configuration, now: DateTime<Utc>, token: &str)
    -> Result<Claims, WardenError> {

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    let decoded = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.token_secret.as_bytes()),
        &validation)?;

    if decoded.claims.exp <= now.timestamp() {
        return Err(ErrorCode::TokenExpired.with_msg("The session token has expired"))
    }

    Ok(decoded.claims)
}

///
/// Pull the bearer token from the request metadata and verify it.
///
pub fn authenticate(ctx: &ServiceContext, metadata: &MetadataMap) -> Result<Claims, WardenError> {
    let header = metadata.get("authorization")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ErrorCode::MissingToken.with_msg("An authorization header is required"))?;

    let token = match header.strip_prefix("Bearer ") {
        Some(token) => token,
        None => return Err(ErrorCode::InvalidToken.with_msg("Expected a bearer token")),
    };

    verify(ctx.config(), ctx.now(), token)
}

pub fn require_admin(claims: &Claims) -> Result<(), WardenError> {
    match claims.admin {
        true => Ok(()),
        false => Err(ErrorCode::AdminRequired.with_msg("This operation requires an administrator")),
    }
}
