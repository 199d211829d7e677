use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use totp_rs::{Algorithm, Secret, TOTP};
use crate::utils::errors::{ErrorCode, WardenError};

const DIGITS: usize = 6;
const STEP_SECONDS: u64 = 30;
const SECRET_BYTES: usize = 20;

///
/// A fresh base32-encoded secret for an authenticator app.
///
pub fn generate_secret() -> String {
    let mut bytes = vec![0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Secret::Raw(bytes).to_encoded().to_string()
}

pub fn provisioning_uri(secret: &str, issuer: &str, email: &str, skew: u8)
    -> Result<String, WardenError> {

    Ok(build(secret, issuer, email, skew)?.get_url())
}

///
/// Check a submitted code at the given instant. The skew allows codes from
/// adjacent time steps, tolerating clock drift on the client device.
///
pub fn verify(secret: &str, code: &str, skew: u8, at: DateTime<Utc>) -> Result<bool, WardenError> {
    if code.len() != DIGITS || !code.chars().all(|ch| ch.is_ascii_digit()) {
        return Ok(false)
    }

    let totp = build(secret, "", "", skew)?;
    Ok(totp.check(code, at.timestamp() as u64))
}

///
/// The code an authenticator app would show at the given instant.
///
pub fn generate_at(secret: &str, at: DateTime<Utc>) -> Result<String, WardenError> {
    let totp = build(secret, "", "", 0)?;
    Ok(totp.generate(at.timestamp() as u64))
}

fn build(secret: &str, issuer: &str, email: &str, skew: u8) -> Result<TOTP, WardenError> {
    let bytes = Secret::Encoded(secret.to_string())
        .to_bytes()
        .map_err(|err| ErrorCode::InvalidTwoFactorCode
            .with_msg(&format!("The stored secret is not valid base32: {:?}", err)))?;

    let issuer = match issuer.is_empty() {
        true => None,
        false => Some(issuer.to_string()),
    };

    TOTP::new(Algorithm::SHA1, DIGITS, skew, STEP_SECONDS, bytes, issuer, email.to_string())
        .map_err(|err| ErrorCode::InvalidTwoFactorCode
            .with_msg(&format!("Unable to initialise TOTP: {}", err)))
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2021-06-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn should_accept_the_current_code() {
        let secret = generate_secret();
        let code = generate_at(&secret, now()).unwrap();
        assert!(verify(&secret, &code, 2, now()).unwrap());
    }

    #[test]
    fn should_accept_a_code_within_the_skew() {
        let secret = generate_secret();
        let code = generate_at(&secret, now()).unwrap();
        assert!(verify(&secret, &code, 2, now() + Duration::seconds(45)).unwrap());
    }

    #[test]
    fn should_reject_a_stale_code() {
        let secret = generate_secret();
        let code = generate_at(&secret, now()).unwrap();
        assert!(!verify(&secret, &code, 2, now() + Duration::minutes(10)).unwrap());
    }

    #[test]
    fn should_reject_a_malformed_code() {
        let secret = generate_secret();
        assert!(!verify(&secret, "12345", 2, now()).unwrap());
        assert!(!verify(&secret, "abcdef", 2, now()).unwrap());
    }

    #[test]
    fn should_embed_issuer_and_account_in_the_uri() {
        let secret = generate_secret();
        let uri = provisioning_uri(&secret, "Warden", "bob@example.com", 2).unwrap();
        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("issuer=Warden"));
        assert!(uri.contains("bob%40example.com"));
    }
}
