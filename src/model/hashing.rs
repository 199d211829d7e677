use argon2::Argon2;
use pbkdf2::Pbkdf2;
use rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString};
use crate::utils::config::Configuration;
use crate::utils::errors::{ErrorCode, WardenError};

///
/// The password hashing algorithms understood by this service.
///
/// New hashes are produced with whichever algorithm is configured, but any
/// stored hash verifies with the algorithm named by its own PHC prefix, so
/// accounts migrated from older deployments keep working.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Algorithm {
    Argon,
    BCrypt,
    Pbkdf2,
}

impl Algorithm {
    pub fn from_phc(phc: &str) -> Result<Self, WardenError> {
        let mut split = phc.split('$');
        split.next(); // PHC strings start with the delimiter.

        match split.next() {
            Some("argon2i") | Some("argon2d") | Some("argon2id") => Ok(Algorithm::Argon),
            Some("2a") | Some("2b") | Some("2x") | Some("2y")    => Ok(Algorithm::BCrypt),
            Some("pbkdf2-sha256") | Some("pbkdf2-sha512")        => Ok(Algorithm::Pbkdf2),
            Some(other) => Err(ErrorCode::UnknownAlgorithmVariant
                .with_msg(&format!("Algorithm variant {} is not supported", other))),
            None => Err(ErrorCode::InvalidPHCFormat.with_msg("The hash is not in PHC format")),
        }
    }

    pub fn from_config(config: &Configuration) -> Result<Self, WardenError> {
        match config.hashing_algorithm.to_lowercase().as_str() {
            "argon2" => Ok(Algorithm::Argon),
            "bcrypt" => Ok(Algorithm::BCrypt),
            "pbkdf2" => Ok(Algorithm::Pbkdf2),
            other => Err(ErrorCode::UnknownAlgorithmVariant
                .with_msg(&format!("HASHING_ALGORITHM {} is not supported", other))),
        }
    }
}

pub fn hash(config: &Configuration, plain_text_password: &str) -> Result<String, WardenError> {
    match Algorithm::from_config(config)? {
        Algorithm::Argon => {
            let salt = SaltString::generate(&mut OsRng);
            Ok(Argon2::default().hash_password(plain_text_password.as_bytes(), salt.as_ref())?.to_string())
        },
        Algorithm::BCrypt => {
            Ok(bcrypt::hash(plain_text_password, config.bcrypt_cost)?)
        },
        Algorithm::Pbkdf2 => {
            let salt = SaltString::generate(&mut OsRng);
            let salt = Salt::new(salt.as_str())?;
            let params = pbkdf2::Params {
                rounds: 10_000,
                output_length: 32,
            };
            Ok(Pbkdf2.hash_password_customized(
                plain_text_password.as_bytes(),
                None,
                None,
                params,
                salt)?.to_string())
        },
    }
}

///
/// Check a plain-text password against a stored hash. A malformed hash is a
/// mismatch, never an error - login failures must all look the same.
///
pub fn verify(plain_text_password: &str, phc: &str) -> bool {
    let algorithm = match Algorithm::from_phc(phc) {
        Ok(algorithm) => algorithm,
        Err(_) => return false,
    };

    match algorithm {
        Algorithm::Argon => {
            match PasswordHash::new(phc) {
                Ok(parsed) => Argon2::default()
                    .verify_password(plain_text_password.as_bytes(), &parsed)
                    .is_ok(),
                Err(_) => false,
            }
        },
        Algorithm::BCrypt => {
            bcrypt::verify(plain_text_password, phc).unwrap_or(false)
        },
        Algorithm::Pbkdf2 => {
            match PasswordHash::new(phc) {
                Ok(parsed) => Pbkdf2
                    .verify_password(plain_text_password.as_bytes(), &parsed)
                    .is_ok(),
                Err(_) => false,
            }
        },
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn config(algorithm: &str) -> Configuration {
        let mut config = Configuration::from_env().unwrap();
        config.hashing_algorithm = algorithm.to_string();
        config.bcrypt_cost = 4; // Keep the tests quick.
        config
    }

    #[test]
    fn should_parse_phc_prefixes() {
        assert_eq!(Algorithm::from_phc("$argon2id$v=19$...").unwrap(), Algorithm::Argon);
        assert_eq!(Algorithm::from_phc("$2b$12$...").unwrap(), Algorithm::BCrypt);
        assert_eq!(Algorithm::from_phc("$pbkdf2-sha256$...").unwrap(), Algorithm::Pbkdf2);
        assert!(Algorithm::from_phc("$md5$...").is_err());
    }

    #[test]
    fn should_round_trip_bcrypt() {
        let phc = hash(&config("bcrypt"), "Str0ng!Pass").unwrap();
        assert!(phc.starts_with("$2"));
        assert!(verify("Str0ng!Pass", &phc));
        assert!(!verify("Wr0ng!Pass", &phc));
    }

    #[test]
    fn should_round_trip_argon() {
        let phc = hash(&config("argon2"), "Str0ng!Pass").unwrap();
        assert!(phc.starts_with("$argon2"));
        assert!(verify("Str0ng!Pass", &phc));
        assert!(!verify("Wr0ng!Pass", &phc));
    }

    #[test]
    fn should_treat_a_malformed_hash_as_a_mismatch() {
        assert!(!verify("Str0ng!Pass", "not-a-phc-string"));
        assert!(!verify("Str0ng!Pass", "$bogus$whatever"));
    }
}
