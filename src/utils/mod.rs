use uuid::Uuid;

pub mod config;
pub mod context;
pub mod errors;
pub mod geoip;
pub mod health;
pub mod rate_limit;
pub mod time_provider;
pub mod token;
pub mod totp;


pub fn generate_id() -> String {
    Uuid::new_v4().to_hyphenated().to_string()
}
