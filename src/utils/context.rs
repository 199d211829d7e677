use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::spawn_blocking;
use crate::db::Datastore;
use crate::model::hashing;
use crate::model::lockout::LockoutPolicy;
use crate::utils::config::Configuration;
use crate::utils::errors::WardenError;
use crate::utils::geoip::GeoResolver;
use crate::utils::rate_limit::RateLimiter;
use crate::utils::time_provider::TimeProvider;

///
/// Shared state given to every service handler.
///
pub struct ServiceContext {
    config: Configuration,
    db: Arc<dyn Datastore>,
    rate_limiter: Arc<dyn RateLimiter>,
    geo: Arc<dyn GeoResolver>,
    lockout: LockoutPolicy,
    time_provider: RwLock<TimeProvider>,
}

impl ServiceContext {
    pub fn new(
        config: Configuration,
        db: Arc<dyn Datastore>,
        rate_limiter: Arc<dyn RateLimiter>,
        geo: Arc<dyn GeoResolver>) -> Self {

        let lockout = LockoutPolicy::from(&config);

        ServiceContext {
            config,
            db,
            rate_limiter,
            geo,
            lockout,
            time_provider: RwLock::new(TimeProvider::default()),
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn db(&self) -> &dyn Datastore {
        &*self.db
    }

    pub fn rate_limiter(&self) -> &dyn RateLimiter {
        &*self.rate_limiter
    }

    pub fn geo(&self) -> &dyn GeoResolver {
        &*self.geo
    }

    pub fn lockout(&self) -> &LockoutPolicy {
        &self.lockout
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time_provider.read().now()
    }

    ///
    /// Fix (or release) the clock - test support only.
    ///
    pub fn set_now(&self, now: Option<DateTime<Utc>>) {
        self.time_provider.write().fix(now);
    }

    ///
    /// Hash on a blocking thread - the work-factor makes this far too slow
    /// for an executor thread.
    ///
    pub async fn hash_password(&self, plain_text_password: &str) -> Result<String, WardenError> {
        let config = self.config.clone();
        let plain_text_password = plain_text_password.to_string();
        spawn_blocking(move || hashing::hash(&config, &plain_text_password)).await?
    }

    pub async fn verify_password(&self, plain_text_password: &str, phc: &str)
        -> Result<bool, WardenError> {

        let plain_text_password = plain_text_password.to_string();
        let phc = phc.to_string();
        Ok(spawn_blocking(move || hashing::verify(&plain_text_password, &phc)).await?)
    }
}
