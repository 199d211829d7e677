#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tonic::{Request, Status};
use warden::db::memory::MemoryDatastore;
use warden::grpc::warden as api;
use warden::services::{self, ServiceContext};
use warden::utils::config::Configuration;
use warden::utils::geoip::StaticGeoResolver;
use warden::utils::rate_limit::MemoryRateLimiter;
use warden::utils::token;

///
/// Each test gets its own service context over an in-memory datastore, so
/// tests never share state and the clock can be fixed per test.
///
pub struct TestHarness {
    pub ctx: Arc<ServiceContext>,
    pub db: Arc<MemoryDatastore>,
    pub geo: Arc<StaticGeoResolver>,
}

pub fn test_config() -> Configuration {
    Configuration {
        port: 50011,
        mongo_uri: String::from("mongodb://localhost:27017"),
        db_name: String::from("Warden_Tests"),
        mongo_credentials: None,
        jaeger_endpoint: None,
        distributed_tracing: false,
        token_secret: String::from("test-secret"),
        token_lifetime_hours: 24,
        hashing_algorithm: String::from("bcrypt"),
        bcrypt_cost: 4, // Keep the tests quick.
        soft_lock_attempts: 3,
        hard_lock_attempts: 5,
        lock_duration_minutes: 30,
        password_history_limit: 5,
        totp_issuer: String::from("Warden"),
        totp_skew: 2,
        login_rate_limit: 100, // The rate-limit test lowers this.
        login_rate_window_ms: 15 * 60 * 1000,
        suspicious_distance_km: 1000.,
        geoip_table: None,
    }
}

pub fn start_warden() -> TestHarness {
    start_warden_with(test_config())
}

pub fn start_warden_with(config: Configuration) -> TestHarness {
    let db = Arc::new(MemoryDatastore::default());
    let geo = Arc::new(StaticGeoResolver::default());

    let ctx = Arc::new(ServiceContext::new(
        config,
        db.clone(),
        Arc::new(MemoryRateLimiter::default()),
        geo.clone()));

    let harness = TestHarness { ctx, db, geo };
    harness.ctx.set_now(Some(fixed_time()));
    harness
}

pub fn fixed_time() -> DateTime<Utc> {
    "2021-06-01T12:00:00Z".parse().unwrap()
}

///
/// Pull the numeric error code from a status response.
///
pub fn error_code(status: &Status) -> u32 {
    String::from_utf8_lossy(status.details())
        .parse()
        .expect("The status carried no numeric error code")
}

///
/// Attach a bearer token to a request.
///
pub fn with_bearer<T>(mut request: Request<T>, token: &str) -> Request<T> {
    request.metadata_mut().insert("authorization",
        format!("Bearer {}", token).parse().unwrap());
    request
}

pub async fn register(harness: &TestHarness, email: &str, password: &str) -> api::Account {
    let request = Request::new(api::RegisterRequest {
        email: email.to_string(),
        password: password.to_string(),
        first_name: String::from("Test"),
        last_name: String::from("Account"),
    });

    services::register::register(&harness.ctx, request)
        .await
        .expect("Registration failed")
        .into_inner()
        .account
        .expect("Registration returned no account")
}

pub fn login_request(email: &str, password: &str, ip_address: &str) -> Request<api::LoginRequest> {
    Request::new(api::LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
        two_factor_code: None,
        ip_address: Some(ip_address.to_string()),
        user_agent: Some(String::from("warden-tests")),
    })
}

pub async fn login(harness: &TestHarness, email: &str, password: &str, ip_address: &str)
    -> Result<api::LoginResponse, Status> {

    Ok(services::login::login(&harness.ctx, login_request(email, password, ip_address))
        .await?
        .into_inner())
}

///
/// A valid token for the account - issued the same way login issues them.
///
pub fn token_for(harness: &TestHarness, account_id: &str) -> String {
    let account = harness.db.raw_account(account_id).expect("No such account");
    token::sign(harness.ctx.config(), harness.ctx.now(), &account).expect("Unable to sign token")
}
