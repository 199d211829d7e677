use chrono::{DateTime, Utc};
use crate::model::account::Account;
use crate::model::attempt::{AccountStats, LoginAttempt, PasswordHistoryEntry};
use crate::model::lockout::LockState;
use crate::utils::errors::WardenError;

pub mod memory;
pub mod mongo;

pub mod prelude {
    // Collection names.
    pub const ACCOUNTS:         &str = "Accounts";
    pub const LOGIN_ATTEMPTS:   &str = "LoginAttempts";
    pub const PASSWORD_HISTORY: &str = "PasswordHistory";

    // Field names.
    pub const ACCOUNT_ID:           &str = "account_id";
    pub const CREATED_ON:           &str = "created_on";
    pub const EMAIL:                &str = "email";
    pub const FAILED_ATTEMPTS:      &str = "failed_attempts";
    pub const FORCE_PASSWORD_RESET: &str = "force_password_reset";
    pub const IS_ACTIVE:            &str = "is_active";
    pub const IS_HARD_LOCKED:       &str = "is_hard_locked";
    pub const IS_SOFT_LOCKED:       &str = "is_soft_locked";
    pub const LAST_LOGIN:           &str = "last_login";
    pub const LAST_LOGIN_IP:        &str = "last_login_ip";
    pub const LOCKED_UNTIL:         &str = "locked_until";
    pub const PHC:                  &str = "phc";
    pub const SUCCESS:              &str = "success";
    pub const TWO_FACTOR_ENABLED:   &str = "two_factor_enabled";
    pub const TWO_FACTOR_SECRET:    &str = "two_factor_secret";
    pub const UPDATED_ON:           &str = "updated_on";
}

///
/// Every persistence operation the service needs, behind one seam.
///
/// MongoDB backs the deployed service; the in-memory implementation backs
/// the test suite.
///
#[tonic::async_trait]
pub trait Datastore: Send + Sync {
    async fn ping(&self) -> Result<(), WardenError>;

    /// Fails with EmailAlreadyRegistered if the (normalised) email is taken.
    async fn create_account(&self, account: &Account) -> Result<(), WardenError>;

    async fn account_by_email(&self, email: &str) -> Result<Option<Account>, WardenError>;

    async fn account_by_id(&self, account_id: &str) -> Result<Option<Account>, WardenError>;

    async fn accounts(&self) -> Result<Vec<Account>, WardenError>;

    ///
    /// Atomically bump the failure counter and return the new count. The
    /// increment-and-read must be a single operation so two concurrent
    /// failures can't both observe the same count.
    ///
    async fn increment_failed_attempts(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<u32, WardenError>;

    async fn apply_lock_state(&self, account_id: &str, state: &LockState, now: DateTime<Utc>)
        -> Result<(), WardenError>;

    /// Release an expired soft lock and restart the failure count.
    async fn clear_soft_lock(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<(), WardenError>;

    /// Administrative release - clears both lock flags and the counter.
    async fn unlock_account(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<(), WardenError>;

    /// Stamp a successful login and reset the failure state.
    async fn record_login_success(&self, account_id: &str, now: DateTime<Utc>, ip_address: &str)
        -> Result<(), WardenError>;

    /// Store a new hash. Also releases any pending forced reset.
    async fn update_password(&self, account_id: &str, phc: &str, now: DateTime<Utc>)
        -> Result<(), WardenError>;

    async fn set_two_factor_secret(&self, account_id: &str, secret: &str, now: DateTime<Utc>)
        -> Result<(), WardenError>;

    async fn set_two_factor_enabled(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<(), WardenError>;

    async fn set_force_password_reset(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<(), WardenError>;

    async fn record_attempt(&self, attempt: &LoginAttempt) -> Result<(), WardenError>;

    /// Most recent first.
    async fn attempts(&self, limit: u32, failed_only: bool)
        -> Result<Vec<LoginAttempt>, WardenError>;

    async fn attempts_for_account(&self, account_id: &str, limit: u32)
        -> Result<Vec<LoginAttempt>, WardenError>;

    async fn add_password_history(&self, entry: &PasswordHistoryEntry)
        -> Result<(), WardenError>;

    /// Most recent first.
    async fn password_history(&self, account_id: &str, limit: u32)
        -> Result<Vec<PasswordHistoryEntry>, WardenError>;

    async fn stats(&self, failed_since: DateTime<Utc>) -> Result<AccountStats, WardenError>;
}
