use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use crate::db::Datastore;
use crate::model::account::Account;
use crate::model::attempt::{AccountStats, LoginAttempt, PasswordHistoryEntry};
use crate::model::lockout::LockState;
use crate::utils::errors::{ErrorCode, WardenError};

///
/// An in-memory datastore with the same behaviour as the MongoDB one - the
/// test suites run against this.
///
#[derive(Default)]
pub struct MemoryDatastore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    attempts: Vec<LoginAttempt>,
    history: Vec<PasswordHistoryEntry>,
}

impl MemoryDatastore {
    /// Read an account as stored - test support.
    pub fn raw_account(&self, account_id: &str) -> Option<Account> {
        self.state.lock().accounts.get(account_id).cloned()
    }

    /// Test support.
    pub fn make_admin(&self, account_id: &str) {
        if let Some(account) = self.state.lock().accounts.get_mut(account_id) {
            account.is_admin = true;
        }
    }

    /// Test support.
    pub fn deactivate(&self, account_id: &str) {
        if let Some(account) = self.state.lock().accounts.get_mut(account_id) {
            account.is_active = false;
        }
    }
}

fn modify<F>(state: &Mutex<State>, account_id: &str, now: DateTime<Utc>, action: F)
    -> Result<(), WardenError>
where F: FnOnce(&mut Account) {

    let mut state = state.lock();
    match state.accounts.get_mut(account_id) {
        Some(account) => {
            action(account);
            account.updated_on = bson::DateTime::from_chrono(now);
            Ok(())
        },
        None => Err(ErrorCode::AccountNotFound.with_msg("The account does not exist")),
    }
}

#[tonic::async_trait]
impl Datastore for MemoryDatastore {
    async fn ping(&self) -> Result<(), WardenError> {
        Ok(())
    }

    async fn create_account(&self, account: &Account) -> Result<(), WardenError> {
        let mut state = self.state.lock();

        if state.accounts.values().any(|existing| existing.email == account.email) {
            return Err(ErrorCode::EmailAlreadyRegistered
                .with_msg("An account with that email address already exists"))
        }

        state.accounts.insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    async fn account_by_email(&self, email: &str) -> Result<Option<Account>, WardenError> {
        Ok(self.state.lock().accounts.values().find(|a| a.email == email).cloned())
    }

    async fn account_by_id(&self, account_id: &str) -> Result<Option<Account>, WardenError> {
        Ok(self.state.lock().accounts.get(account_id).cloned())
    }

    async fn accounts(&self) -> Result<Vec<Account>, WardenError> {
        let mut accounts: Vec<Account> = self.state.lock().accounts.values().cloned().collect();
        accounts.sort_by(|a, b| b.created_on.cmp(&a.created_on));
        Ok(accounts)
    }

    async fn increment_failed_attempts(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<u32, WardenError> {

        let mut state = self.state.lock();
        match state.accounts.get_mut(account_id) {
            Some(account) => {
                account.failed_attempts += 1;
                account.updated_on = bson::DateTime::from_chrono(now);
                Ok(account.failed_attempts)
            },
            None => Err(ErrorCode::AccountNotFound.with_msg("The account does not exist")),
        }
    }

    async fn apply_lock_state(&self, account_id: &str, state: &LockState, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        modify(&self.state, account_id, now, |account| {
            match state {
                LockState::Unlocked => {},
                LockState::SoftLocked { until } => {
                    account.is_soft_locked = true;
                    account.locked_until = Some(bson::DateTime::from_chrono(*until));
                },
                LockState::HardLocked { until } => {
                    account.is_hard_locked = true;
                    account.locked_until = Some(bson::DateTime::from_chrono(*until));
                },
            }
        })
    }

    async fn clear_soft_lock(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        modify(&self.state, account_id, now, |account| {
            account.is_soft_locked = false;
            account.locked_until = None;
            account.failed_attempts = 0;
        })
    }

    async fn unlock_account(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        modify(&self.state, account_id, now, |account| {
            account.is_soft_locked = false;
            account.is_hard_locked = false;
            account.locked_until = None;
            account.failed_attempts = 0;
        })
    }

    async fn record_login_success(&self, account_id: &str, now: DateTime<Utc>, ip_address: &str)
        -> Result<(), WardenError> {

        modify(&self.state, account_id, now, |account| {
            account.last_login = Some(bson::DateTime::from_chrono(now));
            account.last_login_ip = Some(ip_address.to_string());
            account.failed_attempts = 0;
            account.is_soft_locked = false;
            account.locked_until = None;
        })
    }

    async fn update_password(&self, account_id: &str, phc: &str, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        modify(&self.state, account_id, now, |account| {
            account.phc = phc.to_string();
            account.force_password_reset = false;
        })
    }

    async fn set_two_factor_secret(&self, account_id: &str, secret: &str, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        modify(&self.state, account_id, now, |account| {
            account.two_factor_secret = Some(secret.to_string());
        })
    }

    async fn set_two_factor_enabled(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        modify(&self.state, account_id, now, |account| {
            account.two_factor_enabled = true;
        })
    }

    async fn set_force_password_reset(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        modify(&self.state, account_id, now, |account| {
            account.force_password_reset = true;
        })
    }

    async fn record_attempt(&self, attempt: &LoginAttempt) -> Result<(), WardenError> {
        self.state.lock().attempts.push(attempt.clone());
        Ok(())
    }

    async fn attempts(&self, limit: u32, failed_only: bool)
        -> Result<Vec<LoginAttempt>, WardenError> {

        let state = self.state.lock();
        let mut attempts: Vec<LoginAttempt> = state.attempts.iter()
            .filter(|attempt| !failed_only || !attempt.success)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.created_on.cmp(&a.created_on));
        attempts.truncate(limit as usize);
        Ok(attempts)
    }

    async fn attempts_for_account(&self, account_id: &str, limit: u32)
        -> Result<Vec<LoginAttempt>, WardenError> {

        let state = self.state.lock();
        let mut attempts: Vec<LoginAttempt> = state.attempts.iter()
            .filter(|attempt| attempt.account_id.as_deref() == Some(account_id))
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.created_on.cmp(&a.created_on));
        attempts.truncate(limit as usize);
        Ok(attempts)
    }

    async fn add_password_history(&self, entry: &PasswordHistoryEntry)
        -> Result<(), WardenError> {

        self.state.lock().history.push(entry.clone());
        Ok(())
    }

    async fn password_history(&self, account_id: &str, limit: u32)
        -> Result<Vec<PasswordHistoryEntry>, WardenError> {

        let state = self.state.lock();
        let mut history: Vec<PasswordHistoryEntry> = state.history.iter()
            .filter(|entry| entry.account_id == account_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.changed_on.cmp(&a.changed_on));
        history.truncate(limit as usize);
        Ok(history)
    }

    async fn stats(&self, failed_since: DateTime<Utc>) -> Result<AccountStats, WardenError> {
        let state = self.state.lock();
        let since = bson::DateTime::from_chrono(failed_since);

        Ok(AccountStats {
            total_accounts: state.accounts.len() as u32,
            active_accounts: state.accounts.values().filter(|a| a.is_active).count() as u32,
            hard_locked_accounts: state.accounts.values().filter(|a| a.is_hard_locked).count() as u32,
            two_factor_accounts: state.accounts.values().filter(|a| a.two_factor_enabled).count() as u32,
            recent_failed_attempts: state.attempts.iter()
                .filter(|attempt| !attempt.success && attempt.created_on >= since)
                .count() as u32,
        })
    }
}
