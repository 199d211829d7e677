use serde::{Deserialize, Serialize};
use crate::grpc::warden as api;

///
/// An account as stored in MongoDB. The credential fields (phc, two-factor
/// secret) never leave this struct - the API mapping below excludes them.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Account {
    pub account_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phc: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub failed_attempts: u32,
    pub is_soft_locked: bool,
    pub is_hard_locked: bool,
    pub locked_until: Option<bson::DateTime>,
    pub two_factor_enabled: bool,
    pub two_factor_secret: Option<String>,
    pub force_password_reset: bool,
    pub last_login: Option<bson::DateTime>,
    pub last_login_ip: Option<String>,
    pub created_on: bson::DateTime,
    pub updated_on: bson::DateTime,
}

impl From<&Account> for api::Account {
    fn from(account: &Account) -> Self {
        api::Account {
            account_id: account.account_id.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            is_active: account.is_active,
            is_admin: account.is_admin,
            failed_attempts: account.failed_attempts,
            is_soft_locked: account.is_soft_locked,
            is_hard_locked: account.is_hard_locked,
            locked_until: account.locked_until.map(|dt| dt.to_chrono().to_rfc3339()),
            two_factor_enabled: account.two_factor_enabled,
            force_password_reset: account.force_password_reset,
            last_login: account.last_login.map(|dt| dt.to_chrono().to_rfc3339()),
            last_login_ip: account.last_login_ip.clone(),
            created_on: account.created_on.to_chrono().to_rfc3339(),
            updated_on: account.updated_on.to_chrono().to_rfc3339(),
        }
    }
}

#[cfg(test)]
impl Account {
    pub fn stub(email: &str) -> Self {
        let now = bson::DateTime::from_chrono(chrono::Utc::now());
        Account {
            account_id: String::from("00000000-0000-0000-0000-000000000000"),
            email: email.to_string(),
            first_name: String::from("Test"),
            last_name: String::from("Account"),
            phc: String::new(),
            is_active: true,
            is_admin: false,
            failed_attempts: 0,
            is_soft_locked: false,
            is_hard_locked: false,
            locked_until: None,
            two_factor_enabled: false,
            two_factor_secret: None,
            force_password_reset: false,
            last_login: None,
            last_login_ip: None,
            created_on: now,
            updated_on: now,
        }
    }
}
