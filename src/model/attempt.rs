use serde::{Deserialize, Serialize};
use crate::grpc::admin as api;
use crate::model::geo::GeoLocation;

///
/// One row in the login audit ledger. Every attempt is recorded, successful
/// or not, including attempts against emails that match no account.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoginAttempt {
    pub attempt_id: String,
    pub account_id: Option<String>,
    pub email: String,
    pub ip_address: String,
    pub location: Option<GeoLocation>,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub user_agent: Option<String>,
    pub created_on: bson::DateTime,
}

impl From<&LoginAttempt> for api::LoginAttempt {
    fn from(attempt: &LoginAttempt) -> Self {
        api::LoginAttempt {
            attempt_id: attempt.attempt_id.clone(),
            account_id: attempt.account_id.clone(),
            email: attempt.email.clone(),
            ip_address: attempt.ip_address.clone(),
            country: attempt.location.as_ref().and_then(|l| l.country.clone()),
            city: attempt.location.as_ref().and_then(|l| l.city.clone()),
            success: attempt.success,
            failure_reason: attempt.failure_reason.clone(),
            user_agent: attempt.user_agent.clone(),
            created_on: attempt.created_on.to_chrono().to_rfc3339(),
        }
    }
}

///
/// A retired password hash, kept so recent passwords can't be re-used.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PasswordHistoryEntry {
    pub account_id: String,
    pub phc: String,
    pub changed_on: bson::DateTime,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountStats {
    pub total_accounts: u32,
    pub active_accounts: u32,
    pub hard_locked_accounts: u32,
    pub two_factor_accounts: u32,
    pub recent_failed_attempts: u32,
}
