use chrono::{DateTime, Duration, Utc};
use crate::model::account::Account;
use crate::utils::config::Configuration;

///
/// The progressive lockout rules - thresholds come from configuration.
///
#[derive(Clone, Copy, Debug)]
pub struct LockoutPolicy {
    soft_lock_attempts: u32,
    hard_lock_attempts: u32,
    lock_duration: Duration,
}

///
/// The state an account should move to after a failed credential check.
///
#[derive(Clone, Debug, PartialEq)]
pub enum LockState {
    Unlocked,
    SoftLocked { until: DateTime<Utc> },

    /// The until stamp is informational - a hard lock never self-expires.
    HardLocked { until: DateTime<Utc> },
}

///
/// What to do with a login attempt given the account's current lock fields.
///
#[derive(Clone, Debug, PartialEq)]
pub enum EntryDecision {
    /// Refuse - only an administrator can release a hard lock.
    HardLocked,

    /// Refuse - the soft lock has not expired yet.
    SoftLocked { remaining_minutes: i64 },

    /// The soft lock window has passed - clear it and start counting afresh.
    ExpiredSoftLock,

    Proceed,
}

impl LockoutPolicy {
    pub fn from(config: &Configuration) -> Self {
        LockoutPolicy {
            soft_lock_attempts: config.soft_lock_attempts,
            hard_lock_attempts: config.hard_lock_attempts,
            lock_duration: Duration::minutes(config.lock_duration_minutes),
        }
    }

    ///
    /// Given the post-increment failure count, which lock (if any) does this
    /// failure trip?
    ///
    pub fn after_failure(&self, failed_attempts: u32, now: DateTime<Utc>) -> LockState {
        if failed_attempts >= self.hard_lock_attempts {
            return LockState::HardLocked { until: now + self.lock_duration }
        }

        if failed_attempts >= self.soft_lock_attempts {
            return LockState::SoftLocked { until: now + self.lock_duration }
        }

        LockState::Unlocked
    }

    pub fn entry_decision(&self, account: &Account, now: DateTime<Utc>) -> EntryDecision {
        if account.is_hard_locked {
            return EntryDecision::HardLocked
        }

        if account.is_soft_locked {
            match account.locked_until {
                Some(until) if until.to_chrono() > now => {
                    let remaining = until.to_chrono() - now;
                    // Round up so '29 minutes 30 seconds' reads as 30.
                    let remaining_minutes = (remaining.num_seconds() + 59) / 60;
                    return EntryDecision::SoftLocked { remaining_minutes }
                },
                _ => return EntryDecision::ExpiredSoftLock,
            }
        }

        EntryDecision::Proceed
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::account::Account;

    fn policy() -> LockoutPolicy {
        LockoutPolicy {
            soft_lock_attempts: 3,
            hard_lock_attempts: 5,
            lock_duration: Duration::minutes(30),
        }
    }

    fn now() -> DateTime<Utc> {
        "2021-06-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn should_stay_unlocked_below_the_soft_threshold() {
        assert_eq!(policy().after_failure(1, now()), LockState::Unlocked);
        assert_eq!(policy().after_failure(2, now()), LockState::Unlocked);
    }

    #[test]
    fn should_soft_lock_at_the_soft_threshold() {
        let expected = now() + Duration::minutes(30);
        assert_eq!(policy().after_failure(3, now()), LockState::SoftLocked { until: expected });
        assert_eq!(policy().after_failure(4, now()), LockState::SoftLocked { until: expected });
    }

    #[test]
    fn should_hard_lock_at_the_hard_threshold() {
        let until = now() + Duration::minutes(30);
        assert_eq!(policy().after_failure(5, now()), LockState::HardLocked { until });
        assert_eq!(policy().after_failure(9, now()), LockState::HardLocked { until });
    }

    #[test]
    fn should_refuse_entry_while_soft_locked() {
        let mut account = Account::stub("bob@example.com");
        account.is_soft_locked = true;
        account.locked_until = Some(bson::DateTime::from_chrono(now() + Duration::minutes(10)));

        assert_eq!(policy().entry_decision(&account, now()),
            EntryDecision::SoftLocked { remaining_minutes: 10 });
    }

    #[test]
    fn should_round_remaining_minutes_up() {
        let mut account = Account::stub("bob@example.com");
        account.is_soft_locked = true;
        account.locked_until = Some(bson::DateTime::from_chrono(now() + Duration::seconds(61)));

        assert_eq!(policy().entry_decision(&account, now()),
            EntryDecision::SoftLocked { remaining_minutes: 2 });
    }

    #[test]
    fn should_expire_a_lapsed_soft_lock() {
        let mut account = Account::stub("bob@example.com");
        account.is_soft_locked = true;
        account.locked_until = Some(bson::DateTime::from_chrono(now() - Duration::minutes(1)));

        assert_eq!(policy().entry_decision(&account, now()), EntryDecision::ExpiredSoftLock);
    }

    #[test]
    fn should_never_expire_a_hard_lock() {
        let mut account = Account::stub("bob@example.com");
        account.is_hard_locked = true;
        account.locked_until = Some(bson::DateTime::from_chrono(now() - Duration::hours(2)));

        assert_eq!(policy().entry_decision(&account, now()), EntryDecision::HardLocked);
    }

    #[test]
    fn should_proceed_when_unlocked() {
        let account = Account::stub("bob@example.com");
        assert_eq!(policy().entry_decision(&account, now()), EntryDecision::Proceed);
    }
}
