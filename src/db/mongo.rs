use std::fs;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{Client, Database, bson::{self, Document, doc}};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use tracing::{debug, info};
use crate::db::{Datastore, prelude::*};
use crate::model::account::Account;
use crate::model::attempt::{AccountStats, LoginAttempt, PasswordHistoryEntry};
use crate::model::lockout::LockState;
use crate::utils::config::Configuration;
use crate::utils::errors::{ErrorCode, WardenError};

pub struct MongoDatastore {
    db: Database,
}

impl MongoDatastore {
    pub async fn connect(app_name: &str, config: &Configuration) -> Result<Self, WardenError> {
        let db = get_mongo_db(app_name, config).await?;
        update_mongo(&db).await?;
        Ok(MongoDatastore { db })
    }
}

pub async fn get_mongo_db(app_name: &str, config: &Configuration) -> Result<Database, WardenError> {

    let uri = match &config.mongo_credentials {
        Some(filename) => {
            debug!("Loading MongoDB credentials from secrets file {}", filename);

            // Read username and password from a secrets file.
            let credentials = fs::read_to_string(filename)
                .map_err(|err| ErrorCode::UnableToReadCredentials
                    .with_msg(&format!("Unable to read credentials from {}: {}", filename, err)))?;
            let mut credentials = credentials.lines();
            let uri = config.mongo_uri.replace("$USERNAME", credentials.next().unwrap_or_default());
            uri.replace("$PASSWORD", credentials.next().unwrap_or_default())
        },
        None => config.mongo_uri.clone(),
    };

    let mut client_options = ClientOptions::parse(&uri).await?;
    client_options.app_name = Some(app_name.to_string());

    let client = Client::with_options(client_options)?;

    info!("Connecting to MongoDB...");

    let db = client.database(&config.db_name);
    db.run_command(doc! { "ping": 1 }, None).await?;

    info!("Connected to MongoDB");
    Ok(db)
}

///
/// Run any schema-like updates against MongoDB that haven't been run yet.
///
pub async fn update_mongo(db: &Database) -> Result<(), WardenError> {
    // Note: the current driver doesn't yet support creating indexes on collections, so the
    // dbcommand must be used instead.
    db.run_command(doc! { "createIndexes": ACCOUNTS, "indexes": [
        { "key": { EMAIL: 1 }, "name": "idx_email", "unique": true },
        { "key": { ACCOUNT_ID: 1 }, "name": "idx_account_id", "unique": true } ] }, None).await?;

    db.run_command(doc! { "createIndexes": LOGIN_ATTEMPTS, "indexes": [
        { "key": { CREATED_ON: -1 }, "name": "idx_created_on" },
        { "key": { ACCOUNT_ID: 1 }, "name": "idx_account_id" } ] }, None).await?;

    db.run_command(doc! { "createIndexes": PASSWORD_HISTORY, "indexes": [
        { "key": { ACCOUNT_ID: 1 }, "name": "idx_account_id" } ] }, None).await?;

    Ok(())
}

///
/// Indicates if the MongoDB error is from a duplicate key violation.
///
fn is_duplicate_err(err: &mongodb::error::Error) -> bool {
    let ec = err.clone();
    match *ec.kind {
        ErrorKind::Write(sub_err) => match sub_err {
            mongodb::error::WriteFailure::WriteError(we) => we.code == 11000,
            _ => false,
        },
        _ => false,
    }
}

fn most_recent_first(limit: u32) -> FindOptions {
    FindOptions::builder()
        .sort(doc!{ CREATED_ON: -1 })
        .limit(limit as i64)
        .build()
}

#[tonic::async_trait]
impl Datastore for MongoDatastore {
    async fn ping(&self) -> Result<(), WardenError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn create_account(&self, account: &Account) -> Result<(), WardenError> {
        match self.db.collection::<Account>(ACCOUNTS).insert_one(account, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_err(&err) => Err(ErrorCode::EmailAlreadyRegistered
                .with_msg("An account with that email address already exists")),
            Err(err) => Err(err.into()),
        }
    }

    async fn account_by_email(&self, email: &str) -> Result<Option<Account>, WardenError> {
        Ok(self.db.collection::<Account>(ACCOUNTS)
            .find_one(doc!{ EMAIL: email }, None)
            .await?)
    }

    async fn account_by_id(&self, account_id: &str) -> Result<Option<Account>, WardenError> {
        Ok(self.db.collection::<Account>(ACCOUNTS)
            .find_one(doc!{ ACCOUNT_ID: account_id }, None)
            .await?)
    }

    async fn accounts(&self) -> Result<Vec<Account>, WardenError> {
        let cursor = self.db.collection::<Account>(ACCOUNTS)
            .find(doc!{}, FindOptions::builder().sort(doc!{ CREATED_ON: -1 }).build())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn increment_failed_attempts(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<u32, WardenError> {

        let update = doc!{
            "$inc": { FAILED_ATTEMPTS: 1 },
            "$set": { UPDATED_ON: bson::DateTime::from_chrono(now) },
        };

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        match self.db.collection::<Account>(ACCOUNTS)
            .find_one_and_update(doc!{ ACCOUNT_ID: account_id }, update, options)
            .await? {

            Some(account) => Ok(account.failed_attempts),
            None => Err(ErrorCode::AccountNotFound.with_msg("The account does not exist")),
        }
    }

    async fn apply_lock_state(&self, account_id: &str, state: &LockState, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        let update = match state {
            LockState::Unlocked => return Ok(()),
            LockState::SoftLocked { until } => doc!{
                "$set": {
                    IS_SOFT_LOCKED: true,
                    LOCKED_UNTIL: bson::DateTime::from_chrono(*until),
                    UPDATED_ON: bson::DateTime::from_chrono(now),
                }
            },
            LockState::HardLocked { until } => doc!{
                "$set": {
                    IS_HARD_LOCKED: true,
                    LOCKED_UNTIL: bson::DateTime::from_chrono(*until),
                    UPDATED_ON: bson::DateTime::from_chrono(now),
                }
            },
        };

        self.db.collection::<Document>(ACCOUNTS)
            .update_one(doc!{ ACCOUNT_ID: account_id }, update, None)
            .await?;
        Ok(())
    }

    async fn clear_soft_lock(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        let update = doc!{
            "$set": {
                IS_SOFT_LOCKED: false,
                FAILED_ATTEMPTS: 0,
                UPDATED_ON: bson::DateTime::from_chrono(now),
            },
            "$unset": { LOCKED_UNTIL: "" },
        };

        self.db.collection::<Document>(ACCOUNTS)
            .update_one(doc!{ ACCOUNT_ID: account_id }, update, None)
            .await?;
        Ok(())
    }

    async fn unlock_account(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        let update = doc!{
            "$set": {
                IS_SOFT_LOCKED: false,
                IS_HARD_LOCKED: false,
                FAILED_ATTEMPTS: 0,
                UPDATED_ON: bson::DateTime::from_chrono(now),
            },
            "$unset": { LOCKED_UNTIL: "" },
        };

        self.db.collection::<Document>(ACCOUNTS)
            .update_one(doc!{ ACCOUNT_ID: account_id }, update, None)
            .await?;
        Ok(())
    }

    async fn record_login_success(&self, account_id: &str, now: DateTime<Utc>, ip_address: &str)
        -> Result<(), WardenError> {

        let update = doc!{
            "$set": {
                LAST_LOGIN: bson::DateTime::from_chrono(now),
                LAST_LOGIN_IP: ip_address,
                FAILED_ATTEMPTS: 0,
                IS_SOFT_LOCKED: false,
                UPDATED_ON: bson::DateTime::from_chrono(now),
            },
            "$unset": { LOCKED_UNTIL: "" },
        };

        self.db.collection::<Document>(ACCOUNTS)
            .update_one(doc!{ ACCOUNT_ID: account_id }, update, None)
            .await?;
        Ok(())
    }

    async fn update_password(&self, account_id: &str, phc: &str, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        let update = doc!{
            "$set": {
                PHC: phc,
                FORCE_PASSWORD_RESET: false,
                UPDATED_ON: bson::DateTime::from_chrono(now),
            }
        };

        self.db.collection::<Document>(ACCOUNTS)
            .update_one(doc!{ ACCOUNT_ID: account_id }, update, None)
            .await?;
        Ok(())
    }

    async fn set_two_factor_secret(&self, account_id: &str, secret: &str, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        let update = doc!{
            "$set": {
                TWO_FACTOR_SECRET: secret,
                UPDATED_ON: bson::DateTime::from_chrono(now),
            }
        };

        self.db.collection::<Document>(ACCOUNTS)
            .update_one(doc!{ ACCOUNT_ID: account_id }, update, None)
            .await?;
        Ok(())
    }

    async fn set_two_factor_enabled(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        let update = doc!{
            "$set": {
                TWO_FACTOR_ENABLED: true,
                UPDATED_ON: bson::DateTime::from_chrono(now),
            }
        };

        self.db.collection::<Document>(ACCOUNTS)
            .update_one(doc!{ ACCOUNT_ID: account_id }, update, None)
            .await?;
        Ok(())
    }

    async fn set_force_password_reset(&self, account_id: &str, now: DateTime<Utc>)
        -> Result<(), WardenError> {

        let update = doc!{
            "$set": {
                FORCE_PASSWORD_RESET: true,
                UPDATED_ON: bson::DateTime::from_chrono(now),
            }
        };

        self.db.collection::<Document>(ACCOUNTS)
            .update_one(doc!{ ACCOUNT_ID: account_id }, update, None)
            .await?;
        Ok(())
    }

    async fn record_attempt(&self, attempt: &LoginAttempt) -> Result<(), WardenError> {
        self.db.collection::<LoginAttempt>(LOGIN_ATTEMPTS)
            .insert_one(attempt, None)
            .await?;
        Ok(())
    }

    async fn attempts(&self, limit: u32, failed_only: bool)
        -> Result<Vec<LoginAttempt>, WardenError> {

        let filter = match failed_only {
            true => doc!{ SUCCESS: false },
            false => doc!{},
        };

        let cursor = self.db.collection::<LoginAttempt>(LOGIN_ATTEMPTS)
            .find(filter, most_recent_first(limit))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn attempts_for_account(&self, account_id: &str, limit: u32)
        -> Result<Vec<LoginAttempt>, WardenError> {

        let cursor = self.db.collection::<LoginAttempt>(LOGIN_ATTEMPTS)
            .find(doc!{ ACCOUNT_ID: account_id }, most_recent_first(limit))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn add_password_history(&self, entry: &PasswordHistoryEntry)
        -> Result<(), WardenError> {

        self.db.collection::<PasswordHistoryEntry>(PASSWORD_HISTORY)
            .insert_one(entry, None)
            .await?;
        Ok(())
    }

    async fn password_history(&self, account_id: &str, limit: u32)
        -> Result<Vec<PasswordHistoryEntry>, WardenError> {

        let options = FindOptions::builder()
            .sort(doc!{ "changed_on": -1 })
            .limit(limit as i64)
            .build();

        let cursor = self.db.collection::<PasswordHistoryEntry>(PASSWORD_HISTORY)
            .find(doc!{ ACCOUNT_ID: account_id }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn stats(&self, failed_since: DateTime<Utc>) -> Result<AccountStats, WardenError> {
        let accounts = self.db.collection::<Document>(ACCOUNTS);
        let attempts = self.db.collection::<Document>(LOGIN_ATTEMPTS);

        let total = accounts.count_documents(doc!{}, None).await?;
        let active = accounts.count_documents(doc!{ IS_ACTIVE: true }, None).await?;
        let hard_locked = accounts.count_documents(doc!{ IS_HARD_LOCKED: true }, None).await?;
        let two_factor = accounts.count_documents(doc!{ TWO_FACTOR_ENABLED: true }, None).await?;
        let recent_failed = attempts.count_documents(doc!{
            SUCCESS: false,
            CREATED_ON: { "$gte": bson::DateTime::from_chrono(failed_since) },
        }, None).await?;

        Ok(AccountStats {
            total_accounts: total as u32,
            active_accounts: active as u32,
            hard_locked_accounts: hard_locked as u32,
            two_factor_accounts: two_factor as u32,
            recent_failed_attempts: recent_failed as u32,
        })
    }
}
