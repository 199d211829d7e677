use tonic::{Request, Response, Status};
use super::{ServiceContext, normalise_email};
use crate::grpc::warden as api;
use crate::model::account::Account;
use crate::model::attempt::{LoginAttempt, PasswordHistoryEntry};
use crate::model::password_rules;
use crate::utils::errors::{ErrorCode, WardenError};
use crate::utils::generate_id;

pub async fn register(ctx: &ServiceContext, request: Request<api::RegisterRequest>)
    -> Result<Response<api::RegisterResponse>, Status> {

    let remote_addr = request.remote_addr();
    let request = request.into_inner();
    let email = normalise_email(&request.email);

    let ip_address = remote_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| String::from("unknown"));

    if email.is_empty() || !email.contains('@') {
        record(ctx, None, &email, &ip_address, false, Some("invalid email")).await?;
        return Err(ErrorCode::InvalidEmail.with_msg("A valid email address is required").into())
    }

    if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
        record(ctx, None, &email, &ip_address, false, Some("missing name")).await?;
        return Err(ErrorCode::FieldMandatory.with_msg("First and last name are required").into())
    }

    let report = password_rules::check_complexity(&request.password);
    if !report.is_valid() {
        record(ctx, None, &email, &ip_address, false, Some("password does not meet policy")).await?;
        return Err(report.into_error().into())
    }

    let phc = ctx.hash_password(&request.password).await?;
    let now = ctx.now();

    let account = Account {
        account_id: generate_id(),
        email,
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.trim().to_string(),
        phc: phc.clone(),
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
        created_on: bson::DateTime::from_chrono(now),
        updated_on: bson::DateTime::from_chrono(now),
    };

    if let Err(err) = ctx.db().create_account(&account).await {
        if err.error_code() == ErrorCode::EmailAlreadyRegistered {
            record(ctx, None, &account.email, &ip_address, false,
                Some("email already registered")).await?;
        }
        return Err(err.into())
    }

    // The initial password counts towards the re-use history.
    ctx.db().add_password_history(&PasswordHistoryEntry {
        account_id: account.account_id.clone(),
        phc,
        changed_on: bson::DateTime::from_chrono(now),
    }).await?;

    // Registration opens the account's audit trail with a successful entry.
    record(ctx, Some(&account.account_id), &account.email, &ip_address, true, None).await?;

    tracing::info!("Registered account {} for {}", account.account_id, account.email);

    Ok(Response::new(api::RegisterResponse { account: Some(api::Account::from(&account)) }))
}

///
/// Every registration attempt produces exactly one ledger record, accepted
/// or refused - just as login attempts do.
///
async fn record(
    ctx: &ServiceContext,
    account_id: Option<&str>,
    email: &str,
    ip_address: &str,
    success: bool,
    failure_reason: Option<&str>) -> Result<(), WardenError> {

    ctx.db().record_attempt(&LoginAttempt {
        attempt_id: generate_id(),
        account_id: account_id.map(str::to_string),
        email: email.to_string(),
        ip_address: ip_address.to_string(),
        location: Some(ctx.geo().resolve(ip_address)),
        success,
        failure_reason: failure_reason.map(str::to_string),
        user_agent: None,
        created_on: bson::DateTime::from_chrono(ctx.now()),
    }).await
}
