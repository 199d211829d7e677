use tonic::{Request, Response, Status};
use super::{ServiceContext, normalise_email};
use crate::grpc::warden as api;
use crate::model::account::Account;
use crate::model::attempt::LoginAttempt;
use crate::model::geo::{self, GeoLocation};
use crate::model::lockout::{EntryDecision, LockState};
use crate::utils::errors::{ErrorCode, WardenError};
use crate::utils::{generate_id, token, totp};

pub async fn login(ctx: &ServiceContext, request: Request<api::LoginRequest>)
    -> Result<Response<api::LoginResponse>, Status> {

    let remote_addr = request.remote_addr();
    let request = request.into_inner();
    let email = normalise_email(&request.email);
    let now = ctx.now();

    let ip_address = request.ip_address.clone()
        .filter(|ip| !ip.is_empty())
        .or_else(|| remote_addr.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| String::from("unknown"));

    // Refuse before touching the account or the ledger - a rate-limited
    // request tells us nothing about the credentials.
    let requests = ctx.rate_limiter()
        .increment(&format!("login:ip:{}", ip_address), ctx.config().login_rate_window_ms, now)
        .await?;

    if requests > ctx.config().login_rate_limit {
        return Err(ErrorCode::TooManyRequests
            .with_msg("Too many login attempts, please try again later").into())
    }

    let location = ctx.geo().resolve(&ip_address);

    let account = match ctx.db().account_by_email(&email).await? {
        Some(account) => account,
        None => {
            // Record against no account and answer exactly as a bad password
            // would - don't reveal whether the email is registered.
            record(ctx, None, &email, &ip_address, &location, &request, false,
                Some("unknown email")).await?;
            return Err(invalid_credentials().into())
        },
    };

    match ctx.lockout().entry_decision(&account, now) {
        EntryDecision::HardLocked => {
            record(ctx, Some(&account), &email, &ip_address, &location, &request, false,
                Some("account hard locked")).await?;
            return Err(hard_locked().into())
        },
        EntryDecision::SoftLocked { remaining_minutes } => {
            record(ctx, Some(&account), &email, &ip_address, &location, &request, false,
                Some("account soft locked")).await?;
            return Err(ErrorCode::AccountSoftLocked
                .with_msg(&format!("The account is temporarily locked, try again in {} minutes",
                    remaining_minutes)).into())
        },
        EntryDecision::ExpiredSoftLock => {
            ctx.db().clear_soft_lock(&account.account_id, now).await?;
        },
        EntryDecision::Proceed => {},
    }

    if !account.is_active {
        record(ctx, Some(&account), &email, &ip_address, &location, &request, false,
            Some("account inactive")).await?;
        return Err(ErrorCode::AccountInactive.with_msg("The account has been deactivated").into())
    }

    if !ctx.verify_password(&request.password, &account.phc).await? {
        record(ctx, Some(&account), &email, &ip_address, &location, &request, false,
            Some("invalid password")).await?;
        return Err(Status::from(register_failure(ctx, &account).await?))
    }

    if account.two_factor_enabled {
        let secret = account.two_factor_secret.as_deref()
            .ok_or_else(|| ErrorCode::TwoFactorNotSetup
                .with_msg("The account has no two-factor secret"))?;

        let code = match request.two_factor_code.as_deref().filter(|code| !code.is_empty()) {
            Some(code) => code,
            None => {
                // The password was right, so this doesn't count towards lockout.
                record(ctx, Some(&account), &email, &ip_address, &location, &request, false,
                    Some("two-factor code required")).await?;
                return Err(ErrorCode::TwoFactorRequired
                    .with_msg("A two-factor code is required").into())
            },
        };

        if !totp::verify(secret, code, ctx.config().totp_skew, now)? {
            record(ctx, Some(&account), &email, &ip_address, &location, &request, false,
                Some("invalid two-factor code")).await?;
            return Err(Status::from(register_failure(ctx, &account).await?))
        }
    }

    // Compare this login's location to the previous one - purely advisory.
    let previous = account.last_login_ip.as_deref()
        .map(|previous_ip| ctx.geo().resolve(previous_ip))
        .unwrap_or_default();
    let suspicious_login = geo::is_suspicious(&location, &previous,
        ctx.config().suspicious_distance_km);

    if suspicious_login {
        tracing::warn!("Suspicious login for account {} from {} ({:?} -> {:?})",
            account.account_id, ip_address, previous.country, location.country);
    }

    record(ctx, Some(&account), &email, &ip_address, &location, &request, true, None).await?;
    ctx.db().record_login_success(&account.account_id, now, &ip_address).await?;

    let token = token::sign(ctx.config(), now, &account)?;

    // Re-read so the response reflects the reset counters and login stamp.
    let account = ctx.db().account_by_id(&account.account_id).await?
        .ok_or_else(|| ErrorCode::AccountNotFound.with_msg("The account does not exist"))?;

    Ok(Response::new(api::LoginResponse {
        token,
        must_change_password: account.force_password_reset,
        account: Some(api::Account::from(&account)),
        suspicious_login,
    }))
}

///
/// Bump the failure counter and move the account into whichever lock state
/// the new count calls for. The attempt that trips a lock reports the lock,
/// not a generic credential failure.
///
async fn register_failure(ctx: &ServiceContext, account: &Account)
    -> Result<WardenError, WardenError> {

    let now = ctx.now();
    let failures = ctx.db().increment_failed_attempts(&account.account_id, now).await?;
    let state = ctx.lockout().after_failure(failures, now);
    ctx.db().apply_lock_state(&account.account_id, &state, now).await?;

    Ok(match state {
        LockState::HardLocked { .. } => hard_locked(),
        LockState::SoftLocked { .. } => ErrorCode::AccountSoftLocked
            .with_msg(&format!("Too many failed attempts, the account is locked for {} minutes",
                ctx.config().lock_duration_minutes)),
        LockState::Unlocked => invalid_credentials(),
    })
}

#[allow(clippy::too_many_arguments)]
async fn record(
    ctx: &ServiceContext,
    account: Option<&Account>,
    email: &str,
    ip_address: &str,
    location: &GeoLocation,
    request: &api::LoginRequest,
    success: bool,
    failure_reason: Option<&str>) -> Result<(), WardenError> {

    ctx.db().record_attempt(&LoginAttempt {
        attempt_id: generate_id(),
        account_id: account.map(|account| account.account_id.clone()),
        email: email.to_string(),
        ip_address: ip_address.to_string(),
        location: Some(location.clone()),
        success,
        failure_reason: failure_reason.map(str::to_string),
        user_agent: request.user_agent.clone(),
        created_on: bson::DateTime::from_chrono(ctx.now()),
    }).await
}

fn invalid_credentials() -> WardenError {
    ErrorCode::InvalidCredentials.with_msg("Invalid email address or password")
}

fn hard_locked() -> WardenError {
    ErrorCode::AccountHardLocked.with_msg("The account is locked, contact an administrator")
}
