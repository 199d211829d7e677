use tonic::{Request, Response, Status};
use super::ServiceContext;
use crate::grpc::{common, warden as api};
use crate::utils::errors::ErrorCode;
use crate::utils::{token, totp};

///
/// Issue a fresh secret for an authenticator app. Two-factor stays off until
/// the caller proves possession of the secret via EnableTwoFactor.
///
pub async fn setup_two_factor(ctx: &ServiceContext, request: Request<common::Empty>)
    -> Result<Response<api::SetupTwoFactorResponse>, Status> {

    let claims = token::authenticate(ctx, request.metadata())?;

    let account = ctx.db().account_by_id(&claims.sub).await?
        .ok_or_else(|| Status::from(ErrorCode::AccountNotFound
            .with_msg("The account does not exist")))?;

    if account.two_factor_enabled {
        return Err(ErrorCode::TwoFactorAlreadyEnabled
            .with_msg("Two-factor is already enabled on this account").into())
    }

    let secret = totp::generate_secret();
    let provisioning_uri = totp::provisioning_uri(
        &secret,
        &ctx.config().totp_issuer,
        &account.email,
        ctx.config().totp_skew)?;

    ctx.db().set_two_factor_secret(&account.account_id, &secret, ctx.now()).await?;

    Ok(Response::new(api::SetupTwoFactorResponse { secret, provisioning_uri }))
}

pub async fn enable_two_factor(ctx: &ServiceContext, request: Request<api::EnableTwoFactorRequest>)
    -> Result<Response<common::Empty>, Status> {

    let claims = token::authenticate(ctx, request.metadata())?;
    let request = request.into_inner();

    let account = ctx.db().account_by_id(&claims.sub).await?
        .ok_or_else(|| Status::from(ErrorCode::AccountNotFound
            .with_msg("The account does not exist")))?;

    if account.two_factor_enabled {
        return Err(ErrorCode::TwoFactorAlreadyEnabled
            .with_msg("Two-factor is already enabled on this account").into())
    }

    let secret = account.two_factor_secret.as_deref()
        .ok_or_else(|| Status::from(ErrorCode::TwoFactorNotSetup
            .with_msg("Call SetupTwoFactor before enabling")))?;

    if !totp::verify(secret, &request.two_factor_code, ctx.config().totp_skew, ctx.now())? {
        return Err(ErrorCode::InvalidTwoFactorCode
            .with_msg("The two-factor code is not valid").into())
    }

    ctx.db().set_two_factor_enabled(&account.account_id, ctx.now()).await?;

    tracing::info!("Two-factor enabled for account {}", account.account_id);

    Ok(Response::new(common::Empty {}))
}
