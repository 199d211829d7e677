use tonic::{Request, Response, Status};
use super::{ServiceContext, authorise_admin};
use crate::grpc::{admin, common, warden as api};
use crate::utils::errors::ErrorCode;

const RECENT_ATTEMPTS: u32 = 10;

pub async fn get_accounts(ctx: &ServiceContext, request: Request<common::Empty>)
    -> Result<Response<admin::GetAccountsResponse>, Status> {

    authorise_admin(ctx, request.metadata())?;

    let accounts = ctx.db().accounts().await?
        .iter()
        .map(api::Account::from)
        .collect();

    Ok(Response::new(admin::GetAccountsResponse { accounts }))
}

pub async fn get_account(ctx: &ServiceContext, request: Request<admin::AccountIdRequest>)
    -> Result<Response<admin::GetAccountResponse>, Status> {

    authorise_admin(ctx, request.metadata())?;
    let request = request.into_inner();

    let account = ctx.db().account_by_id(&request.account_id).await?
        .ok_or_else(|| Status::from(ErrorCode::AccountNotFound
            .with_msg("The account does not exist")))?;

    let recent_attempts = ctx.db()
        .attempts_for_account(&account.account_id, RECENT_ATTEMPTS)
        .await?
        .iter()
        .map(admin::LoginAttempt::from)
        .collect();

    Ok(Response::new(admin::GetAccountResponse {
        account: Some(api::Account::from(&account)),
        recent_attempts,
    }))
}
