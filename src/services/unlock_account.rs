use tonic::{Request, Response, Status};
use super::{ServiceContext, authorise_admin};
use crate::grpc::{admin, warden as api};
use crate::utils::errors::ErrorCode;

///
/// Administrative release of any lock - hard locks can only be cleared here.
///
pub async fn unlock_account(ctx: &ServiceContext, request: Request<admin::AccountIdRequest>)
    -> Result<Response<admin::AccountResponse>, Status> {

    authorise_admin(ctx, request.metadata())?;
    let request = request.into_inner();

    ctx.db().unlock_account(&request.account_id, ctx.now()).await?;

    let account = ctx.db().account_by_id(&request.account_id).await?
        .ok_or_else(|| Status::from(ErrorCode::AccountNotFound
            .with_msg("The account does not exist")))?;

    tracing::info!("Account {} unlocked", account.account_id);

    Ok(Response::new(admin::AccountResponse { account: Some(api::Account::from(&account)) }))
}
