use tonic::{Request, Response, Status};
use super::{ServiceContext, authorise_admin};
use crate::grpc::{admin, warden as api};
use crate::utils::errors::ErrorCode;

///
/// Flag an account so its next login demands a password change.
///
pub async fn force_password_reset(ctx: &ServiceContext, request: Request<admin::AccountIdRequest>)
    -> Result<Response<admin::AccountResponse>, Status> {

    authorise_admin(ctx, request.metadata())?;
    let request = request.into_inner();

    ctx.db().set_force_password_reset(&request.account_id, ctx.now()).await?;

    let account = ctx.db().account_by_id(&request.account_id).await?
        .ok_or_else(|| Status::from(ErrorCode::AccountNotFound
            .with_msg("The account does not exist")))?;

    Ok(Response::new(admin::AccountResponse { account: Some(api::Account::from(&account)) }))
}
