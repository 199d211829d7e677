use tonic::{Request, Response, Status};
use super::ServiceContext;
use crate::grpc::{common, warden as api};
use crate::model::attempt::PasswordHistoryEntry;
use crate::model::password_rules;
use crate::utils::errors::ErrorCode;
use crate::utils::token;

pub async fn change_password(ctx: &ServiceContext, request: Request<api::ChangePasswordRequest>)
    -> Result<Response<common::Empty>, Status> {

    let claims = token::authenticate(ctx, request.metadata())?;
    let request = request.into_inner();

    let account = ctx.db().account_by_id(&claims.sub).await?
        .ok_or_else(|| Status::from(ErrorCode::AccountNotFound
            .with_msg("The account does not exist")))?;

    if !ctx.verify_password(&request.current_password, &account.phc).await? {
        return Err(ErrorCode::InvalidCredentials
            .with_msg("The current password is incorrect").into())
    }

    let report = password_rules::check_complexity(&request.new_password);
    if !report.is_valid() {
        return Err(report.into_error().into())
    }

    // Hashes are salted, so the only way to spot re-use is to verify the new
    // plain-text against each retired hash.
    let history = ctx.db()
        .password_history(&account.account_id, ctx.config().password_history_limit)
        .await?;

    for entry in &history {
        if ctx.verify_password(&request.new_password, &entry.phc).await? {
            return Err(ErrorCode::PasswordUsedBefore
                .with_msg(&format!("The password matches one of the last {} used",
                    ctx.config().password_history_limit)).into())
        }
    }

    let phc = ctx.hash_password(&request.new_password).await?;
    let now = ctx.now();

    // Also releases any pending forced reset.
    ctx.db().update_password(&account.account_id, &phc, now).await?;

    ctx.db().add_password_history(&PasswordHistoryEntry {
        account_id: account.account_id.clone(),
        phc,
        changed_on: bson::DateTime::from_chrono(now),
    }).await?;

    tracing::info!("Password changed for account {}", account.account_id);

    Ok(Response::new(common::Empty {}))
}
