use chrono::Duration;
use tonic::{Request, Response, Status};
use super::{ServiceContext, authorise_admin};
use crate::grpc::{admin, common};

pub async fn get_stats(ctx: &ServiceContext, request: Request<common::Empty>)
    -> Result<Response<admin::StatsResponse>, Status> {

    authorise_admin(ctx, request.metadata())?;

    let failed_since = ctx.now() - Duration::hours(24);
    let stats = ctx.db().stats(failed_since).await?;

    Ok(Response::new(admin::StatsResponse {
        total_accounts: stats.total_accounts,
        active_accounts: stats.active_accounts,
        hard_locked_accounts: stats.hard_locked_accounts,
        two_factor_accounts: stats.two_factor_accounts,
        recent_failed_attempts: stats.recent_failed_attempts,
    }))
}
