use tonic::{Request, Response, Status};
use super::{AttemptsStream, ServiceContext, authorise_admin};
use crate::grpc::admin;

const DEFAULT_LIMIT: u32 = 50;

///
/// Stream the audit ledger, most recent attempt first.
///
pub async fn get_login_attempts(ctx: &ServiceContext, request: Request<admin::GetLoginAttemptsRequest>)
    -> Result<Response<AttemptsStream>, Status> {

    authorise_admin(ctx, request.metadata())?;
    let request = request.into_inner();

    let limit = match request.limit {
        0 => DEFAULT_LIMIT,
        limit => limit,
    };

    let attempts: Vec<Result<admin::LoginAttempt, Status>> = ctx.db()
        .attempts(limit, request.failed_only)
        .await?
        .iter()
        .map(|attempt| Ok(admin::LoginAttempt::from(attempt)))
        .collect();

    let stream: AttemptsStream = Box::pin(futures::stream::iter(attempts));
    Ok(Response::new(stream))
}
