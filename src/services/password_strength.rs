use tonic::{Request, Response, Status};
use super::ServiceContext;
use crate::grpc::warden as api;
use crate::model::password_rules;

///
/// Advisory scoring for sign-up forms - no authentication, nothing stored.
///
pub async fn check_password_strength(_ctx: &ServiceContext, request: Request<api::PasswordStrengthRequest>)
    -> Result<Response<api::PasswordStrengthResponse>, Status> {

    let request = request.into_inner();

    let report = password_rules::check_complexity(&request.password);
    let strength = password_rules::strength(&request.password);

    Ok(Response::new(api::PasswordStrengthResponse {
        strength,
        is_valid: report.is_valid(),
        violations: report.violations().iter().map(|v| v.message().to_string()).collect(),
        feedback: password_rules::feedback(strength).to_string(),
    }))
}
