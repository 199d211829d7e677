pub mod change_password;
pub mod force_reset;
pub mod get_accounts;
pub mod get_login_attempts;
pub mod get_stats;
pub mod login;
pub mod password_strength;
pub mod register;
pub mod set_time;
pub mod two_factor;
pub mod unlock_account;

use futures::Stream;
use std::{pin::Pin, sync::Arc};
use tonic::{Request, Response, Status, metadata::MetadataMap};
use tracing::instrument;
use crate::grpc::{admin, common, warden as api};
use crate::grpc::admin::admin_server::Admin;
use crate::grpc::warden::warden_server::Warden;
use crate::utils::errors::WardenError;
use crate::utils::token::{self, Claims};

pub use crate::utils::context::ServiceContext;

pub type AttemptsStream = Pin<Box<dyn Stream<Item = Result<admin::LoginAttempt, Status>> + Send + Sync>>;

///
/// Emails are matched case-insensitively - normalise on the way in.
///
pub fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn authorise_admin(ctx: &ServiceContext, metadata: &MetadataMap) -> Result<Claims, WardenError> {
    let claims = token::authenticate(ctx, metadata)?;
    token::require_admin(&claims)?;
    Ok(claims)
}

///
/// Implementation for all the gRPC service endpoints defined in the .proto files.
///
#[tonic::async_trait]
impl Warden for Arc<ServiceContext> {
    #[instrument(skip(self, request))]
    async fn register(&self, request: Request<api::RegisterRequest>)
        -> Result<Response<api::RegisterResponse>, Status> {
        register::register(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn login(&self, request: Request<api::LoginRequest>)
        -> Result<Response<api::LoginResponse>, Status> {
        login::login(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn change_password(&self, request: Request<api::ChangePasswordRequest>)
        -> Result<Response<common::Empty>, Status> {
        change_password::change_password(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn setup_two_factor(&self, request: Request<common::Empty>)
        -> Result<Response<api::SetupTwoFactorResponse>, Status> {
        two_factor::setup_two_factor(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn enable_two_factor(&self, request: Request<api::EnableTwoFactorRequest>)
        -> Result<Response<common::Empty>, Status> {
        two_factor::enable_two_factor(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn check_password_strength(&self, request: Request<api::PasswordStrengthRequest>)
        -> Result<Response<api::PasswordStrengthResponse>, Status> {
        password_strength::check_password_strength(self, request).await
    }
}

#[tonic::async_trait]
impl Admin for Arc<ServiceContext> {
    type GetLoginAttemptsStream = AttemptsStream;

    #[instrument(skip(self))]
    async fn ping(&self, _request: Request<common::Empty>)
        -> Result<Response<common::Empty>, Status> {
        Ok(Response::new(common::Empty::default()))
    }

    #[instrument(skip(self, request))]
    async fn get_accounts(&self, request: Request<common::Empty>)
        -> Result<Response<admin::GetAccountsResponse>, Status> {
        get_accounts::get_accounts(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn get_account(&self, request: Request<admin::AccountIdRequest>)
        -> Result<Response<admin::GetAccountResponse>, Status> {
        get_accounts::get_account(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn unlock_account(&self, request: Request<admin::AccountIdRequest>)
        -> Result<Response<admin::AccountResponse>, Status> {
        unlock_account::unlock_account(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn force_password_reset(&self, request: Request<admin::AccountIdRequest>)
        -> Result<Response<admin::AccountResponse>, Status> {
        force_reset::force_password_reset(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn get_login_attempts(&self, request: Request<admin::GetLoginAttemptsRequest>)
        -> Result<Response<Self::GetLoginAttemptsStream>, Status> {
        get_login_attempts::get_login_attempts(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn get_stats(&self, request: Request<common::Empty>)
        -> Result<Response<admin::StatsResponse>, Status> {
        get_stats::get_stats(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn set_time(&self, request: Request<admin::NewTime>)
        -> Result<Response<common::Empty>, Status> {
        set_time::set_time(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn reset_time(&self, request: Request<common::Empty>)
        -> Result<Response<common::Empty>, Status> {
        set_time::reset_time(self, request).await
    }
}
