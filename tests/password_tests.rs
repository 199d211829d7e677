mod common;

use chrono::Duration;
use tonic::{Code, Request};
use warden::db::Datastore;
use warden::grpc::warden as api;
use warden::services;
use crate::common::{error_code, fixed_time, login, register, start_warden, with_bearer, token_for};

const PASSWORD: &str = "Str0ng!Pass";

#[tokio::test]
async fn test_registration_rejects_a_weak_password_with_every_violation() {
    let harness = start_warden();

    let request = Request::new(api::RegisterRequest {
        email: String::from("bob@example.com"),
        password: String::from("password"),
        first_name: String::from("Bob"),
        last_name: String::from("Smith"),
    });

    let status = services::register::register(&harness.ctx, request)
        .await
        .expect_err("A weak password was accepted");

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(error_code(&status), 2000 /* PasswordDoesNotMeetPolicy */);

    // Every broken rule is reported, not just the first.
    assert!(status.message().contains("uppercase"));
    assert!(status.message().contains("number"));
    assert!(status.message().contains("symbol"));
}

#[tokio::test]
async fn test_registration_rejects_a_duplicate_email() {
    let harness = start_warden();
    register(&harness, "bob@example.com", PASSWORD).await;

    let request = Request::new(api::RegisterRequest {
        email: String::from(" BOB@Example.Com "), // Same address once normalised.
        password: String::from(PASSWORD),
        first_name: String::from("Bob"),
        last_name: String::from("Smith"),
    });

    let status = services::register::register(&harness.ctx, request)
        .await
        .expect_err("A duplicate email was accepted");

    assert_eq!(status.code(), Code::AlreadyExists);
    assert_eq!(error_code(&status), 2201 /* EmailAlreadyRegistered */);

    // The refused registration still lands in the audit ledger.
    let attempts = harness.db.attempts(10, true).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].failure_reason.as_deref(), Some("email already registered"));
    assert!(attempts[0].account_id.is_none());
}

#[tokio::test]
async fn test_password_strength_is_advisory_only() {
    let harness = start_warden();

    let response = services::password_strength::check_password_strength(&harness.ctx,
        Request::new(api::PasswordStrengthRequest { password: String::from("password") }))
        .await
        .unwrap()
        .into_inner();

    assert!(!response.is_valid);
    assert_eq!(response.violations.len(), 3);
    assert_eq!(response.feedback, "Weak");

    let response = services::password_strength::check_password_strength(&harness.ctx,
        Request::new(api::PasswordStrengthRequest { password: String::from("Ab1!Ab1!Ab1!Ab1!Ab1!x") }))
        .await
        .unwrap()
        .into_inner();

    assert!(response.is_valid);
    assert!(response.violations.is_empty());
    assert_eq!(response.strength, 90);
    assert_eq!(response.feedback, "Very Strong");
}

#[tokio::test]
async fn test_a_password_can_be_changed_and_the_old_one_stops_working() {
    let harness = start_warden();
    let account = register(&harness, "bob@example.com", PASSWORD).await;
    let token = token_for(&harness, &account.account_id);

    let request = with_bearer(Request::new(api::ChangePasswordRequest {
        current_password: String::from(PASSWORD),
        new_password: String::from("N3w!Passw0rd"),
    }), &token);

    services::change_password::change_password(&harness.ctx, request)
        .await
        .expect("Unable to change password");

    let status = login(&harness, "bob@example.com", PASSWORD, "1.1.1.1")
        .await
        .expect_err("The old password still works");
    assert_eq!(error_code(&status), 2103 /* InvalidCredentials */);

    login(&harness, "bob@example.com", "N3w!Passw0rd", "1.1.1.1")
        .await
        .expect("The new password doesn't work");
}

#[tokio::test]
async fn test_changing_a_password_requires_the_current_one() {
    let harness = start_warden();
    let account = register(&harness, "bob@example.com", PASSWORD).await;
    let token = token_for(&harness, &account.account_id);

    let request = with_bearer(Request::new(api::ChangePasswordRequest {
        current_password: String::from("Wr0ng!Pass"),
        new_password: String::from("N3w!Passw0rd"),
    }), &token);

    let status = services::change_password::change_password(&harness.ctx, request)
        .await
        .expect_err("A wrong current password was accepted");

    assert_eq!(status.code(), Code::Unauthenticated);
    assert_eq!(error_code(&status), 2103 /* InvalidCredentials */);
}

#[tokio::test]
async fn test_recent_passwords_cannot_be_reused() {
    let harness = start_warden();
    let account = register(&harness, "bob@example.com", PASSWORD).await;
    let token = token_for(&harness, &account.account_id);

    // The registration password is already in the history.
    let request = with_bearer(Request::new(api::ChangePasswordRequest {
        current_password: String::from(PASSWORD),
        new_password: String::from(PASSWORD),
    }), &token);

    let status = services::change_password::change_password(&harness.ctx, request)
        .await
        .expect_err("A re-used password was accepted");

    assert_eq!(status.code(), Code::AlreadyExists);
    assert_eq!(error_code(&status), 2012 /* PasswordUsedBefore */);
}

#[tokio::test]
async fn test_a_password_rotated_out_of_the_history_can_be_reused() {
    let harness = start_warden();
    let account = register(&harness, "bob@example.com", PASSWORD).await;

    // Five changes push the original password out of the 5-entry history.
    // Advance the clock between changes so history ordering is unambiguous.
    let passwords = ["Ch4nge!One", "Ch4nge!Two", "Ch4nge!Three", "Ch4nge!Four", "Ch4nge!Five"];
    let mut current = PASSWORD.to_string();

    for (index, next) in passwords.iter().enumerate() {
        harness.ctx.set_now(Some(fixed_time() + Duration::minutes(index as i64 + 1)));

        let token = token_for(&harness, &account.account_id);
        let request = with_bearer(Request::new(api::ChangePasswordRequest {
            current_password: current.clone(),
            new_password: next.to_string(),
        }), &token);

        services::change_password::change_password(&harness.ctx, request)
            .await
            .expect("Unable to change password");

        current = next.to_string();
    }

    harness.ctx.set_now(Some(fixed_time() + Duration::minutes(10)));
    let token = token_for(&harness, &account.account_id);
    let request = with_bearer(Request::new(api::ChangePasswordRequest {
        current_password: current,
        new_password: String::from(PASSWORD),
    }), &token);

    services::change_password::change_password(&harness.ctx, request)
        .await
        .expect("A password outside the history window was rejected");
}
