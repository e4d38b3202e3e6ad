use crate::helpers::{spawn_app, valid_submission, SubjectContains, SEND_PATH};
use contact_mailer::contact_client::{ContactClient, SubmissionReceipt, SubmitError};
use contact_mailer::domain::validate;
use std::time::Duration;
use wiremock::matchers::path;
use wiremock::{Mock, ResponseTemplate};

fn client_for(endpoint: &str) -> ContactClient {
    let endpoint = reqwest::Url::parse(endpoint).unwrap();
    ContactClient::new(endpoint, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn a_validated_submission_travels_through_the_whole_pipeline() {
    // Arrange
    let app = spawn_app().await;
    app.mount_token_endpoint().await;

    Mock::given(path(SEND_PATH))
        .and(SubjectContains("Dione Morales".into()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "abc123" })),
        )
        .expect(1)
        .mount(&app.email_server)
        .await;

    let submission = validate(valid_submission()).expect("The submission should be valid");

    // Act
    let receipt = client_for(&app.contact_endpoint())
        .submit(&submission)
        .await
        .unwrap();

    // Assert
    assert_eq!(
        receipt,
        SubmissionReceipt {
            success: true,
            message_id: Some("abc123".to_string()),
        }
    );
}

#[tokio::test]
async fn a_failed_dispatch_is_surfaced_to_the_client() {
    let app = spawn_app().await;
    app.mount_token_endpoint().await;

    Mock::given(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let submission = validate(valid_submission()).unwrap();

    let outcome = client_for(&app.contact_endpoint())
        .submit(&submission)
        .await;

    match outcome {
        Err(SubmitError::Rejected { status, message }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "Error sending email");
        }
        other => panic!("Expected the submission to be rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn an_unauthenticated_gate_is_surfaced_to_the_client() {
    let app = spawn_app().await;
    app.revoke_refresh_token().await;

    let submission = validate(valid_submission()).unwrap();

    let outcome = client_for(&app.contact_endpoint())
        .submit(&submission)
        .await;

    assert!(matches!(
        outcome,
        Err(SubmitError::Rejected { status, .. }) if status.as_u16() == 401
    ));
}
