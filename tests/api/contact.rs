use crate::helpers::{spawn_app, valid_submission, SubjectContains, SEND_PATH};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn contact_returns_200_and_sends_one_email_for_a_valid_submission() {
    // Arrange
    let app = spawn_app().await;
    app.mount_token_endpoint().await;

    Mock::given(path(SEND_PATH))
        .and(method("POST"))
        .and(header("Authorization", "Bearer test-access-token"))
        .and(SubjectContains("Dione Morales".into()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "abc123",
            "threadId": "abc123",
            "labelIds": ["SENT"]
        })))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_contact(&valid_submission()).await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Email sent successfully");
    assert_eq!(body["messageId"], "abc123");
}

#[tokio::test]
async fn contact_accepts_a_numeric_phone() {
    let app = spawn_app().await;
    app.mount_token_endpoint().await;

    Mock::given(path(SEND_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "abc123" })),
        )
        .expect(1)
        .mount(&app.email_server)
        .await;

    let mut submission = valid_submission();
    submission["phone"] = serde_json::json!(48123456789u64);
    let response = app.post_contact(&submission).await;

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn contact_returns_500_without_leaking_provider_errors() {
    // Arrange
    let app = spawn_app().await;
    app.mount_token_endpoint().await;

    Mock::given(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {
                "code": 429,
                "message": "Quota exceeded for quota metric 'Queries'",
                "status": "RESOURCE_EXHAUSTED"
            }
        })))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    let response = app.post_contact(&valid_submission()).await;

    // Assert
    assert_eq!(response.status().as_u16(), 500);
    let text = response.text().await.unwrap();
    assert!(!text.contains("Quota"));
    assert!(!text.contains("RESOURCE_EXHAUSTED"));
    let body: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Error sending email");
}

#[tokio::test]
async fn contact_rejects_every_method_but_post() {
    let app = spawn_app().await;
    app.mount_token_endpoint().await;

    Mock::given(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    for method in [
        reqwest::Method::GET,
        reqwest::Method::PUT,
        reqwest::Method::PATCH,
        reqwest::Method::DELETE,
    ] {
        let response = app
            .api_client
            .request(method.clone(), &app.contact_endpoint())
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            response.status().as_u16(),
            405,
            "The API did not answer {} with 405 Method Not Allowed.",
            method
        );
        assert_eq!(response.headers().get("Allow").unwrap(), "POST");
    }
}

#[tokio::test]
async fn contact_returns_400_for_invalid_fields_and_sends_nothing() {
    // Arrange
    let app = spawn_app().await;
    app.mount_token_endpoint().await;

    Mock::given(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let test_cases = vec![
        ("consent", serde_json::json!(false), "consent withheld"),
        ("message", serde_json::json!("Too short"), "message too short"),
        ("message", serde_json::json!("a".repeat(501)), "message too long"),
        ("email", serde_json::json!("definitely-not-an-email"), "invalid email"),
        ("name", serde_json::json!("D"), "name too short"),
        ("phone", serde_json::json!("12345"), "phone too short"),
        ("type", serde_json::json!("spam"), "unknown type"),
    ];

    for (field, value, description) in test_cases {
        let mut submission = valid_submission();
        submission[field] = value;

        // Act
        let response = app.post_contact(&submission).await;

        // Assert
        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not return a 400 Bad Request when the payload had {}.",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(
            body["errors"][field].is_string(),
            "No error was reported for `{}` when the payload had {}.",
            field,
            description
        );
    }
}

#[tokio::test]
async fn contact_returns_400_for_malformed_bodies() {
    let app = spawn_app().await;
    app.mount_token_endpoint().await;

    let mut missing_email = valid_submission();
    missing_email.as_object_mut().unwrap().remove("email");
    let test_cases = vec![
        (missing_email.to_string(), "a missing email"),
        ("name=Dione".to_string(), "a form-encoded body"),
        ("".to_string(), "an empty body"),
    ];

    for (body, description) in test_cases {
        let response = app
            .api_client
            .post(&app.contact_endpoint())
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not return a 400 Bad Request for {}.",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Malformed submission");
    }
}

#[tokio::test]
async fn the_access_token_is_reused_across_submissions() {
    let app = spawn_app().await;

    Mock::given(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "test-access-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(path(SEND_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "abc123" })),
        )
        .expect(2)
        .mount(&app.email_server)
        .await;

    for _ in 0..2 {
        let response = app.post_contact(&valid_submission()).await;
        assert_eq!(response.status().as_u16(), 200);
    }
}

#[tokio::test]
async fn submitted_html_is_escaped_in_the_notification() {
    let app = spawn_app().await;
    app.mount_token_endpoint().await;

    Mock::given(path(SEND_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "abc123" })),
        )
        .expect(1)
        .mount(&app.email_server)
        .await;

    let mut submission = valid_submission();
    submission["message"] = serde_json::json!("<img src=x onerror=alert(1)> hello there");
    let response = app.post_contact(&submission).await;
    assert_eq!(response.status().as_u16(), 200);

    let requests = app.email_server.received_requests().await.unwrap();
    let send_request = requests
        .iter()
        .find(|r| r.url.path() == SEND_PATH)
        .unwrap();
    let message = crate::helpers::decoded_message(send_request).unwrap();
    let html = crate::helpers::html_part(&message).unwrap();

    assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    assert!(!html.contains("<img"));
}
