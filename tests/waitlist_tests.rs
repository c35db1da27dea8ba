use actix_web::{http::StatusCode, test};
use serde_json::json;

mod common;
use common::TestApp;

#[actix_web::test]
async fn test_join_waitlist() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/waitlist")
        .set_json(json!({ "email": "early@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/waitlist")
        .set_json(json!({ "email": "early@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "This email is already on the waitlist.");
}

#[actix_web::test]
async fn test_join_waitlist_rejects_bad_addresses() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    for body in [json!({ "email": "not-an-email" }), json!({})] {
        let req = test::TestRequest::post()
            .uri("/api/waitlist")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid email address provided.");
    }
}
