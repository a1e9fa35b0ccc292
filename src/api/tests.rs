use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::{AppointmentStatus, BookingRequest, NewClient, UserDocument};
use crate::state::AppState;
use crate::testing::{test_state, test_state_with_mailer, unconfigured_state, RecordingMailer};

macro_rules! init_app {
    ($data:expr) => {
        test::init_service(App::new().app_data($data.clone()).configure(super::configure)).await
    };
}

macro_rules! signup {
    ($app:expr, $email:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({ "email": $email, "password": "secret123", "name": "Owner" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        assert_eq!(body["success"], true);
        body["token"].as_str().unwrap().to_string()
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

#[actix_web::test]
async fn test_health_reports_store() {
    let data = web::Data::new(test_state());
    let app = init_app!(data);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store_configured"], true);
}

#[actix_web::test]
async fn test_logout_then_me_is_unauthenticated() {
    let data = web::Data::new(test_state());
    let app = init_app!(data);
    let token = signup!(app, "owner@salon.com");

    let req = test::TestRequest::get().uri("/api/v1/me").insert_header(bearer(&token)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["email"], "owner@salon.com");

    let req = test::TestRequest::post().uri("/api/v1/logout").insert_header(bearer(&token)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(data.sessions.len(), 0);

    let req = test::TestRequest::get().uri("/api/v1/me").insert_header(bearer(&token)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["authenticated"], false);

    // Logging out again is fine
    let req = test::TestRequest::post().uri("/api/v1/logout").insert_header(bearer(&token)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_session_cookie_authenticates() {
    let data = web::Data::new(test_state());
    let app = init_app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "email": "c@x.com", "password": "secret123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "session")
        .map(|c| c.into_owned())
        .expect("session cookie");
    assert!(cookie.http_only().unwrap_or(false));

    let req = test::TestRequest::get().uri("/api/v1/load").cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert!(body["data"].is_null());
}

#[actix_web::test]
async fn test_save_then_load_round_trip() {
    let data = web::Data::new(test_state());
    let app = init_app!(data);
    let token = signup!(app, "owner@salon.com");

    let mut document = UserDocument::default();
    document.business_profile.name = "Studio Bloom".into();
    document
        .add_client(NewClient { name: "Ana".into(), email: Some("ana@x.com".into()), ..Default::default() })
        .unwrap();
    document
        .book_appointment(BookingRequest {
            client_name: Some("Ana".into()),
            date: "2026-04-01".into(),
            time: "14:30".into(),
            status: Some(AppointmentStatus::Confirmed),
            ..Default::default()
        })
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/save")
        .insert_header(bearer(&token))
        .set_json(&document)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/v1/load").insert_header(bearer(&token)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let loaded: UserDocument = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(loaded, document);
}

#[actix_web::test]
async fn test_data_routes_require_session() {
    let data = web::Data::new(test_state());
    let app = init_app!(data);

    for uri in ["/api/v1/load", "/api/v1/savepoints", "/api/v1/keys"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }
}

#[actix_web::test]
async fn test_unconfigured_backend_returns_503() {
    let data = web::Data::new(unconfigured_state());
    let app = init_app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({ "email": "a@x.com", "password": "secret123" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::SERVICE_UNAVAILABLE);

    let token = data.sessions.create("a@x.com").unwrap();
    let req = test::TestRequest::get().uri("/api/v1/load").insert_header(bearer(&token)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let data = web::Data::new(test_state());
    let app = init_app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/email")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_save_point_returns_identical_snapshot() {
    let data = web::Data::new(test_state());
    let app = init_app!(data);
    let token = signup!(app, "owner@salon.com");

    let snapshot = json!({
        "businessProfile": { "name": "Studio Bloom", "services": [] },
        "clients": [{ "id": "c1", "name": "Ana", "createdAt": 1 }],
        "appointments": [],
        "customField": { "nested": [1, 2.5, "x", null] }
    });

    let req = test::TestRequest::post()
        .uri("/api/v1/savepoints")
        .insert_header(bearer(&token))
        .set_json(json!({ "device_id": "dev-abc", "device_name": "Laptop", "label": "v1", "data": snapshot }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id = body["save_point"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri("/api/v1/savepoints").insert_header(bearer(&token)).to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list["count"], 1);
    assert!(list["save_points"][0].get("data").is_none());

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/savepoints/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["save_point"]["data"], snapshot);
    assert_eq!(fetched["save_point"]["device_id"], "dev-abc");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/savepoints/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/savepoints/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_ai_api_completion_sends_one_rating_request() {
    let mailer = Arc::new(RecordingMailer::default());
    let data: web::Data<AppState> = web::Data::new(test_state_with_mailer(mailer.clone()));
    let app = init_app!(data);
    let token = signup!(app, "owner@salon.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/keys")
        .insert_header(bearer(&token))
        .set_json(json!({ "label": "assistant" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let key = created["key"].as_str().unwrap().to_string();

    // Session tokens are not API keys
    let req = test::TestRequest::get().uri("/api/v1/ai/stats").insert_header(bearer(&token)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/ai/appointments")
        .insert_header(bearer(&key))
        .set_json(json!({ "client_name": "Ana", "client_email": "ana@x.com", "date": "2026-04-02", "time": "10:00" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let booked: Value = test::read_body_json(resp).await;
    let appointment_id = booked["appointment"]["id"].as_str().unwrap().to_string();
    assert_eq!(booked["created_client"]["name"], "Ana");

    let uri = format!("/api/v1/ai/appointments/{}", appointment_id);
    for expected in [true, false] {
        let req = test::TestRequest::patch()
            .uri(&uri)
            .insert_header(bearer(&key))
            .set_json(json!({ "status": "COMPLETED" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["appointment"]["status"], "COMPLETED");
        assert_eq!(body["rating_request_sent"], expected);
    }
    assert_eq!(mailer.sent().len(), 1);

    let req = test::TestRequest::get().uri("/api/v1/ai/stats").insert_header(bearer(&key)).to_request();
    let stats: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stats["stats"]["completed"], 1);

    // The emailed link leads to the public rating page
    let email_body = mailer.sent()[0].body.clone();
    let rating_token = email_body
        .split("/rate/")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap()
        .to_string();

    let uri = format!("/api/v1/public/ratings/{}", rating_token);
    let req = test::TestRequest::get().uri(&uri).to_request();
    let info: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(info["client_name"], "Ana");
    assert_eq!(info["already_rated"], false);

    let req = test::TestRequest::post().uri(&uri).set_json(json!({ "score": 5, "comment": "Lovely" })).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let req = test::TestRequest::post().uri(&uri).set_json(json!({ "score": 4 })).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get().uri("/api/v1/load").insert_header(bearer(&token)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["ratings"][0]["score"], 5);
}

#[actix_web::test]
async fn test_rating_request_route() {
    let mailer = Arc::new(RecordingMailer::default());
    let data = web::Data::new(test_state_with_mailer(mailer.clone()));
    let app = init_app!(data);
    let token = signup!(app, "owner@salon.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/notifications/rating-request")
        .insert_header(bearer(&token))
        .set_json(json!({ "appointment_id": "a1", "client_name": "Bia", "client_email": "bia@x.com" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert!(body["rating_link"].as_str().unwrap().contains("/rate/"));
    assert_eq!(mailer.sent()[0].to, "bia@x.com");
}
