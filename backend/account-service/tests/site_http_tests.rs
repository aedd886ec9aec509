/// HTTP tests for the site actions, run against in-memory collaborators
mod common;

use actix_web::{http::StatusCode, test, App};
use serde_json::Value;

use account_service::{config::Config, middleware::AccessControl, models::UserStatus, routes};
use common::*;

macro_rules! init_app {
    ($app:expr) => {
        test::init_service(
            App::new()
                .app_data($app.state.clone())
                .wrap(AccessControl::default())
                .configure(routes::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_guest_is_sent_to_login_and_returned_after() {
    // GIVEN: A guest and an active account
    let app = test_app(Config::default(), vec![user("alice", UserStatus::Active)]);
    let service = init_app!(app);

    // WHEN: The guest opens the contact page
    let req = test::TestRequest::get().uri("/site/contact").to_request();
    let resp = test::call_service(&service, req).await;

    // THEN: Redirect to login, with the page remembered in the session
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/site/login"));
    let session = cookie(&resp, "_session").expect("session cookie");

    // AND: Logging in returns to the contact page
    let req = test::TestRequest::post()
        .uri("/site/login")
        .cookie(session)
        .set_form([("username", "alice"), ("password", PASSWORD)])
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/site/contact"));
    assert!(cookie(&resp, "_session").is_some());
}

#[actix_web::test]
async fn test_bad_credentials_render_login_errors() {
    let app = test_app(Config::default(), vec![user("alice", UserStatus::Active)]);
    let service = init_app!(app);

    let req = test::TestRequest::post()
        .uri("/site/login")
        .set_form([("username", "alice"), ("password", "wrong")])
        .to_request();
    let resp = test::call_service(&service, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["view"], "login");
    assert_eq!(body["layout"], "no-sidebar");
    assert_eq!(body["errors"]["password"][0], "Incorrect username or password.");
}

#[actix_web::test]
async fn test_logout_requires_post_and_flashes() {
    // GIVEN: A logged-in session
    let app = test_app(Config::default(), vec![user("alice", UserStatus::Active)]);
    let service = init_app!(app);
    let req = test::TestRequest::post()
        .uri("/site/login")
        .set_form([("username", "alice"), ("password", PASSWORD)])
        .to_request();
    let resp = test::call_service(&service, req).await;
    let session = cookie(&resp, "_session").expect("session cookie");

    // WHEN: Logout is requested with GET
    let req = test::TestRequest::get()
        .uri("/site/logout")
        .cookie(session.clone())
        .to_request();
    let resp = test::call_service(&service, req).await;

    // THEN: 405 with the accepted verb advertised
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers().get("Allow").unwrap(), "POST");

    // WHEN: Logout is posted
    let req = test::TestRequest::post()
        .uri("/site/logout")
        .cookie(session)
        .to_request();
    let resp = test::call_service(&service, req).await;

    // THEN: Redirect home; the flash rides on a fresh session
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/"));
    let fresh = cookie(&resp, "_session").expect("fresh session cookie");

    let req = test::TestRequest::get()
        .uri("/site/login")
        .cookie(fresh)
        .to_request();
    let body: Value = test::call_and_read_body_json(&service, req).await;
    assert_eq!(body["flashes"][0]["kind"], "success");
    assert_eq!(body["flashes"][0]["message"], "You have been logged out!");
}

#[actix_web::test]
async fn test_guest_get_logout_goes_to_login() {
    let app = test_app(Config::default(), vec![]);
    let service = init_app!(app);

    let req = test::TestRequest::get().uri("/site/logout").to_request();
    let resp = test::call_service(&service, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/site/login"));
}

#[actix_web::test]
async fn test_reset_password_bad_token_is_bad_request() {
    let app = test_app(Config::default(), vec![user("alice", UserStatus::Active)]);
    let service = init_app!(app);

    let req = test::TestRequest::get()
        .uri("/site/reset-password?token=unknown_1700000000")
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Wrong password reset token.");

    let req = test::TestRequest::get().uri("/site/reset-password").to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Password reset token cannot be blank.");
}

#[actix_web::test]
async fn test_verify_email_link_activates_account() {
    let mut bob = user("bob", UserStatus::Inactive);
    bob.generate_email_verification_token();
    let token = bob.verification_token.clone().unwrap();
    let app = test_app(Config::default(), vec![bob]);
    let service = init_app!(app);

    let req = test::TestRequest::get()
        .uri(&format!("/site/verify-email?token={}", token))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/"));
    let session = cookie(&resp, "_session").expect("session cookie");

    // The confirmed account is logged in and may open members-only pages.
    let req = test::TestRequest::get().uri("/").cookie(session).to_request();
    let body: Value = test::call_and_read_body_json(&service, req).await;
    assert_eq!(body["view"], "index");
    assert_eq!(body["model"]["user"]["username"], "bob");
    assert_eq!(body["flashes"][0]["message"], "Your email has been confirmed!");
}

#[actix_web::test]
async fn test_signup_with_affiliate_link_sets_cookie() {
    let app = test_app(Config::default(), vec![user("alice", UserStatus::Active)]);
    let service = init_app!(app);

    let req = test::TestRequest::get()
        .uri("/site/signup?aff=alice")
        .to_request();
    let resp = test::call_service(&service, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let aff = cookie(&resp, "aff").expect("affiliate cookie");
    assert_eq!(aff.value(), "alice");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["sponsor"]["username"], "alice");
}

#[actix_web::test]
async fn test_signup_creates_account() {
    let app = test_app(Config::default(), vec![]);
    let service = init_app!(app);

    let req = test::TestRequest::post()
        .uri("/site/signup")
        .set_form([
            ("username", "carol"),
            ("email", "carol@example.com"),
            ("password", PASSWORD),
        ])
        .to_request();
    let resp = test::call_service(&service, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.users.len().await, 1);
    assert_eq!(app.mail_log.sent().await.len(), 1);
}

#[actix_web::test]
async fn test_health_and_unknown_routes() {
    let app = test_app(Config::default(), vec![]);
    let service = init_app!(app);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/no/such/page").to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Not Found (#404)");
}

#[actix_web::test]
async fn test_expired_guest_sessions_do_not_accumulate() {
    // GIVEN: Sessions that expire immediately
    let mut config = Config::default();
    config.session.ttl_secs = 0;
    let app = test_app(config, vec![]);
    let service = init_app!(app);

    // WHEN: Many cookieless guests hit a members-only page
    for _ in 0..200 {
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    // THEN: Only the latest session is still held
    assert!(app.sessions.len().await <= 1);
}

#[actix_web::test]
async fn test_site_root_and_error_page_are_routed() {
    let alice = user("alice", UserStatus::Active);
    let app = test_app(Config::default(), vec![alice]);
    let service = init_app!(app);

    // A guest reaches the error page without a login detour.
    let req = test::TestRequest::get().uri("/site/error").to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["view"], "error");

    let req = test::TestRequest::post()
        .uri("/site/login")
        .set_form([("username", "alice"), ("password", PASSWORD)])
        .to_request();
    let resp = test::call_service(&service, req).await;
    let session = cookie(&resp, "_session").expect("session cookie");

    // The bare controller path serves the home page.
    let req = test::TestRequest::get().uri("/site").cookie(session).to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["view"], "index");
}
