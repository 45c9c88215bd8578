// Tests for the transport preconditions: `is_secure` and `is_linked_with_ssl`.
mod common;

use axum::{Router, body::Body};
use http::{Request, StatusCode, header};
use sealed_auth_cookie::{EnvironmentMismatch, SealedCookieConfig, TlsSession};
use tower::ServiceExt as _;
use tower_cookies::Cookie;

fn secure_app() -> Router {
    common::app(
        SealedCookieConfig::builder(common::SERVER_KEY)
            .with_secure(true)
            .build()
            .expect("config builds"),
    )
}

fn ssl_linked_app() -> Router {
    common::app(
        SealedCookieConfig::builder(common::SERVER_KEY)
            .with_linked_with_ssl(true)
            .build()
            .expect("config builds"),
    )
}

fn tls_request(uri: &str, session_id: &str, cookie: Option<&Cookie<'_>>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, common::cookie_header_value(cookie));
    }
    let mut req = builder
        .body(Body::empty())
        .expect("request builds successfully");
    req.extensions_mut()
        .insert(TlsSession::new().with_session_id(session_id));
    req
}

#[tokio::test]
async fn secure_store_refuses_to_write_over_http() {
    let req = Request::builder()
        .uri("http://example.com/login")
        .body(Body::empty())
        .expect("request builds successfully");
    let res = secure_app()
        .oneshot(req)
        .await
        .expect("service call succeeds");

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(
        common::body_string(res.into_body()).await,
        EnvironmentMismatch::InsecureTransport.to_string()
    );
}

#[tokio::test]
async fn secure_store_refuses_to_read_over_http() {
    let cookie = Cookie::new(sealed_auth_cookie::DEFAULT_COOKIE_NAME, "anything");
    let req = Request::builder()
        .uri("http://example.com/whoami")
        .header(header::COOKIE, common::cookie_header_value(&cookie))
        .body(Body::empty())
        .expect("request builds successfully");
    let res = secure_app()
        .oneshot(req)
        .await
        .expect("service call succeeds");

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn secure_store_round_trips_over_tls() {
    let app = secure_app();

    let res = app
        .clone()
        .oneshot(tls_request("/login", "tls-1", None))
        .await
        .expect("service call succeeds");
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = common::get_cookie(&res);

    let res = app
        .oneshot(tls_request("/whoami", "tls-1", Some(&cookie)))
        .await
        .expect("service call succeeds");
    assert_eq!(common::body_string(res.into_body()).await, "uid:42");
}

#[tokio::test]
async fn ssl_linked_store_requires_session_id() {
    let req = Request::builder()
        .uri("https://example.com/login")
        .body(Body::empty())
        .expect("request builds successfully");
    let res = ssl_linked_app()
        .oneshot(req)
        .await
        .expect("service call succeeds");

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(
        common::body_string(res.into_body()).await,
        EnvironmentMismatch::MissingSslSessionId.to_string()
    );
}

#[tokio::test]
async fn ssl_linked_cookie_does_not_survive_a_new_session() {
    let app = ssl_linked_app();

    let res = app
        .clone()
        .oneshot(tls_request("/login", "tls-1", None))
        .await
        .expect("service call succeeds");
    let cookie = common::get_cookie(&res);

    let res = app
        .clone()
        .oneshot(tls_request("/whoami", "tls-1", Some(&cookie)))
        .await
        .expect("service call succeeds");
    assert_eq!(common::body_string(res.into_body()).await, "uid:42");

    let res = app
        .oneshot(tls_request("/whoami", "tls-2", Some(&cookie)))
        .await
        .expect("service call succeeds");
    assert_eq!(common::body_string(res.into_body()).await, "none");
}
