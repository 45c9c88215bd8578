#![allow(dead_code)]

// Shared helpers for integration tests.
//
// These helpers intentionally use `tower_cookies::Cookie` parsing/encoding to match what the
// middleware emits in `Set-Cookie` and what browsers send back in `Cookie`.
use axum::{Router, body::Body, routing::get};
use http::{HeaderMap, Request, Response, StatusCode, header};
use http_body_util::BodyExt as _;
use sealed_auth_cookie::{
    AuthCookie, Cookie, CredentialRecord, SealedCookieConfig, SealedCookieLayer, format,
};
use tower::ServiceExt as _;

pub const SERVER_KEY: &str = "s3cr3t";

pub async fn body_string(body: Body) -> String {
    // Collect an Axum body into a UTF-8 string for assertions.
    let bytes = body
        .collect()
        .await
        .expect("body collects successfully")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn routes() -> Router {
    // `/login` writes a credential, `/whoami` reads it back ("none" when absent), `/logout`
    // clears it. Environment mismatches surface as 403 with the error message as body.
    Router::new()
        .route(
            "/login",
            get(|auth: AuthCookie| async move {
                auth.write("uid:42")
                    .map_err(|err| (StatusCode::FORBIDDEN, err.to_string()))
            }),
        )
        .route(
            "/whoami",
            get(|auth: AuthCookie| async move {
                auth.read::<String>()
                    .map(|payload| payload.unwrap_or_else(|| "none".to_string()))
                    .map_err(|err| (StatusCode::FORBIDDEN, err.to_string()))
            }),
        )
        .route(
            "/logout",
            get(|auth: AuthCookie| async move {
                auth.clear();
            }),
        )
}

pub fn app(config: SealedCookieConfig) -> Router {
    routes().layer(SealedCookieLayer::new(config))
}

pub fn config() -> SealedCookieConfig {
    SealedCookieConfig::builder(SERVER_KEY)
        .build()
        .expect("config builds")
}

pub fn get_cookie(res: &Response<Body>) -> Cookie<'static> {
    // Convenience: parse the credential cookie from a response.
    get_cookie_from_headers(res.headers())
}

pub fn get_cookie_from_headers(headers: &HeaderMap) -> Cookie<'static> {
    // Parse the `Set-Cookie` header into a `Cookie` structure.
    let set_cookie = headers
        .get(header::SET_COOKIE)
        .expect("response includes set-cookie header");
    let set_cookie = set_cookie
        .to_str()
        .expect("set-cookie header is valid utf-8");
    Cookie::parse_encoded(set_cookie)
        .expect("set-cookie parses successfully")
        .into_owned()
}

pub fn cookie_header_value(cookie: &Cookie<'_>) -> String {
    // Encode a cookie for use in a `Cookie` request header.
    cookie.encoded().to_string()
}

pub fn decode_record(value: &str) -> CredentialRecord {
    format::decode_record(value).expect("cookie record decodes successfully")
}

pub async fn login(app: &Router) -> Cookie<'static> {
    // Issue a credential cookie through `/login` and return it.
    let req = Request::builder()
        .uri("/login")
        .body(Body::empty())
        .expect("request builds successfully");
    let res = app
        .clone()
        .oneshot(req)
        .await
        .expect("service call succeeds");
    assert_eq!(res.status(), StatusCode::OK);
    get_cookie(&res)
}

pub async fn whoami(app: &Router, cookie: &Cookie<'_>) -> String {
    // Send `cookie` to `/whoami` and return the response body.
    let req = Request::builder()
        .uri("/whoami")
        .header(header::COOKIE, cookie_header_value(cookie))
        .body(Body::empty())
        .expect("request builds successfully");
    let res = app
        .clone()
        .oneshot(req)
        .await
        .expect("service call succeeds");
    body_string(res.into_body()).await
}
