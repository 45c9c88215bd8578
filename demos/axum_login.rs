use std::net::SocketAddr;

use axum::{Router, http::StatusCode, routing::get};
use sealed_auth_cookie::{
    AuthCookie, BlockCipherAdapter, BlockCipherAlgorithm, SealedCookieConfig, SealedCookieLayer,
};
use time::Duration;

async fn login(auth: AuthCookie) -> Result<&'static str, (StatusCode, String)> {
    auth.write("uid:42")
        .map_err(|err| (StatusCode::FORBIDDEN, err.to_string()))?;
    Ok("logged in")
}

async fn whoami(auth: AuthCookie) -> Result<String, (StatusCode, String)> {
    let user = auth
        .read::<String>()
        .map_err(|err| (StatusCode::FORBIDDEN, err.to_string()))?;
    Ok(user.unwrap_or_else(|| "anonymous".to_string()))
}

async fn logout(auth: AuthCookie) -> &'static str {
    auth.clear();
    "logged out"
}

#[tokio::main]
async fn main() {
    let config = SealedCookieConfig::builder("replace with a long random server secret")
        // Default: "auth"
        .with_name("auth")
        // Default: no expiration
        .with_lifetime(Duration::hours(8))
        // Default: false (set to true behind HTTPS)
        .with_secure(false)
        // Default: true
        .with_http_only(true)
        // Default: "sha256"
        .with_hash_algorithm("sha256")
        // Default: no encryption
        .with_encrypt_adapter(BlockCipherAdapter::new(BlockCipherAlgorithm::Aes256Cbc))
        .build()
        .expect("cookie configuration is valid");

    let app = Router::new()
        .route("/login", get(login))
        .route("/whoami", get(whoami))
        .route("/logout", get(logout))
        .layer(SealedCookieLayer::new(config));

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("tcp listener binds successfully");
    let local_addr = listener.local_addr().expect("local address is available");
    println!("listening at http://{local_addr}");

    axum::serve(listener, app)
        .await
        .expect("server runs successfully");
}
