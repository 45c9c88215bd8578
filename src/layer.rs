use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use http::{Request, Response};
use tower_cookies::CookieManager;
use tower_layer::Layer;
use tower_service::Service;

use crate::{
    config::SealedCookieConfig, context::RequestContext, handle::AuthCookie,
    store::SealedCookieStore,
};

#[derive(Debug, Clone)]
pub struct SealedCookieLayer {
    store: Arc<SealedCookieStore>,
}

impl SealedCookieLayer {
    #[must_use]
    pub fn new(config: SealedCookieConfig) -> Self {
        Self::from_store(SealedCookieStore::new(config))
    }

    #[must_use]
    pub fn from_store(store: SealedCookieStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &SealedCookieStore {
        &self.store
    }
}

#[derive(Debug, Clone)]
pub struct SealedCookieManager<S> {
    inner: S,
    store: Arc<SealedCookieStore>,
}

impl<S> Layer<S> for SealedCookieLayer {
    type Service = CookieManager<SealedCookieManager<S>>;

    fn layer(&self, inner: S) -> Self::Service {
        CookieManager::new(SealedCookieManager {
            inner,
            store: self.store.clone(),
        })
    }
}

impl<ReqBody, ResBody, S> Service<Request<ReqBody>> for SealedCookieManager<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let store = self.store.clone();

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let cookies = match req.extensions().get::<tower_cookies::Cookies>().cloned() {
                Some(cookies) => cookies,
                None => {
                    tracing::error!("cookie jar missing from request extensions");
                    let mut res = Response::default();
                    *res.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                    return Ok(res);
                }
            };

            let context = RequestContext::from_request(&req);
            req.extensions_mut()
                .insert(AuthCookie::new(store, cookies, context));

            inner.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use axum::body::Body;
    use http::header;
    use tower::{ServiceBuilder, ServiceExt as _};

    use super::*;
    use crate::{DEFAULT_COOKIE_NAME, TlsSession};

    fn layer() -> SealedCookieLayer {
        SealedCookieLayer::new(
            SealedCookieConfig::builder("s3cr3t")
                .build()
                .expect("config builds"),
        )
    }

    async fn login(req: Request<Body>) -> Result<Response<Body>, Infallible> {
        let auth = req
            .extensions()
            .get::<AuthCookie>()
            .cloned()
            .expect("request includes AuthCookie extension");

        auth.write("uid:42").expect("write succeeds");

        Ok(Response::new(Body::empty()))
    }

    async fn noop(_: Request<Body>) -> Result<Response<Body>, Infallible> {
        Ok(Response::new(Body::empty()))
    }

    #[tokio::test]
    async fn write_emits_set_cookie() {
        let svc = ServiceBuilder::new().layer(layer()).service_fn(login);

        let req = Request::builder()
            .body(Body::empty())
            .expect("request builds successfully");
        let res = svc.oneshot(req).await.expect("service call succeeds");

        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .expect("response includes set-cookie header")
            .to_str()
            .expect("set-cookie header is valid utf-8");
        assert!(set_cookie.starts_with(&format!("{DEFAULT_COOKIE_NAME}=")));
    }

    #[tokio::test]
    async fn no_set_cookie_when_unused() {
        let svc = ServiceBuilder::new().layer(layer()).service_fn(noop);

        let req = Request::builder()
            .body(Body::empty())
            .expect("request builds successfully");
        let res = svc.oneshot(req).await.expect("service call succeeds");

        assert!(res.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn context_comes_from_tls_extension() {
        async fn handler(req: Request<Body>) -> Result<Response<Body>, Infallible> {
            let auth = req
                .extensions()
                .get::<AuthCookie>()
                .cloned()
                .expect("request includes AuthCookie extension");
            assert!(auth.context().is_secure());
            assert_eq!(auth.context().ssl_session_id(), Some("tls-1"));
            Ok(Response::new(Body::empty()))
        }

        let svc = ServiceBuilder::new().layer(layer()).service_fn(handler);

        let mut req = Request::builder()
            .body(Body::empty())
            .expect("request builds successfully");
        req.extensions_mut()
            .insert(TlsSession::new().with_session_id("tls-1"));
        svc.oneshot(req).await.expect("service call succeeds");
    }
}
