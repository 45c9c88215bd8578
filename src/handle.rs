use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tower_cookies::Cookies;

use crate::{context::RequestContext, error::Result, store::SealedCookieStore};

/// Per-request access to the credential cookie, inserted by [`SealedCookieLayer`].
///
/// [`SealedCookieLayer`]: crate::SealedCookieLayer
#[derive(Debug, Clone)]
pub struct AuthCookie {
    store: Arc<SealedCookieStore>,
    cookies: Cookies,
    context: RequestContext,
}

impl AuthCookie {
    pub(crate) fn new(
        store: Arc<SealedCookieStore>,
        cookies: Cookies,
        context: RequestContext,
    ) -> Self {
        Self {
            store,
            cookies,
            context,
        }
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn read<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.store.read(&self.cookies, &self.context)
    }

    pub fn read_value(&self) -> Result<Option<Value>> {
        self.store.read_value(&self.cookies, &self.context)
    }

    pub fn write<T: Serialize + ?Sized>(&self, payload: &T) -> Result<()> {
        self.store.write(&self.cookies, &self.context, payload)
    }

    pub fn clear(&self) {
        self.store.clear(&self.cookies);
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty(&self.cookies)
    }
}

#[cfg(feature = "axum")]
impl<S> axum_core::extract::FromRequestParts<S> for AuthCookie
where
    S: Send + Sync,
{
    type Rejection = (http::StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthCookie>().cloned().ok_or((
            http::StatusCode::INTERNAL_SERVER_ERROR,
            "Can't extract AuthCookie. Is `SealedCookieLayer` enabled?",
        ))
    }
}
