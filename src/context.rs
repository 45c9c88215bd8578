use http::Request;

/// Transport facts about the current request.
///
/// The store never looks at ambient process state; everything it needs to know about the
/// connection is carried here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    secure: bool,
    ssl_session_id: Option<String>,
}

impl RequestContext {
    /// A plain HTTP request.
    pub fn insecure() -> Self {
        Self::default()
    }

    /// A request made over TLS.
    pub fn secure() -> Self {
        Self {
            secure: true,
            ssl_session_id: None,
        }
    }

    #[must_use]
    pub fn with_ssl_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        let session_id = session_id.into();
        self.ssl_session_id = (!session_id.is_empty()).then_some(session_id);
        self
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn ssl_session_id(&self) -> Option<&str> {
        self.ssl_session_id.as_deref()
    }

    /// Reads the context from a [`TlsSession`] extension, falling back to the URI scheme.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self::from_parts(req.extensions(), req.uri())
    }

    pub(crate) fn from_parts(extensions: &http::Extensions, uri: &http::Uri) -> Self {
        match extensions.get::<TlsSession>() {
            Some(tls) => Self {
                secure: true,
                ssl_session_id: tls.session_id.clone(),
            },
            None => Self {
                secure: uri.scheme_str() == Some("https"),
                ssl_session_id: None,
            },
        }
    }
}

/// Request extension inserted by whatever terminates TLS in front of the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSession {
    session_id: Option<String>,
}

impl TlsSession {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        let session_id = session_id.into();
        self.session_id = (!session_id.is_empty()).then_some(session_id);
        self
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}
