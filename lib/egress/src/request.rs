//! Request building for egress calls.

use crate::context::EgressContext;
use crate::error::EgressError;
use crate::response::EgressResponse;
use reqwest::RequestBuilder;
use reqwest::header::HeaderMap;
use rootcause::Report;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// A request under construction.
///
/// Wraps a reqwest builder so the only way to send it is through the
/// context that enforces the egress policy.
#[must_use = "a request does nothing until sent"]
pub struct EgressRequest {
    context: EgressContext,
    builder: RequestBuilder,
}

impl EgressRequest {
    pub(crate) fn new(context: EgressContext, builder: RequestBuilder) -> Self {
        Self { context, builder }
    }

    fn map(self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        Self {
            context: self.context,
            builder: f(self.builder),
        }
    }

    /// Adds a header. An invalid name or value fails the request when sent.
    pub fn header(self, name: &str, value: &str) -> Self {
        self.map(|builder| builder.header(name, value))
    }

    pub fn headers(self, headers: HeaderMap) -> Self {
        self.map(|builder| builder.headers(headers))
    }

    pub fn bearer_auth(self, token: impl fmt::Display) -> Self {
        self.map(|builder| builder.bearer_auth(token))
    }

    pub fn basic_auth(
        self,
        username: impl fmt::Display,
        password: Option<impl fmt::Display>,
    ) -> Self {
        self.map(|builder| builder.basic_auth(username, password))
    }

    pub fn query<T: Serialize + ?Sized>(self, query: &T) -> Self {
        self.map(|builder| builder.query(query))
    }

    /// Sets a JSON body and the matching content type.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Self {
        self.map(|builder| builder.json(body))
    }

    pub fn body(self, body: impl Into<reqwest::Body>) -> Self {
        self.map(|builder| builder.body(body))
    }

    /// Overrides the context's overall deadline for this request.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.map(|builder| builder.timeout(timeout))
    }

    /// Builds the request and executes it through the egress context.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if the request could not be built, otherwise see
    /// [`EgressContext::execute`].
    pub async fn send(self) -> Result<EgressResponse, Report<EgressError>> {
        let request = self.builder.build().map_err(|e| EgressError::InvalidUrl {
            url: e.url().map(ToString::to_string).unwrap_or_default(),
            reason: e.to_string(),
        })?;
        self.context.execute(request).await
    }
}

impl fmt::Debug for EgressRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EgressRequest")
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}
