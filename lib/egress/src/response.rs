//! Size-capped response bodies.

use crate::error::EgressError;
use bytes::{Bytes, BytesMut};
use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use rootcause::Report;
use serde::de::DeserializeOwned;

/// A response whose body reads stop once more than the configured maximum
/// has been consumed, whatever `Content-Length` claimed.
#[derive(Debug)]
pub struct EgressResponse {
    inner: Response,
    limit: Option<u64>,
    consumed: u64,
}

impl EgressResponse {
    pub(crate) fn new(inner: Response, limit: Option<u64>) -> Self {
        Self {
            inner,
            limit,
            consumed: 0,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// The final URL, after redirects.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        self.inner.url()
    }

    /// The declared body length, if the server sent one.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.inner.content_length()
    }

    /// Reads the next body chunk, counting it against the limit.
    ///
    /// # Errors
    ///
    /// Returns `ResponseTooLarge` once the running total passes the maximum.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, Report<EgressError>> {
        let chunk = self
            .inner
            .chunk()
            .await
            .map_err(|e| EgressError::from_reqwest(&e))?;
        if let Some(chunk) = &chunk {
            self.consumed += chunk.len() as u64;
            if let Some(limit) = self.limit {
                if self.consumed > limit {
                    return Err(EgressError::ResponseTooLarge {
                        limit,
                        declared: None,
                    }
                    .into());
                }
            }
        }
        Ok(chunk)
    }

    /// Reads the whole body.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or when the body exceeds the maximum.
    pub async fn bytes(mut self) -> Result<Bytes, Report<EgressError>> {
        let mut body = BytesMut::new();
        while let Some(chunk) = self.chunk().await? {
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }

    /// Reads the body as UTF-8, replacing invalid sequences.
    ///
    /// # Errors
    ///
    /// See [`EgressResponse::bytes`].
    pub async fn text(self) -> Result<String, Report<EgressError>> {
        let body = self.bytes().await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Reads and deserializes a JSON body.
    ///
    /// # Errors
    ///
    /// See [`EgressResponse::bytes`]; also fails with `Decode` on invalid JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, Report<EgressError>> {
        let body = self.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            EgressError::Decode {
                reason: e.to_string(),
            }
            .into()
        })
    }
}
