pub mod http_fetcher;
pub mod parallel;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// An outgoing platform API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request and return the response body of a 2xx reply.
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>>;
}

/// Fetch and decode a JSON response body.
pub async fn fetch_json<T: DeserializeOwned>(
    fetcher: &dyn Fetcher,
    request: &FetchRequest,
) -> Result<T> {
    let body = fetcher.fetch(request).await?;
    Ok(serde_json::from_slice(&body)?)
}
