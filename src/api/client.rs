use futures::{Stream, TryStreamExt};
use reqwest::Client;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, HttpError>;

/// Thin wrapper around a shared `reqwest::Client`. One unauthenticated GET,
/// platform defaults for redirects and timeouts.
#[derive(Clone, Default)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the GET and hands back the advertised content length together
    /// with the body as a chunk stream.
    pub async fn fetch_stream(
        &self,
        url: Url,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(HttpError::Request);

        Ok((total_size, stream))
    }
}
