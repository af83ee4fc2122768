//! Transport seam. Sources and the graph client only see [`Fetch`]; the HTTP implementation is
//! [`HttpFetcher`].

use crate::StreamError;
use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    Get(String),
    PostJson {
        url: String,
        body: serde_json::Value,
    },
}

impl FetchRequest {
    pub fn url(&self) -> &str {
        match self {
            FetchRequest::Get(url) => url,
            FetchRequest::PostJson { url, .. } => url,
        }
    }
}

pub trait Fetch: Send + Sync + 'static {
    /// Resolves to the response body. A cancelled token resolves to [`StreamError::Cancelled`].
    fn fetch(
        &self,
        request: FetchRequest,
        token: CancellationToken,
    ) -> BoxFuture<'static, Result<Bytes, StreamError>>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(
        &self,
        request: FetchRequest,
        token: CancellationToken,
    ) -> BoxFuture<'static, Result<Bytes, StreamError>> {
        let client = self.client.clone();
        async move {
            let builder = match &request {
                FetchRequest::Get(url) => client.get(url),
                FetchRequest::PostJson { url, body } => client.post(url).json(body),
            };
            let send = async {
                let response = builder.send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(StreamError::Status {
                        url: request.url().to_string(),
                        status: status.as_u16(),
                    });
                }
                Ok(response.bytes().await?)
            };
            tokio::select! {
                _ = token.cancelled() => Err(StreamError::Cancelled),
                result = send => result,
            }
        }
        .boxed()
    }
}
