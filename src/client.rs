use std::collections::HashMap;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, LINK};
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphQLErrorItem, GraphQLErrorResponse, PullpoError, Result};
use crate::instance;

/// A single HTTP exchange as seen by the core: the transport owns
/// timeouts, retries and cancellation.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub host: String,
    pub method: Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    /// Raw `Link` header, when present.
    pub link: Option<String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// `reqwest`-backed transport with per-host tokens.
pub struct HttpTransport {
    http: Client,
    tokens: HashMap<String, String>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            tokens: HashMap::new(),
        }
    }

    pub fn with_token(mut self, host: &str, token: impl Into<String>) -> Self {
        self.tokens
            .insert(instance::normalize_hostname(host), token.into());
        self
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self
            .http
            .request(request.method, &request.url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("User-Agent", concat!("pullpo/", env!("CARGO_PKG_VERSION")));

        if let Some(token) = self.tokens.get(&instance::normalize_hostname(&request.host)) {
            builder = builder.header(AUTHORIZATION, format!("token {token}"));
        }
        if let Some(body) = &request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let link = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(ApiResponse { status, link, body })
    }
}

#[derive(Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorItem>>,
}

#[derive(Deserialize)]
struct RestErrorBody {
    message: String,
}

pub struct ApiClient<T: Transport = HttpTransport> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run a GraphQL query and decode its `data` member.
    pub async fn graphql<D: DeserializeOwned>(
        &self,
        host: &str,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<D> {
        let body = self.graphql_bytes(host, query, variables).await?;
        decode_graphql(&body)
    }

    /// Run a GraphQL query and return the undecoded response body.
    pub async fn graphql_bytes(
        &self,
        host: &str,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<Vec<u8>> {
        let request = GraphQLRequest { query, variables };
        let response = self
            .transport
            .send(ApiRequest {
                host: host.to_string(),
                method: Method::POST,
                url: instance::graphql_url(host),
                body: Some(serde_json::to_value(&request)?),
            })
            .await?;

        check_status(&instance::graphql_url(host), &response)?;
        Ok(response.body)
    }

    /// Issue a REST call. `path` is relative to the host's API root, or a full URL.
    pub async fn rest(
        &self,
        host: &str,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse> {
        let url = instance::rest_url(host, path);
        let response = self
            .transport
            .send(ApiRequest {
                host: host.to_string(),
                method,
                url: url.clone(),
                body,
            })
            .await?;

        check_status(&url, &response)?;
        Ok(response)
    }
}

fn check_status(url: &str, response: &ApiResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }

    let message = serde_json::from_slice::<RestErrorBody>(&response.body)
        .map(|b| b.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).trim().to_string());

    Err(PullpoError::ApiError {
        status: response.status,
        url: url.to_string(),
        message,
    })
}

/// Decode a GraphQL response envelope, surfacing `errors` before `data`.
pub fn decode_graphql<D: DeserializeOwned>(body: &[u8]) -> Result<D> {
    let gql_response: GraphQLResponse<D> = serde_json::from_slice(body)?;

    if let Some(errors) = gql_response.errors.filter(|e| !e.is_empty()) {
        return Err(PullpoError::GraphQL(GraphQLErrorResponse { errors }));
    }

    gql_response.data.ok_or(PullpoError::EmptyResponse)
}
