//! Test utilities shared across modules.
//!
//! [`StubTransport`] is a registry of canned responses. Each stub answers
//! exactly one request, stubs are tried in registration order, and every
//! request is recorded so tests can assert on what was sent.

use std::sync::Mutex;

use regex::Regex;
use reqwest::Method;
use url::Url;

use crate::client::{ApiRequest, ApiResponse, Transport};
use crate::error::{PullpoError, Result};

enum Matcher {
    GraphQL(Regex),
    Rest { method: Method, path: String },
}

impl Matcher {
    fn matches(&self, request: &ApiRequest) -> bool {
        match self {
            Matcher::GraphQL(re) => graphql_query(request).is_some_and(|q| re.is_match(&q)),
            Matcher::Rest { method, path } => {
                *method == request.method && request_path(&request.url).as_deref() == Some(path)
            }
        }
    }
}

struct Stub {
    matcher: Matcher,
    response: ApiResponse,
    used: bool,
}

#[derive(Default)]
pub struct StubTransport {
    stubs: Mutex<Vec<Stub>>,
    requests: Mutex<Vec<ApiRequest>>,
}

fn graphql_query(request: &ApiRequest) -> Option<String> {
    request
        .body
        .as_ref()
        .and_then(|b| b.get("query"))
        .and_then(|q| q.as_str())
        .map(str::to_string)
}

fn request_path(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path();
    let path = path.strip_prefix("/api/v3/").unwrap_or(path);
    Some(path.trim_start_matches('/').to_string())
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, matcher: Matcher, response: ApiResponse) {
        self.stubs.lock().unwrap().push(Stub {
            matcher,
            response,
            used: false,
        });
    }

    /// Answer the next GraphQL request whose query matches `pattern`.
    pub fn graphql(&self, pattern: &str, body: &str) {
        self.register(
            Matcher::GraphQL(Regex::new(pattern).unwrap()),
            ApiResponse {
                status: 200,
                link: None,
                body: body.as_bytes().to_vec(),
            },
        );
    }

    pub fn rest(&self, method: &str, path: &str, body: &str) {
        self.rest_status(method, path, 200, body);
    }

    pub fn rest_status(&self, method: &str, path: &str, status: u16, body: &str) {
        self.rest_response(
            method,
            path,
            ApiResponse {
                status,
                link: None,
                body: body.as_bytes().to_vec(),
            },
        );
    }

    pub fn rest_with_link(&self, method: &str, path: &str, body: &str, link: &str) {
        self.rest_response(
            method,
            path,
            ApiResponse {
                status: 200,
                link: Some(link.to_string()),
                body: body.as_bytes().to_vec(),
            },
        );
    }

    fn rest_response(&self, method: &str, path: &str, response: ApiResponse) {
        self.register(
            Matcher::Rest {
                method: Method::from_bytes(method.as_bytes()).unwrap(),
                path: path.to_string(),
            },
            response,
        );
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Query strings of every GraphQL request sent so far.
    pub fn graphql_queries(&self) -> Vec<String> {
        self.requests().iter().filter_map(graphql_query).collect()
    }

    /// Panics if any registered stub was never requested.
    pub fn verify(&self) {
        let stubs = self.stubs.lock().unwrap();
        let unused = stubs.iter().filter(|s| !s.used).count();
        assert_eq!(unused, 0, "{unused} registered stub(s) were not requested");
    }
}

impl Transport for StubTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let mut stubs = self.stubs.lock().unwrap();
        match stubs
            .iter_mut()
            .find(|s| !s.used && s.matcher.matches(&request))
        {
            Some(stub) => {
                stub.used = true;
                Ok(stub.response.clone())
            }
            None => Err(PullpoError::ApiError {
                status: 0,
                url: request.url,
                message: "no registered stub matched".to_string(),
            }),
        }
    }
}
