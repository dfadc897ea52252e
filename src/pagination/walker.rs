use std::io::{self, Write};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::array_reader::PaginatedArrayReader;
use super::cursor::scan_page_info;
use super::link::{add_per_page, find_next_page};
use crate::client::{decode_graphql, ApiClient, Transport};
use crate::error::Result;

/// Upper bound on the number of items a walk collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limit(Option<usize>);

impl Limit {
    pub const ALL: Limit = Limit(None);

    pub fn at_most(n: usize) -> Self {
        Limit(Some(n))
    }

    fn reached(&self, collected: usize) -> bool {
        self.0.is_some_and(|max| collected >= max)
    }

    fn trim<T>(&self, items: &mut Vec<T>) {
        if let Some(max) = self.0 {
            items.truncate(max);
        }
    }
}

/// Zero or negative means no limit.
impl From<i64> for Limit {
    fn from(n: i64) -> Self {
        match usize::try_from(n) {
            Ok(0) | Err(_) => Limit::ALL,
            Ok(n) => Limit::at_most(n),
        }
    }
}

/// Walks a GraphQL connection by feeding each page's `endCursor` back in as
/// the `$endCursor` variable.
pub struct GraphqlPager<'a, T: Transport> {
    client: &'a ApiClient<T>,
    host: &'a str,
    query: &'a str,
    variables: Map<String, Value>,
    pages: usize,
    done: bool,
}

impl<'a, T: Transport> GraphqlPager<'a, T> {
    pub fn new(client: &'a ApiClient<T>, host: &'a str, query: &'a str, variables: Map<String, Value>) -> Self {
        Self {
            client,
            host,
            query,
            variables,
            pages: 0,
            done: false,
        }
    }

    /// Raw body of the next page, or `None` once the server reports no more.
    pub async fn next_page(&mut self) -> Result<Option<Vec<u8>>> {
        if self.done {
            return Ok(None);
        }

        let body = self
            .client
            .graphql_bytes(self.host, self.query, Some(Value::Object(self.variables.clone())))
            .await?;
        self.pages += 1;

        let state = scan_page_info(&body);
        match state.next_cursor() {
            Some(cursor) => {
                debug!(page = self.pages, cursor, "graphql page has more results");
                self.variables
                    .insert("endCursor".to_string(), Value::String(cursor.to_string()));
            }
            None => {
                debug!(page = self.pages, "graphql pagination finished");
                self.done = true;
            }
        }

        Ok(Some(body))
    }
}

/// One REST page plus its position in the walk.
#[derive(Debug, Clone)]
pub struct RestPage {
    pub body: Vec<u8>,
    pub is_first: bool,
    pub is_last: bool,
}

/// Walks a REST list endpoint by following `Link: <...>; rel="next"`.
/// The request body, if any, is only sent with the first request.
pub struct RestPager<'a, T: Transport> {
    client: &'a ApiClient<T>,
    host: &'a str,
    method: Method,
    body: Option<Value>,
    next: Option<String>,
    pages: usize,
}

impl<'a, T: Transport> RestPager<'a, T> {
    pub fn new(client: &'a ApiClient<T>, host: &'a str, method: Method, path: &str, body: Option<Value>) -> Self {
        Self {
            client,
            host,
            method,
            body,
            next: Some(path.to_string()),
            pages: 0,
        }
    }

    pub async fn next_page(&mut self) -> Result<Option<RestPage>> {
        let Some(path) = self.next.take() else {
            return Ok(None);
        };

        let response = self
            .client
            .rest(self.host, self.method.clone(), &path, self.body.take())
            .await?;
        self.pages += 1;

        self.next = find_next_page(response.link.as_deref());
        debug!(page = self.pages, next = ?self.next, "rest page fetched");

        Ok(Some(RestPage {
            body: response.body,
            is_first: self.pages == 1,
            is_last: self.next.is_none(),
        }))
    }
}

/// Collect every node of a GraphQL connection. `extract` pulls a page's
/// nodes out of its decoded `data`. The first failing page aborts the walk
/// and the nodes gathered so far are dropped.
pub async fn collect_graphql<T, R, N, F>(
    client: &ApiClient<T>,
    host: &str,
    query: &str,
    variables: Map<String, Value>,
    limit: Limit,
    mut extract: F,
) -> Result<Vec<N>>
where
    T: Transport,
    R: DeserializeOwned,
    F: FnMut(R) -> Vec<N>,
{
    let mut pager = GraphqlPager::new(client, host, query, variables);
    let mut nodes = Vec::new();

    while let Some(body) = pager.next_page().await? {
        let page: R = decode_graphql(&body)?;
        nodes.extend(extract(page));
        if limit.reached(nodes.len()) {
            limit.trim(&mut nodes);
            break;
        }
    }

    Ok(nodes)
}

/// Collect the elements of a paginated REST array endpoint.
pub async fn collect_rest<T, N>(
    client: &ApiClient<T>,
    host: &str,
    path: &str,
    per_page: u32,
    limit: Limit,
) -> Result<Vec<N>>
where
    T: Transport,
    N: DeserializeOwned,
{
    let path = add_per_page(path, per_page, &[]);
    let mut pager = RestPager::new(client, host, Method::GET, &path, None);
    let mut items = Vec::new();

    while let Some(page) = pager.next_page().await? {
        let page_items: Vec<N> = serde_json::from_slice(&page.body)?;
        items.extend(page_items);
        if limit.reached(items.len()) {
            limit.trim(&mut items);
            break;
        }
    }

    Ok(items)
}

/// Copy every page of a REST array endpoint into `out` as a single JSON
/// array. Only one page is held in memory at a time. Returns the page count.
pub async fn stream_rest_array<T, W>(
    client: &ApiClient<T>,
    host: &str,
    method: Method,
    path: &str,
    body: Option<Value>,
    out: &mut W,
) -> Result<usize>
where
    T: Transport,
    W: Write,
{
    let mut pager = RestPager::new(client, host, method, path, body);
    let mut pages = 0;

    while let Some(page) = pager.next_page().await? {
        let mut reader = PaginatedArrayReader::new(page.body.as_slice(), page.is_first, page.is_last);
        io::copy(&mut reader, out)?;
        pages += 1;
    }

    Ok(pages)
}
