use std::io::{self, Write};

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Method;
use serde_json::{Map, Value};

use pullpo::client::decode_graphql;
use pullpo::pagination::{add_per_page, stream_rest_array, GraphqlPager};
use pullpo::{ApiClient, HttpTransport, PullpoError};

use crate::cli::ApiArgs;
use crate::config::Config;

fn parse_fields(fields: &[String]) -> Result<Vec<(String, String)>> {
    fields
        .iter()
        .map(|f| {
            f.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("field '{f}' is not in KEY=VALUE format"))
        })
        .collect()
}

fn with_query(path: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}{query}")
}

fn json_body(params: Vec<(String, String)>) -> Option<Value> {
    if params.is_empty() {
        return None;
    }
    Some(Value::Object(
        params.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
    ))
}

/// Surface GraphQL `errors` after the body has been shown.
fn check_graphql(body: &[u8]) -> Result<()> {
    match decode_graphql::<serde::de::IgnoredAny>(body) {
        Err(e @ PullpoError::GraphQL(_)) => Err(e.into()),
        _ => Ok(()),
    }
}

async fn graphql(client: &ApiClient<HttpTransport>, host: &str, params: Vec<(String, String)>, paginate: bool) -> Result<()> {
    let mut query = None;
    let mut variables = Map::new();
    for (key, value) in params {
        if key == "query" {
            query = Some(value);
        } else {
            variables.insert(key, Value::String(value));
        }
    }
    let query = query.context("graphql requests need a query: -f query='...'")?;
    let mut stdout = io::stdout().lock();

    if paginate {
        let mut pager = GraphqlPager::new(client, host, &query, variables);
        while let Some(body) = pager.next_page().await? {
            stdout.write_all(&body)?;
            writeln!(stdout)?;
            check_graphql(&body)?;
        }
        return Ok(());
    }

    let variables = (!variables.is_empty()).then_some(Value::Object(variables));
    let body = client.graphql_bytes(host, &query, variables).await?;
    stdout.write_all(&body)?;
    writeln!(stdout)?;
    check_graphql(&body)
}

pub async fn run(config: &Config, args: ApiArgs) -> Result<()> {
    let host = config.resolve_host(args.hostname.as_deref());
    let client = ApiClient::new(config.transport(&host)?);
    let params = parse_fields(&args.fields)?;

    let endpoint = args.endpoint.trim_start_matches('/');
    if endpoint == "graphql" {
        return graphql(&client, &host, params, args.paginate).await;
    }

    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{}'", args.method))?;
    if args.paginate && method != Method::GET {
        bail!("--paginate is only supported for GET requests");
    }

    let (path, body) = if method == Method::GET {
        (with_query(endpoint, &params), None)
    } else {
        (endpoint.to_string(), json_body(params))
    };

    let mut stdout = io::stdout().lock();
    if args.paginate {
        let path = add_per_page(&path, config.per_page(), &[]);
        stream_rest_array(&client, &host, method, &path, body, &mut stdout).await?;
    } else {
        let response = client.rest(&host, method, &path, body).await?;
        stdout.write_all(&response.body)?;
    }
    writeln!(stdout)?;

    Ok(())
}
