use anyhow::{bail, Result};
use serde_json::{json, Map, Value};
use tabled::builder::Builder;
use tabled::settings::Style;

use pullpo::features::{Detector, HostCapabilities};
use pullpo::pagination::{collect_graphql, Limit};
use pullpo::query_builder::{self, Capabilities, ObjectKind};
use pullpo::responses::RepositoryData;
use pullpo::{ApiClient, RepoRef};

use crate::cli::ListArgs;
use crate::config::Config;
use crate::output::{self, truncate};

fn connection(kind: ObjectKind) -> (&'static str, &'static str) {
    match kind {
        ObjectKind::PullRequest => ("PullRequestList", "pullRequests"),
        _ => ("IssueList", "issues"),
    }
}

fn list_query(kind: ObjectKind, selection: &str) -> String {
    let (operation, field) = connection(kind);
    format!(
        r#"
query {operation}($owner: String!, $repo: String!, $limit: Int!, $endCursor: String) {{
    repository(owner: $owner, name: $repo) {{
        {field}(first: $limit, after: $endCursor, states: [OPEN], orderBy: {{field: CREATED_AT, direction: DESC}}) {{
            nodes {{ {selection} }}
            pageInfo {{ hasNextPage endCursor }}
        }}
    }}
}}
"#
    )
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => truncate(s, 60),
        Some(other) => truncate(&other.to_string(), 60),
    }
}

pub async fn run(config: &Config, kind: ObjectKind, args: ListArgs) -> Result<()> {
    let repo = RepoRef::from_full_name_with_host(&args.repo, &config.resolve_host(None))?;
    let client = ApiClient::new(config.transport(repo.host())?);

    let cache = HostCapabilities::new();
    let detector = Detector::new(&client, repo.host(), &cache);
    let capabilities = Capabilities::detect(&detector).await;

    let columns: Vec<&str> = args
        .fields
        .iter()
        .map(String::as_str)
        .filter(|f| !query_builder::compile(kind, &[f], &capabilities).is_empty())
        .collect();
    let selection = query_builder::compile(kind, &columns, &capabilities);
    if selection.is_empty() {
        bail!(
            "no usable fields in {:?}; available: {}",
            args.fields,
            query_builder::known_fields(kind).join(", ")
        );
    }

    let limit = Limit::from(args.limit);
    let page_size = match args.limit {
        n if n > 0 => u32::try_from(n).unwrap_or(u32::MAX).min(config.per_page()),
        _ => config.per_page(),
    };
    let mut variables = Map::new();
    variables.insert("owner".to_string(), json!(repo.owner()));
    variables.insert("repo".to_string(), json!(repo.name()));
    variables.insert("limit".to_string(), json!(page_size));

    let (_, field) = connection(kind);
    let query = list_query(kind, &selection);
    let nodes = collect_graphql(&client, repo.host(), &query, variables, limit, |data: RepositoryData<Value>| {
        match data
            .repository
            .and_then(|mut r| r.get_mut(field).and_then(|c| c.get_mut("nodes")).map(Value::take))
        {
            Some(Value::Array(nodes)) => nodes,
            _ => Vec::new(),
        }
    })
    .await?;

    if output::is_json_output() {
        output::print_json(&nodes);
        return Ok(());
    }
    if nodes.is_empty() {
        output::print_message(&format!("No open items in {repo}"));
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_string()));
    for node in &nodes {
        builder.push_record(columns.iter().map(|c| cell(node.get(*c))));
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}
