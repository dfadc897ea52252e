use std::fmt::Write as _;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::{eq_fold, split_team, MetadataKind, OrgTeam, RepoAssignee, RepoLabel, RepoMetadataResult};
use crate::client::{ApiClient, Transport};
use crate::error::{PullpoError, Result};
use crate::repo::RepoRef;

/// Where one alias's result sits in the response `data`, and which input
/// name it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    kind: MetadataKind,
    name: String,
    path: Vec<String>,
    organization: Option<String>,
}

/// A compiled lookup query plus its positional decode table.
#[derive(Debug, Clone)]
pub struct ResolveQuery {
    query: String,
    slots: Vec<Slot>,
    repo_owner: String,
}

impl ResolveQuery {
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Map the response `data` back onto the requested names. A null or
    /// missing entry fails the whole decode.
    pub fn decode(&self, data: &Value) -> Result<RepoMetadataResult> {
        let mut result = RepoMetadataResult {
            repo_owner: self.repo_owner.clone(),
            ..Default::default()
        };

        for slot in &self.slots {
            let node = slot
                .path
                .iter()
                .try_fold(data, |value, key| value.get(key))
                .filter(|node| !node.is_null())
                .ok_or_else(|| PullpoError::unresolved(slot.kind, &slot.name))?;

            match slot.kind {
                MetadataKind::User => result.assignable_users.push(node_as::<RepoAssignee>(node)?),
                MetadataKind::Label => result.labels.push(node_as::<RepoLabel>(node)?),
                _ => {
                    let mut team: OrgTeam = node_as(node)?;
                    team.organization = slot.organization.clone().unwrap_or_default();
                    result.teams.push(team);
                }
            }
        }

        Ok(result)
    }
}

fn node_as<N: DeserializeOwned>(node: &Value) -> Result<N> {
    Ok(serde::Deserialize::deserialize(node)?)
}

/// GraphQL string literal.
fn quote(s: &str) -> String {
    Value::from(s).to_string()
}

fn alias(prefix: char, index: usize) -> String {
    format!("{prefix}{index:03}")
}

/// Builds a single `RepositoryResolveMetadataIDs` query with one aliased
/// selection per name: `u000…` for users, `l000…` for labels under
/// `repository`, `t000…` for teams under `organization`. Aliases follow the
/// order names were added; repeats (ignoring case) are skipped.
#[derive(Debug, Clone)]
pub struct ResolveQueryBuilder {
    owner: String,
    name: String,
    users: Vec<String>,
    labels: Vec<String>,
    teams: Vec<(String, String)>,
}

impl ResolveQueryBuilder {
    pub fn new(repo: &RepoRef) -> Self {
        Self {
            owner: repo.owner().to_string(),
            name: repo.name().to_string(),
            users: Vec::new(),
            labels: Vec::new(),
            teams: Vec::new(),
        }
    }

    pub fn user(&mut self, login: &str) -> &mut Self {
        if !self.users.iter().any(|u| eq_fold(u, login)) {
            self.users.push(login.to_string());
        }
        self
    }

    pub fn label(&mut self, name: &str) -> &mut Self {
        if !self.labels.iter().any(|l| eq_fold(l, name)) {
            self.labels.push(name.to_string());
        }
        self
    }

    pub fn team(&mut self, organization: &str, slug: &str) -> &mut Self {
        if !self
            .teams
            .iter()
            .any(|(o, s)| eq_fold(o, organization) && eq_fold(s, slug))
        {
            self.teams.push((organization.to_string(), slug.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.labels.is_empty() && self.teams.is_empty()
    }

    pub fn build(&self) -> ResolveQuery {
        let mut query = String::from("query RepositoryResolveMetadataIDs {\n");
        let mut slots = Vec::new();

        for (i, login) in self.users.iter().enumerate() {
            let a = alias('u', i);
            let _ = writeln!(query, "{a}: user(login:{}){{id,login}}", quote(login));
            slots.push(Slot {
                kind: MetadataKind::User,
                name: login.clone(),
                path: vec![a],
                organization: None,
            });
        }

        if !self.labels.is_empty() {
            let _ = writeln!(
                query,
                "repository(owner:{},name:{}){{",
                quote(&self.owner),
                quote(&self.name)
            );
            for (i, label) in self.labels.iter().enumerate() {
                let a = alias('l', i);
                let _ = writeln!(query, "{a}: label(name:{}){{id,name}}", quote(label));
                slots.push(Slot {
                    kind: MetadataKind::Label,
                    name: label.clone(),
                    path: vec!["repository".to_string(), a],
                    organization: None,
                });
            }
            query.push_str("}\n");
        }

        // One block per organization, in order of first mention. A second
        // organization needs aliased blocks since the field name repeats.
        let mut organizations: Vec<&str> = Vec::new();
        for (org, _) in &self.teams {
            if !organizations.iter().any(|o| eq_fold(o, org)) {
                organizations.push(org);
            }
        }
        let aliased = organizations.len() > 1;

        for (oi, org) in organizations.iter().enumerate() {
            let block = if aliased {
                alias('o', oi)
            } else {
                "organization".to_string()
            };
            if aliased {
                let _ = writeln!(query, "{block}: organization(login:{}){{", quote(org));
            } else {
                let _ = writeln!(query, "organization(login:{}){{", quote(org));
            }

            for (ti, (team_org, slug)) in self.teams.iter().enumerate() {
                if !eq_fold(team_org, org) {
                    continue;
                }
                let a = alias('t', ti);
                let _ = writeln!(query, "{a}: team(slug:{}){{id,slug}}", quote(slug));
                slots.push(Slot {
                    kind: MetadataKind::Team,
                    name: format!("{team_org}/{slug}"),
                    path: vec![block.clone(), a],
                    organization: Some(org.to_string()),
                });
            }
            query.push_str("}\n");
        }

        query.push_str("}\n");

        ResolveQuery {
            query,
            slots,
            repo_owner: self.owner.clone(),
        }
    }
}

/// Names to look up with [`repo_resolve_metadata_ids`]. Reviewers containing
/// a `/` are teams; the rest are users.
#[derive(Debug, Clone, Default)]
pub struct RepoResolveInput {
    pub assignees: Vec<String>,
    pub reviewers: Vec<String>,
    pub labels: Vec<String>,
}

/// Resolve users, labels and teams with one query instead of enumerating
/// every candidate. Sends nothing when there is nothing to resolve.
pub async fn repo_resolve_metadata_ids<T: Transport>(
    client: &ApiClient<T>,
    repo: &RepoRef,
    input: &RepoResolveInput,
) -> Result<RepoMetadataResult> {
    let mut builder = ResolveQueryBuilder::new(repo);
    for login in &input.assignees {
        builder.user(login);
    }
    for reviewer in &input.reviewers {
        if reviewer.contains('/') {
            let (org, slug) = split_team(reviewer, repo.owner());
            builder.team(org, slug);
        } else {
            builder.user(reviewer);
        }
    }
    for label in &input.labels {
        builder.label(label);
    }

    let query = builder.build();
    if builder.is_empty() {
        return query.decode(&Value::Null);
    }

    debug!(repo = %repo, lookups = query.slots.len(), "resolving metadata IDs");
    let data: Value = client.graphql(repo.host(), query.query(), None).await?;
    query.decode(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubTransport;

    const EXPECTED_QUERY: &str = r#"query RepositoryResolveMetadataIDs {
u000: user(login:"monalisa"){id,login}
u001: user(login:"hubot"){id,login}
u002: user(login:"octocat"){id,login}
repository(owner:"OWNER",name:"REPO"){
l000: label(name:"bug"){id,name}
l001: label(name:"help wanted"){id,name}
}
organization(login:"OWNER"){
t000: team(slug:"core"){id,slug}
t001: team(slug:"robots"){id,slug}
}
}
"#;

    fn input() -> RepoResolveInput {
        let strings = |v: &[&str]| -> Vec<String> { v.iter().map(|s| s.to_string()).collect() };
        RepoResolveInput {
            assignees: strings(&["monalisa", "hubot"]),
            reviewers: strings(&["monalisa", "octocat", "OWNER/core", "/robots"]),
            labels: strings(&["bug", "help wanted"]),
        }
    }

    #[tokio::test]
    async fn test_repo_resolve_metadata_ids() {
        let stub = StubTransport::new();
        stub.graphql(
            r"query RepositoryResolveMetadataIDs\b",
            r#"{ "data": {
                "u000": { "login": "MonaLisa", "id": "MONAID" },
                "u001": { "login": "hubot", "id": "HUBOTID" },
                "u002": { "login": "octocat", "id": "OCTOID" },
                "repository": {
                    "l000": { "name": "bug", "id": "BUGID" },
                    "l001": { "name": "Help Wanted", "id": "HELPID" }
                },
                "organization": {
                    "t000": { "slug": "core", "id": "COREID" },
                    "t001": { "slug": "Robots", "id": "ROBOTID" }
                }
            } }"#,
        );
        let client = ApiClient::new(stub);

        let result = repo_resolve_metadata_ids(&client, &RepoRef::new("OWNER", "REPO"), &input())
            .await
            .unwrap();

        assert_eq!(client.transport().graphql_queries(), [EXPECTED_QUERY]);
        assert_eq!(
            result.members_to_ids(&["monalisa", "hubot", "octocat"]).unwrap(),
            ["MONAID", "HUBOTID", "OCTOID"]
        );
        assert_eq!(result.teams_to_ids(&["/core", "/robots"]).unwrap(), ["COREID", "ROBOTID"]);
        assert_eq!(result.labels_to_ids(&["bug", "help wanted"]).unwrap(), ["BUGID", "HELPID"]);
    }

    #[tokio::test]
    async fn test_members_order_independent_of_response_order() {
        let stub = StubTransport::new();
        stub.graphql(
            r"query RepositoryResolveMetadataIDs\b",
            r#"{ "data": {
                "u002": { "login": "octocat", "id": "OCTOID" },
                "u000": { "login": "monalisa", "id": "MONAID" },
                "u001": { "login": "hubot", "id": "HUBOTID" }
            } }"#,
        );
        let client = ApiClient::new(stub);

        let input = RepoResolveInput {
            assignees: vec!["monalisa".into(), "hubot".into(), "octocat".into()],
            ..Default::default()
        };
        let result = repo_resolve_metadata_ids(&client, &RepoRef::new("OWNER", "REPO"), &input)
            .await
            .unwrap();
        assert_eq!(
            result.members_to_ids(&["monalisa", "hubot", "octocat"]).unwrap(),
            ["MONAID", "HUBOTID", "OCTOID"]
        );
    }

    #[tokio::test]
    async fn test_empty_input_sends_nothing() {
        let client = ApiClient::new(StubTransport::new());
        let result = repo_resolve_metadata_ids(&client, &RepoRef::new("OWNER", "REPO"), &RepoResolveInput::default())
            .await
            .unwrap();
        assert!(result.assignable_users.is_empty());
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn test_missing_entry_names_input() {
        let mut builder = ResolveQueryBuilder::new(&RepoRef::new("OWNER", "REPO"));
        builder.user("monalisa").label("bug").label("wontfix");
        let query = builder.build();

        let data = serde_json::json!({
            "u000": { "login": "monalisa", "id": "MONAID" },
            "repository": { "l000": { "name": "bug", "id": "BUGID" }, "l001": null }
        });
        assert_eq!(
            query.decode(&data).unwrap_err().to_string(),
            "could not resolve label 'wontfix'"
        );
    }

    #[test]
    fn test_duplicates_skipped() {
        let mut builder = ResolveQueryBuilder::new(&RepoRef::new("OWNER", "REPO"));
        builder.user("monalisa").user("MonaLisa").label("bug").label("BUG");
        let query = builder.build();
        assert_eq!(query.query().matches("user(login:").count(), 1);
        assert_eq!(query.query().matches("label(name:").count(), 1);
    }

    #[test]
    fn test_teams_in_several_organizations() {
        let mut builder = ResolveQueryBuilder::new(&RepoRef::new("OWNER", "REPO"));
        builder.team("OWNER", "core").team("other", "docs").team("owner", "robots");
        let query = builder.build();
        assert_eq!(
            query.query(),
            r#"query RepositoryResolveMetadataIDs {
o000: organization(login:"OWNER"){
t000: team(slug:"core"){id,slug}
t002: team(slug:"robots"){id,slug}
}
o001: organization(login:"other"){
t001: team(slug:"docs"){id,slug}
}
}
"#
        );

        let data = serde_json::json!({
            "o000": {
                "t000": { "slug": "core", "id": "COREID" },
                "t002": { "slug": "robots", "id": "ROBOTID" }
            },
            "o001": { "t001": { "slug": "docs", "id": "DOCSID" } }
        });
        let result = query.decode(&data).unwrap();
        assert_eq!(
            result.teams_to_ids(&["other/docs", "/robots", "OWNER/core"]).unwrap(),
            ["DOCSID", "ROBOTID", "COREID"]
        );
    }

    #[test]
    fn test_names_are_escaped() {
        let mut builder = ResolveQueryBuilder::new(&RepoRef::new("OWNER", "REPO"));
        builder.label(r#"say "hi""#);
        assert!(builder
            .build()
            .query()
            .contains(r#"l000: label(name:"say \"hi\""){id,name}"#));
    }
}
