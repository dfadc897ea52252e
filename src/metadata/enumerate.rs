use std::str::FromStr;

use const_format::concatcp;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{
    projects_to_paths, OrgTeam, ProjectV2, RepoAssignee, RepoLabel, RepoMetadataResult, RepoMilestone,
    RepoProject,
};
use crate::client::{ApiClient, Transport};
use crate::error::{PullpoError, Result};
use crate::pagination::{collect_graphql, Limit};
use crate::repo::RepoRef;
use crate::responses::{Connection, Login, OrganizationData, RepositoryData, ViewerData};

const PAGE_INFO: &str = "pageInfo { hasNextPage endCursor }";

const ASSIGNABLE_USERS_QUERY: &str = concatcp!(
    r#"
query RepositoryAssignableUsers($owner: String!, $name: String!, $endCursor: String) {
    repository(owner: $owner, name: $name) {
        assignableUsers(first: 100, after: $endCursor) {
            nodes { id login name }
            "#,
    PAGE_INFO,
    r#"
        }
    }
}
"#
);

const LABELS_QUERY: &str = concatcp!(
    r#"
query RepositoryLabelList($owner: String!, $name: String!, $endCursor: String) {
    repository(owner: $owner, name: $name) {
        labels(first: 100, orderBy: {field: NAME, direction: ASC}, after: $endCursor) {
            nodes { id name }
            "#,
    PAGE_INFO,
    r#"
        }
    }
}
"#
);

const MILESTONES_QUERY: &str = concatcp!(
    r#"
query RepositoryMilestoneList($owner: String!, $name: String!, $states: [MilestoneState!], $endCursor: String) {
    repository(owner: $owner, name: $name) {
        milestones(first: 100, states: $states, after: $endCursor) {
            nodes { id title }
            "#,
    PAGE_INFO,
    r#"
        }
    }
}
"#
);

const REPO_PROJECTS_QUERY: &str = concatcp!(
    r#"
query RepositoryProjectList($owner: String!, $name: String!, $endCursor: String) {
    repository(owner: $owner, name: $name) {
        projects(first: 100, states: [OPEN], after: $endCursor) {
            nodes { id name number resourcePath }
            "#,
    PAGE_INFO,
    r#"
        }
    }
}
"#
);

const REPO_PROJECTS_V2_QUERY: &str = concatcp!(
    r#"
query RepositoryProjectV2List($owner: String!, $name: String!, $endCursor: String) {
    repository(owner: $owner, name: $name) {
        projectsV2(first: 100, orderBy: {field: TITLE, direction: ASC}, query: "is:open", after: $endCursor) {
            nodes { id title number resourcePath }
            "#,
    PAGE_INFO,
    r#"
        }
    }
}
"#
);

const ORG_PROJECTS_QUERY: &str = concatcp!(
    r#"
query OrganizationProjectList($owner: String!, $endCursor: String) {
    organization(login: $owner) {
        projects(first: 100, states: [OPEN], after: $endCursor) {
            nodes { id name number resourcePath }
            "#,
    PAGE_INFO,
    r#"
        }
    }
}
"#
);

const ORG_PROJECTS_V2_QUERY: &str = concatcp!(
    r#"
query OrganizationProjectV2List($owner: String!, $endCursor: String) {
    organization(login: $owner) {
        projectsV2(first: 100, orderBy: {field: TITLE, direction: ASC}, query: "is:open", after: $endCursor) {
            nodes { id title number resourcePath }
            "#,
    PAGE_INFO,
    r#"
        }
    }
}
"#
);

const VIEWER_PROJECTS_V2_QUERY: &str = concatcp!(
    r#"
query UserProjectV2List($endCursor: String) {
    viewer {
        projectsV2(first: 100, orderBy: {field: TITLE, direction: ASC}, query: "is:open", after: $endCursor) {
            nodes { id title number resourcePath }
            "#,
    PAGE_INFO,
    r#"
        }
    }
}
"#
);

const ORG_TEAMS_QUERY: &str = concatcp!(
    r#"
query OrganizationTeamList($owner: String!, $endCursor: String) {
    organization(login: $owner) {
        teams(first: 100, orderBy: {field: NAME, direction: ASC}, after: $endCursor) {
            nodes { id slug }
            "#,
    PAGE_INFO,
    r#"
        }
    }
}
"#
);

const CURRENT_USER_QUERY: &str = r#"
query UserCurrent {
    viewer { login }
}
"#;

#[derive(Deserialize)]
struct AssignableUsers {
    #[serde(rename = "assignableUsers")]
    assignable_users: Connection<RepoAssignee>,
}

#[derive(Deserialize)]
struct Labels {
    labels: Connection<RepoLabel>,
}

#[derive(Deserialize)]
struct Milestones {
    milestones: Connection<RepoMilestone>,
}

#[derive(Deserialize)]
struct Projects {
    projects: Connection<RepoProject>,
}

#[derive(Deserialize)]
struct ProjectsV2 {
    #[serde(rename = "projectsV2")]
    projects_v2: Connection<ProjectV2>,
}

#[derive(Deserialize)]
struct Teams {
    teams: Connection<OrgTeam>,
}

fn repo_variables(repo: &RepoRef) -> Map<String, Value> {
    let mut variables = Map::new();
    variables.insert("owner".to_string(), json!(repo.owner()));
    variables.insert("name".to_string(), json!(repo.name()));
    variables
}

fn owner_variables(owner: &str) -> Map<String, Value> {
    let mut variables = Map::new();
    variables.insert("owner".to_string(), json!(owner));
    variables
}

async fn all_repository_nodes<T, C, N>(
    client: &ApiClient<T>,
    repo: &RepoRef,
    query: &str,
    variables: Map<String, Value>,
    nodes: fn(C) -> Vec<N>,
) -> Result<Vec<N>>
where
    T: Transport,
    C: DeserializeOwned,
{
    collect_graphql(client, repo.host(), query, variables, Limit::ALL, |data: RepositoryData<C>| {
        data.repository.map(nodes).unwrap_or_default()
    })
    .await
}

/// Organization-scoped listings are empty for user-owned repositories.
async fn all_organization_nodes<T, C, N>(
    client: &ApiClient<T>,
    host: &str,
    owner: &str,
    query: &str,
    nodes: fn(C) -> Vec<N>,
) -> Result<Vec<N>>
where
    T: Transport,
    C: DeserializeOwned,
{
    let result = collect_graphql(
        client,
        host,
        query,
        owner_variables(owner),
        Limit::ALL,
        |data: OrganizationData<C>| data.organization.map(nodes).unwrap_or_default(),
    )
    .await;

    match result {
        Err(e) if e.is_graphql("NOT_FOUND", &["organization"]) => {
            debug!(owner, "owner is not an organization");
            Ok(Vec::new())
        }
        other => other,
    }
}

pub async fn repo_assignable_users<T: Transport>(client: &ApiClient<T>, repo: &RepoRef) -> Result<Vec<RepoAssignee>> {
    all_repository_nodes(client, repo, ASSIGNABLE_USERS_QUERY, repo_variables(repo), |c: AssignableUsers| {
        c.assignable_users.nodes
    })
    .await
}

pub async fn repo_labels<T: Transport>(client: &ApiClient<T>, repo: &RepoRef) -> Result<Vec<RepoLabel>> {
    all_repository_nodes(client, repo, LABELS_QUERY, repo_variables(repo), |c: Labels| c.labels.nodes).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneState {
    Open,
    Closed,
    All,
}

impl MilestoneState {
    fn graphql_states(self) -> Value {
        match self {
            MilestoneState::Open => json!(["OPEN"]),
            MilestoneState::Closed => json!(["CLOSED"]),
            MilestoneState::All => json!(["OPEN", "CLOSED"]),
        }
    }
}

impl FromStr for MilestoneState {
    type Err = PullpoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(MilestoneState::Open),
            "closed" => Ok(MilestoneState::Closed),
            "all" => Ok(MilestoneState::All),
            other => Err(PullpoError::InvalidMilestoneState(other.to_string())),
        }
    }
}

/// Milestones filtered by `state`: exactly `open`, `closed` or `all`.
pub async fn repo_milestones<T: Transport>(
    client: &ApiClient<T>,
    repo: &RepoRef,
    state: &str,
) -> Result<Vec<RepoMilestone>> {
    let state: MilestoneState = state.parse()?;
    let mut variables = repo_variables(repo);
    variables.insert("states".to_string(), state.graphql_states());

    all_repository_nodes(client, repo, MILESTONES_QUERY, variables, |c: Milestones| c.milestones.nodes).await
}

pub async fn repo_projects<T: Transport>(client: &ApiClient<T>, repo: &RepoRef) -> Result<Vec<RepoProject>> {
    all_repository_nodes(client, repo, REPO_PROJECTS_QUERY, repo_variables(repo), |c: Projects| {
        c.projects.nodes
    })
    .await
}

pub async fn repo_projects_v2<T: Transport>(client: &ApiClient<T>, repo: &RepoRef) -> Result<Vec<ProjectV2>> {
    all_repository_nodes(client, repo, REPO_PROJECTS_V2_QUERY, repo_variables(repo), |c: ProjectsV2| {
        c.projects_v2.nodes
    })
    .await
}

pub async fn org_projects<T: Transport>(client: &ApiClient<T>, host: &str, org: &str) -> Result<Vec<RepoProject>> {
    all_organization_nodes(client, host, org, ORG_PROJECTS_QUERY, |c: Projects| c.projects.nodes).await
}

pub async fn org_projects_v2<T: Transport>(client: &ApiClient<T>, host: &str, org: &str) -> Result<Vec<ProjectV2>> {
    all_organization_nodes(client, host, org, ORG_PROJECTS_V2_QUERY, |c: ProjectsV2| c.projects_v2.nodes).await
}

/// Open v2 projects owned by the authenticated user.
pub async fn viewer_projects_v2<T: Transport>(client: &ApiClient<T>, host: &str) -> Result<Vec<ProjectV2>> {
    collect_graphql(
        client,
        host,
        VIEWER_PROJECTS_V2_QUERY,
        Map::new(),
        Limit::ALL,
        |data: ViewerData<ProjectsV2>| data.viewer.projects_v2.nodes,
    )
    .await
}

/// Teams of `org`, each tagged with the organization login.
pub async fn org_teams<T: Transport>(client: &ApiClient<T>, host: &str, org: &str) -> Result<Vec<OrgTeam>> {
    let mut teams = all_organization_nodes(client, host, org, ORG_TEAMS_QUERY, |c: Teams| c.teams.nodes).await?;
    for team in &mut teams {
        team.organization = org.to_string();
    }
    Ok(teams)
}

pub async fn current_login<T: Transport>(client: &ApiClient<T>, host: &str) -> Result<String> {
    let data: ViewerData<Login> = client.graphql(host, CURRENT_USER_QUERY, None).await?;
    Ok(data.viewer.login)
}

/// Classic projects of the repository and its owner, then v2 projects of the
/// repository, its owner and the viewer.
pub async fn repo_and_org_projects<T: Transport>(
    client: &ApiClient<T>,
    repo: &RepoRef,
) -> Result<(Vec<RepoProject>, Vec<ProjectV2>)> {
    let mut projects = repo_projects(client, repo).await?;
    projects.extend(org_projects(client, repo.host(), repo.owner()).await?);

    let mut projects_v2 = repo_projects_v2(client, repo).await?;
    projects_v2.extend(org_projects_v2(client, repo.host(), repo.owner()).await?);
    projects_v2.extend(viewer_projects_v2(client, repo.host()).await?);

    Ok((projects, projects_v2))
}

/// Which kinds [`repo_metadata`] should enumerate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepoMetadataInput {
    pub assignees: bool,
    pub reviewers: bool,
    pub labels: bool,
    pub projects: bool,
    pub milestones: bool,
}

/// Enumerate every requested kind. Queries run one after another and the
/// first failure aborts the whole call.
pub async fn repo_metadata<T: Transport>(
    client: &ApiClient<T>,
    repo: &RepoRef,
    input: &RepoMetadataInput,
) -> Result<RepoMetadataResult> {
    let mut result = RepoMetadataResult {
        repo_owner: repo.owner().to_string(),
        ..Default::default()
    };

    if input.assignees || input.reviewers {
        result.assignable_users = repo_assignable_users(client, repo).await?;
    }
    if input.reviewers {
        result.teams = org_teams(client, repo.host(), repo.owner()).await?;
        result.current_login = current_login(client, repo.host()).await?;
    }
    if input.labels {
        result.labels = repo_labels(client, repo).await?;
    }
    if input.projects {
        let (projects, projects_v2) = repo_and_org_projects(client, repo).await?;
        result.projects = projects;
        result.projects_v2 = projects_v2;
    }
    if input.milestones {
        result.milestones = repo_milestones(client, repo, "open").await?;
    }

    debug!(
        repo = %repo,
        users = result.assignable_users.len(),
        teams = result.teams.len(),
        labels = result.labels.len(),
        projects = result.projects.len() + result.projects_v2.len(),
        milestones = result.milestones.len(),
        "repository metadata enumerated"
    );
    Ok(result)
}

/// Enumerate projects and map `names` to their short paths.
pub async fn project_names_to_paths<T: Transport, S: AsRef<str>>(
    client: &ApiClient<T>,
    repo: &RepoRef,
    names: &[S],
) -> Result<Vec<String>> {
    let (projects, projects_v2) = repo_and_org_projects(client, repo).await?;
    projects_to_paths(&projects, &projects_v2, names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubTransport;

    fn stub_projects(stub: &StubTransport) {
        stub.graphql(
            r"query RepositoryProjectList\b",
            r#"{ "data": { "repository": { "projects": {
                "nodes": [
                    { "name": "Cleanup", "id": "CLEANUPID", "resourcePath": "/OWNER/REPO/projects/1" },
                    { "name": "Roadmap", "id": "ROADMAPID", "resourcePath": "/OWNER/REPO/projects/2" }
                ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        stub.graphql(
            r"query OrganizationProjectList\b",
            r#"{ "data": { "organization": { "projects": {
                "nodes": [
                    { "name": "Triage", "id": "TRIAGEID", "resourcePath": "/orgs/ORG/projects/1" }
                ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        stub.graphql(
            r"query RepositoryProjectV2List\b",
            r#"{ "data": { "repository": { "projectsV2": {
                "nodes": [
                    { "title": "CleanupV2", "id": "CLEANUPV2ID", "resourcePath": "/OWNER/REPO/projects/3" },
                    { "title": "RoadmapV2", "id": "ROADMAPV2ID", "resourcePath": "/OWNER/REPO/projects/4" }
                ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        stub.graphql(
            r"query OrganizationProjectV2List\b",
            r#"{ "data": { "organization": { "projectsV2": {
                "nodes": [
                    { "title": "TriageV2", "id": "TRIAGEV2ID", "resourcePath": "/orgs/ORG/projects/2" }
                ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        stub.graphql(
            r"query UserProjectV2List\b",
            r#"{ "data": { "viewer": { "projectsV2": {
                "nodes": [
                    { "title": "MonalisaV2", "id": "MONALISAV2ID", "resourcePath": "/users/MONALISA/projects/5" }
                ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
    }

    #[tokio::test]
    async fn test_repo_metadata() {
        let stub = StubTransport::new();
        stub.graphql(
            r"query RepositoryAssignableUsers\b",
            r#"{ "data": { "repository": { "assignableUsers": {
                "nodes": [
                    { "login": "hubot", "id": "HUBOTID" },
                    { "login": "MonaLisa", "id": "MONAID" }
                ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        stub.graphql(
            r"query OrganizationTeamList\b",
            r#"{ "data": { "organization": { "teams": {
                "nodes": [
                    { "slug": "owners", "id": "OWNERSID" },
                    { "slug": "Core", "id": "COREID" }
                ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        stub.graphql(r"query UserCurrent\b", r#"{ "data": { "viewer": { "login": "monalisa" } } }"#);
        stub.graphql(
            r"query RepositoryLabelList\b",
            r#"{ "data": { "repository": { "labels": {
                "nodes": [
                    { "name": "feature", "id": "FEATUREID" },
                    { "name": "TODO", "id": "TODOID" },
                    { "name": "bug", "id": "BUGID" }
                ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        stub.graphql(
            r"query RepositoryProjectList\b",
            r#"{ "data": { "repository": { "projects": {
                "nodes": [
                    { "name": "Cleanup", "id": "CLEANUPID" },
                    { "name": "Roadmap", "id": "ROADMAPID" }
                ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        stub.graphql(
            r"query OrganizationProjectList\b",
            r#"{ "data": { "organization": { "projects": {
                "nodes": [ { "name": "Triage", "id": "TRIAGEID" } ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        stub.graphql(
            r"query RepositoryProjectV2List\b",
            r#"{ "data": { "repository": { "projectsV2": {
                "nodes": [
                    { "title": "CleanupV2", "id": "CLEANUPV2ID" },
                    { "title": "RoadmapV2", "id": "ROADMAPV2ID" }
                ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        stub.graphql(
            r"query OrganizationProjectV2List\b",
            r#"{ "data": { "organization": { "projectsV2": {
                "nodes": [ { "title": "TriageV2", "id": "TRIAGEV2ID" } ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        stub.graphql(
            r"query UserProjectV2List\b",
            r#"{ "data": { "viewer": { "projectsV2": {
                "nodes": [ { "title": "MonalisaV2", "id": "MONALISAV2ID" } ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        stub.graphql(
            r"query RepositoryMilestoneList\b",
            r#"{ "data": { "repository": { "milestones": {
                "nodes": [
                    { "title": "GA", "id": "GAID" },
                    { "title": "Big One.oh", "id": "BIGONEID" }
                ],
                "pageInfo": { "hasNextPage": false }
            } } } }"#,
        );
        let client = ApiClient::new(stub);

        let repo = RepoRef::from_full_name("OWNER/REPO").unwrap();
        let input = RepoMetadataInput {
            assignees: true,
            reviewers: true,
            labels: true,
            projects: true,
            milestones: true,
        };
        let result = repo_metadata(&client, &repo, &input).await.unwrap();
        client.transport().verify();

        assert_eq!(result.members_to_ids(&["monalisa", "hubot"]).unwrap(), ["MONAID", "HUBOTID"]);
        assert_eq!(result.teams_to_ids(&["OWNER/core", "/owners"]).unwrap(), ["COREID", "OWNERSID"]);
        assert_eq!(result.labels_to_ids(&["bug", "todo"]).unwrap(), ["BUGID", "TODOID"]);

        let (ids, ids_v2) = result
            .projects_to_ids(&["triage", "roadmap", "triagev2", "roadmapv2", "monalisav2"])
            .unwrap();
        assert_eq!(ids, ["TRIAGEID", "ROADMAPID"]);
        assert_eq!(ids_v2, ["TRIAGEV2ID", "ROADMAPV2ID", "MONALISAV2ID"]);

        assert_eq!(result.milestone_to_id("big one.oh").unwrap(), "BIGONEID");
        assert_eq!(result.current_login, "monalisa");
    }

    #[tokio::test]
    async fn test_repo_metadata_only_requested_kinds() {
        let stub = StubTransport::new();
        stub.graphql(
            r"query RepositoryLabelList\b",
            r#"{ "data": { "repository": { "labels": { "nodes": [], "pageInfo": { "hasNextPage": false } } } } }"#,
        );
        let client = ApiClient::new(stub);

        let input = RepoMetadataInput {
            labels: true,
            ..Default::default()
        };
        repo_metadata(&client, &RepoRef::new("OWNER", "REPO"), &input)
            .await
            .unwrap();
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_repo_metadata_aborts_on_error() {
        let stub = StubTransport::new();
        stub.graphql(
            r"query RepositoryAssignableUsers\b",
            r#"{ "data": { "repository": { "assignableUsers": { "nodes": [ { "login": "hubot", "id": "HUBOTID" } ], "pageInfo": { "hasNextPage": false } } } } }"#,
        );
        stub.rest_status("POST", "graphql", 502, "Bad Gateway");
        let client = ApiClient::new(stub);

        let input = RepoMetadataInput {
            assignees: true,
            labels: true,
            ..Default::default()
        };
        let err = repo_metadata(&client, &RepoRef::new("OWNER", "REPO"), &input)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway (https://api.github.com/graphql)");
    }

    #[tokio::test]
    async fn test_assignable_users_paginate() {
        let stub = StubTransport::new();
        stub.graphql(
            r"query RepositoryAssignableUsers\b",
            r#"{ "data": { "repository": { "assignableUsers": {
                "nodes": [ { "login": "hubot", "id": "HUBOTID", "name": null } ],
                "pageInfo": { "hasNextPage": true, "endCursor": "Y3Vyc29yOjE=" }
            } } } }"#,
        );
        stub.graphql(
            r"query RepositoryAssignableUsers\b",
            r#"{ "data": { "repository": { "assignableUsers": {
                "nodes": [ { "login": "octocat", "id": "OCTOID", "name": "Mona Octocat" } ],
                "pageInfo": { "hasNextPage": false, "endCursor": "Y3Vyc29yOjI=" }
            } } } }"#,
        );
        let client = ApiClient::new(stub);

        let users = repo_assignable_users(&client, &RepoRef::new("OWNER", "REPO")).await.unwrap();
        let logins: Vec<String> = users.iter().map(RepoAssignee::display_name).collect();
        assert_eq!(logins, ["hubot", "octocat (Mona Octocat)"]);

        let requests = client.transport().requests();
        let variables = &requests[1].body.as_ref().unwrap()["variables"];
        assert_eq!(variables["endCursor"], "Y3Vyc29yOjE=");
        assert_eq!(variables["owner"], "OWNER");
        assert_eq!(variables["name"], "REPO");
    }

    #[tokio::test]
    async fn test_org_not_found_is_empty() {
        let stub = StubTransport::new();
        stub.graphql(
            r"query OrganizationTeamList\b",
            r#"{ "data": { "organization": null }, "errors": [
                { "type": "NOT_FOUND", "path": ["organization"], "message": "Could not resolve to an Organization with the login of 'monalisa'." }
            ] }"#,
        );
        let client = ApiClient::new(stub);

        let teams = org_teams(&client, "github.com", "monalisa").await.unwrap();
        assert!(teams.is_empty());
    }

    #[tokio::test]
    async fn test_org_other_errors_propagate() {
        let stub = StubTransport::new();
        stub.graphql(
            r"query OrganizationProjectList\b",
            r#"{ "data": null, "errors": [ { "type": "FORBIDDEN", "path": ["organization"], "message": "Resource not accessible" } ] }"#,
        );
        let client = ApiClient::new(stub);

        let err = org_projects(&client, "github.com", "ORG").await.unwrap_err();
        assert_eq!(err.to_string(), "GraphQL: Resource not accessible");
    }

    #[tokio::test]
    async fn test_repo_milestones_states() {
        let cases = [
            ("open", r#""states":["OPEN"]"#),
            ("closed", r#""states":["CLOSED"]"#),
            ("all", r#""states":["OPEN","CLOSED"]"#),
        ];
        for (state, want) in cases {
            let stub = StubTransport::new();
            stub.graphql(
                r"query RepositoryMilestoneList\b",
                r#"{ "data": { "repository": { "milestones": { "nodes": [], "pageInfo": { "hasNextPage": false } } } } }"#,
            );
            let client = ApiClient::new(stub);

            repo_milestones(&client, &RepoRef::new("OWNER", "REPO"), state)
                .await
                .unwrap();
            let body = serde_json::to_string(client.transport().requests()[0].body.as_ref().unwrap()).unwrap();
            assert!(body.contains(want), "{state}: {body}");
        }
    }

    #[test]
    fn test_milestone_state_is_lowercase_only() {
        assert_eq!("open".parse::<MilestoneState>().unwrap(), MilestoneState::Open);
        assert_eq!("all".parse::<MilestoneState>().unwrap(), MilestoneState::All);
        for state in ["Open", "CLOSED", " all", ""] {
            assert!(state.parse::<MilestoneState>().is_err(), "{state:?}");
        }
    }

    #[tokio::test]
    async fn test_repo_milestones_invalid_state() {
        let client = ApiClient::new(StubTransport::new());
        let err = repo_milestones(&client, &RepoRef::new("OWNER", "REPO"), "invalid state")
            .await
            .unwrap_err();
        assert!(matches!(err, PullpoError::InvalidMilestoneState(_)));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_project_names_to_paths() {
        let stub = StubTransport::new();
        stub_projects(&stub);
        let client = ApiClient::new(stub);

        let paths = project_names_to_paths(
            &client,
            &RepoRef::new("OWNER", "REPO"),
            &["Triage", "Roadmap", "TriageV2", "RoadmapV2", "MonalisaV2"],
        )
        .await
        .unwrap();
        assert_eq!(paths, ["ORG/1", "OWNER/REPO/2", "ORG/2", "OWNER/REPO/4", "MONALISA/5"]);
        client.transport().verify();
    }
}
