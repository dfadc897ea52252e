//! Per-host detection of optional GraphQL schema features.
//!
//! Self-hosted instances lag behind the public service, so before asking for
//! an optional field the caller checks whether the host's schema has it. The
//! public service is assumed to have everything and is never probed.
//!
//! Results live in a [`HostCapabilities`] owned by the caller; a
//! [`Detector`] borrows it and fills each feature group at most once.

use serde::{de::DeserializeOwned, Deserialize};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::client::{ApiClient, Transport};
use crate::instance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IssueFeatures {
    pub state_reason: bool,
}

impl IssueFeatures {
    pub const ALL: Self = Self { state_reason: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PullRequestFeatures {
    pub merge_queue: bool,
    /// `checkRunCount`, `checkRunCountsByState`, `statusContextCount` and
    /// `statusContextCountsByState` shipped together; one probe covers all four.
    pub check_run_and_status_context_counts: bool,
    pub check_run_event: bool,
}

impl PullRequestFeatures {
    pub const ALL: Self = Self {
        merge_queue: true,
        check_run_and_status_context_counts: true,
        check_run_event: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepositoryFeatures {
    pub pull_request_template_query: bool,
    pub visibility_field: bool,
    pub auto_merge: bool,
}

impl RepositoryFeatures {
    pub const ALL: Self = Self {
        pull_request_template_query: true,
        visibility_field: true,
        auto_merge: true,
    };
}

/// Memoized feature groups for one host. Each slot is filled once and never
/// invalidated.
#[derive(Debug, Default)]
pub struct HostCapabilities {
    issue: OnceCell<IssueFeatures>,
    pull_request: OnceCell<PullRequestFeatures>,
    repository: OnceCell<RepositoryFeatures>,
}

impl HostCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that already knows every group; no probe will be sent.
    pub fn with_features(
        issue: IssueFeatures,
        pull_request: PullRequestFeatures,
        repository: RepositoryFeatures,
    ) -> Self {
        Self {
            issue: OnceCell::new_with(Some(issue)),
            pull_request: OnceCell::new_with(Some(pull_request)),
            repository: OnceCell::new_with(Some(repository)),
        }
    }

    pub fn issue(&self) -> Option<IssueFeatures> {
        self.issue.get().copied()
    }

    pub fn pull_request(&self) -> Option<PullRequestFeatures> {
        self.pull_request.get().copied()
    }

    pub fn repository(&self) -> Option<RepositoryFeatures> {
        self.repository.get().copied()
    }
}

const ISSUE_FIELDS_QUERY: &str = r#"
query Issue_fields {
    Issue: __type(name: "Issue") {
        fields(includeDeprecated: true) { name }
    }
}
"#;

const PULL_REQUEST_FIELDS_QUERY: &str = r#"
query PullRequest_fields {
    PullRequest: __type(name: "PullRequest") {
        fields(includeDeprecated: true) { name }
    }
    StatusCheckRollupContextConnection: __type(name: "StatusCheckRollupContextConnection") {
        fields(includeDeprecated: true) { name }
    }
}
"#;

const PULL_REQUEST_FIELDS2_QUERY: &str = r#"
query PullRequest_fields2 {
    WorkflowRun: __type(name: "WorkflowRun") {
        fields(includeDeprecated: true) { name }
    }
}
"#;

const REPOSITORY_FIELDS_QUERY: &str = r#"
query Repository_fields {
    Repository: __type(name: "Repository") {
        fields(includeDeprecated: true) { name }
    }
}
"#;

#[derive(Deserialize, Default)]
struct TypeFields {
    #[serde(default)]
    fields: Vec<FieldName>,
}

#[derive(Deserialize)]
struct FieldName {
    name: String,
}

impl TypeFields {
    fn has(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

#[derive(Deserialize, Default)]
struct IssueProbe {
    #[serde(rename = "Issue", default)]
    issue: Option<TypeFields>,
}

#[derive(Deserialize, Default)]
struct PullRequestProbe {
    #[serde(rename = "PullRequest", default)]
    pull_request: Option<TypeFields>,
    #[serde(rename = "StatusCheckRollupContextConnection", default)]
    status_check_rollup_context_connection: Option<TypeFields>,
}

#[derive(Deserialize, Default)]
struct WorkflowRunProbe {
    #[serde(rename = "WorkflowRun", default)]
    workflow_run: Option<TypeFields>,
}

#[derive(Deserialize, Default)]
struct RepositoryProbe {
    #[serde(rename = "Repository", default)]
    repository: Option<TypeFields>,
}

pub struct Detector<'a, T: Transport> {
    client: &'a ApiClient<T>,
    host: String,
    cache: &'a HostCapabilities,
}

impl<'a, T: Transport> Detector<'a, T> {
    pub fn new(client: &'a ApiClient<T>, host: &str, cache: &'a HostCapabilities) -> Self {
        Self {
            client,
            host: host.to_string(),
            cache,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub async fn issue_features(&self) -> IssueFeatures {
        *self
            .cache
            .issue
            .get_or_init(|| async {
                if !instance::is_enterprise(&self.host) {
                    return IssueFeatures::ALL;
                }
                let probe: IssueProbe = self.probe("Issue_fields", ISSUE_FIELDS_QUERY).await;
                let fields = probe.issue.unwrap_or_default();
                IssueFeatures {
                    state_reason: fields.has("stateReason"),
                }
            })
            .await
    }

    pub async fn pull_request_features(&self) -> PullRequestFeatures {
        *self
            .cache
            .pull_request
            .get_or_init(|| async {
                if !instance::is_enterprise(&self.host) {
                    return PullRequestFeatures::ALL;
                }
                let probe: PullRequestProbe = self
                    .probe("PullRequest_fields", PULL_REQUEST_FIELDS_QUERY)
                    .await;
                let workflow: WorkflowRunProbe = self
                    .probe("PullRequest_fields2", PULL_REQUEST_FIELDS2_QUERY)
                    .await;

                let pull_request = probe.pull_request.unwrap_or_default();
                let rollup = probe
                    .status_check_rollup_context_connection
                    .unwrap_or_default();
                let workflow_run = workflow.workflow_run.unwrap_or_default();

                PullRequestFeatures {
                    merge_queue: pull_request.has("isInMergeQueue"),
                    check_run_and_status_context_counts: rollup.has("checkRunCountsByState"),
                    check_run_event: workflow_run.has("event"),
                }
            })
            .await
    }

    pub async fn repository_features(&self) -> RepositoryFeatures {
        *self
            .cache
            .repository
            .get_or_init(|| async {
                if !instance::is_enterprise(&self.host) {
                    return RepositoryFeatures::ALL;
                }
                let probe: RepositoryProbe =
                    self.probe("Repository_fields", REPOSITORY_FIELDS_QUERY).await;
                let fields = probe.repository.unwrap_or_default();
                RepositoryFeatures {
                    pull_request_template_query: fields.has("pullRequestTemplates"),
                    visibility_field: fields.has("visibility"),
                    auto_merge: fields.has("autoMergeAllowed"),
                }
            })
            .await
    }

    /// A failed or malformed probe reads as "no optional fields".
    async fn probe<P: DeserializeOwned + Default>(&self, name: &str, query: &str) -> P {
        match self.client.graphql::<P>(&self.host, query, None).await {
            Ok(probe) => probe,
            Err(err) => {
                debug!(host = %self.host, probe = name, error = %err, "feature probe failed, assuming fields absent");
                P::default()
            }
        }
    }
}
