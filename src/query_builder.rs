//! Compiles logical output field names into GraphQL selection strings.
//!
//! Every field the product can request is listed once in a static table with
//! its selection fragment. Names missing from the table, issue-only names
//! compiled for a pull request, and names whose schema feature the host lacks
//! are dropped without error.

use crate::client::Transport;
use crate::features::{Detector, IssueFeatures, PullRequestFeatures, RepositoryFeatures};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Issue,
    PullRequest,
    Repository,
}

/// Optional schema feature a field depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    IssueStateReason,
    MergeQueue,
    CheckRunCounts,
    RepositoryVisibility,
    PullRequestTemplates,
    AutoMerge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Shared,
    IssueOnly,
    PullRequestOnly,
    Repository,
}

impl Scope {
    /// Issue selections accept the whole issue/PR table. Pull request
    /// selections reject the issue-only fields.
    fn admits(self, kind: ObjectKind) -> bool {
        matches!(
            (self, kind),
            (Scope::Shared | Scope::IssueOnly | Scope::PullRequestOnly, ObjectKind::Issue)
                | (Scope::Shared | Scope::PullRequestOnly, ObjectKind::PullRequest)
                | (Scope::Repository, ObjectKind::Repository)
        )
    }
}

struct FieldSpec {
    name: &'static str,
    fragment: &'static str,
    scope: Scope,
    gate: Option<Gate>,
}

const fn plain(name: &'static str, scope: Scope) -> FieldSpec {
    FieldSpec {
        name,
        fragment: name,
        scope,
        gate: None,
    }
}

const fn nested(name: &'static str, fragment: &'static str, scope: Scope) -> FieldSpec {
    FieldSpec {
        name,
        fragment,
        scope,
        gate: None,
    }
}

const fn gated(name: &'static str, fragment: &'static str, scope: Scope, gate: Gate) -> FieldSpec {
    FieldSpec {
        name,
        fragment,
        scope,
        gate: Some(gate),
    }
}

const AUTHOR: &str = "author{login,...on User{id,name}}";

const ISSUE_COMMENTS: &str = "comments(first: 100) {nodes {id,author{login,...on User{id,name}},authorAssociation,body,createdAt,includesCreatedEdit,isMinimized,minimizedReason,reactionGroups{content,users{totalCount}},url,viewerDidAuthor},pageInfo{hasNextPage,endCursor},totalCount}";

const ISSUE_COMMENT_LAST: &str = "comments(last: 1) {nodes {author{login,...on User{id,name}},authorAssociation,body,createdAt,includesCreatedEdit,isMinimized,minimizedReason,reactionGroups{content,users{totalCount}}},totalCount}";

const CLOSED_BY_PULL_REQUESTS: &str = "closedByPullRequestsReferences(first: 100) {nodes {id, number, url,repository { id, name, owner { id, login } }}pageInfo{hasNextPage,endCursor}}";

const PROJECT_ITEMS: &str = r#"projectItems(first:100){nodes{id, project{id,title}, status:fieldValueByName(name: "Status") { ... on ProjectV2ItemFieldSingleSelectValue{optionId,name}}},totalCount}"#;

const PR_REVIEW_REQUESTS: &str = "reviewRequests(first: 100) {nodes {requestedReviewer {__typename,...on User{login},...on Team{organization{login}name,slug}}}}";

const PR_REVIEWS: &str = "reviews(first: 100) {nodes {id,author{login},authorAssociation,submittedAt,body,state,commit{oid},reactionGroups{content,users{totalCount}}}pageInfo{hasNextPage,endCursor}totalCount}";

const PR_LATEST_REVIEWS: &str = "latestReviews(first: 100) {nodes {author{login},authorAssociation,submittedAt,body,state}}";

const PR_FILES: &str = "files(first: 100) {nodes {additions,deletions,path}}";

const PR_COMMITS: &str = "commits(first: 100) {nodes {commit {authors(first:100) {nodes {name,email,user{id,login}}},messageHeadline,messageBody,oid,committedDate,authoredDate}}}";

const AUTO_MERGE_REQUEST: &str = "autoMergeRequest {authorEmail,commitBody,commitHeadline,mergeMethod,enabledAt,enabledBy{login,...on User{id,name}}}";

const STATUS_CHECK_ROLLUP: &str = "statusCheckRollup: commits(last: 1) {nodes {commit {statusCheckRollup {contexts(first:100) {nodes {__typename...on StatusContext {context,state,targetUrl,createdAt,description},...on CheckRun {name,checkSuite{workflowRun{workflow{name}}},status,conclusion,startedAt,completedAt,detailsUrl}},pageInfo{hasNextPage,endCursor}}}}}}";

const STATUS_CHECK_ROLLUP_COUNTS: &str = "statusCheckRollup: commits(last: 1) {nodes {commit {statusCheckRollup {contexts {checkRunCount,checkRunCountsByState {state,count},statusContextCount,statusContextCountsByState {state,count}}}}}}";

const ISSUE_PR_FIELDS: &[FieldSpec] = &[
    nested("assignees", "assignees(first:100){nodes{id,login,name},totalCount}", Scope::Shared),
    nested("author", AUTHOR, Scope::Shared),
    plain("body", Scope::Shared),
    plain("closed", Scope::Shared),
    nested("comments", ISSUE_COMMENTS, Scope::Shared),
    plain("createdAt", Scope::Shared),
    plain("closedAt", Scope::Shared),
    plain("id", Scope::Shared),
    nested("labels", "labels(first:100){nodes{id,name,description,color},totalCount}", Scope::Shared),
    nested("milestone", "milestone{number,title,description,dueOn}", Scope::Shared),
    plain("number", Scope::Shared),
    nested("projectCards", "projectCards(first:100){nodes{project{name}column{name}},totalCount}", Scope::Shared),
    nested("projectItems", PROJECT_ITEMS, Scope::Shared),
    nested("reactionGroups", "reactionGroups{content,users{totalCount}}", Scope::Shared),
    plain("state", Scope::Shared),
    plain("title", Scope::Shared),
    plain("updatedAt", Scope::Shared),
    plain("url", Scope::Shared),
    nested("lastComment", ISSUE_COMMENT_LAST, Scope::Shared),
    // issues
    plain("isPinned", Scope::IssueOnly),
    gated("stateReason", "stateReason", Scope::IssueOnly, Gate::IssueStateReason),
    nested("closedByPullRequestsReferences", CLOSED_BY_PULL_REQUESTS, Scope::IssueOnly),
    // pull requests
    plain("additions", Scope::PullRequestOnly),
    nested("autoMergeRequest", AUTO_MERGE_REQUEST, Scope::PullRequestOnly),
    plain("baseRefName", Scope::PullRequestOnly),
    plain("baseRefOid", Scope::PullRequestOnly),
    plain("changedFiles", Scope::PullRequestOnly),
    nested("commits", PR_COMMITS, Scope::PullRequestOnly),
    plain("deletions", Scope::PullRequestOnly),
    nested("files", PR_FILES, Scope::PullRequestOnly),
    plain("fullDatabaseId", Scope::PullRequestOnly),
    plain("headRefName", Scope::PullRequestOnly),
    plain("headRefOid", Scope::PullRequestOnly),
    nested("headRepository", "headRepository{id,name}", Scope::PullRequestOnly),
    nested("headRepositoryOwner", "headRepositoryOwner{id,login,...on User{name}}", Scope::PullRequestOnly),
    plain("isCrossRepository", Scope::PullRequestOnly),
    plain("isDraft", Scope::PullRequestOnly),
    gated("isInMergeQueue", "isInMergeQueue", Scope::PullRequestOnly, Gate::MergeQueue),
    gated("isMergeQueueEnabled", "isMergeQueueEnabled", Scope::PullRequestOnly, Gate::MergeQueue),
    nested("latestReviews", PR_LATEST_REVIEWS, Scope::PullRequestOnly),
    plain("maintainerCanModify", Scope::PullRequestOnly),
    plain("mergeable", Scope::PullRequestOnly),
    nested("mergeCommit", "mergeCommit{oid}", Scope::PullRequestOnly),
    plain("mergedAt", Scope::PullRequestOnly),
    nested("mergedBy", "mergedBy{login,...on User{id,name}}", Scope::PullRequestOnly),
    plain("mergeStateStatus", Scope::PullRequestOnly),
    nested("potentialMergeCommit", "potentialMergeCommit{oid}", Scope::PullRequestOnly),
    plain("reviewDecision", Scope::PullRequestOnly),
    nested("reviewRequests", PR_REVIEW_REQUESTS, Scope::PullRequestOnly),
    nested("reviews", PR_REVIEWS, Scope::PullRequestOnly),
    nested("statusCheckRollup", STATUS_CHECK_ROLLUP, Scope::PullRequestOnly),
    // pseudo-fields
    nested("lastCommit", "commits(last:1){nodes{commit{oid}}}", Scope::PullRequestOnly),
    nested("commitsCount", "commits{totalCount}", Scope::PullRequestOnly),
    nested(
        "requiresStrictStatusChecks",
        "baseRef{branchProtectionRule{requiresStrictStatusChecks}}",
        Scope::PullRequestOnly,
    ),
    gated(
        "statusCheckRollupWithCountByState",
        STATUS_CHECK_ROLLUP_COUNTS,
        Scope::PullRequestOnly,
        Gate::CheckRunCounts,
    ),
];

const REPOSITORY_FIELDS: &[FieldSpec] = &[
    plain("archivedAt", Scope::Repository),
    nested("assignableUsers", "assignableUsers(first:100){nodes{id,login,name}}", Scope::Repository),
    gated("autoMergeAllowed", "autoMergeAllowed", Scope::Repository, Gate::AutoMerge),
    nested("codeOfConduct", "codeOfConduct{key,name,url}", Scope::Repository),
    nested("contactLinks", "contactLinks{about,name,url}", Scope::Repository),
    plain("createdAt", Scope::Repository),
    nested("defaultBranchRef", "defaultBranchRef{name}", Scope::Repository),
    plain("deleteBranchOnMerge", Scope::Repository),
    plain("description", Scope::Repository),
    plain("diskUsage", Scope::Repository),
    plain("forkCount", Scope::Repository),
    nested("fundingLinks", "fundingLinks{platform,url}", Scope::Repository),
    plain("hasDiscussionsEnabled", Scope::Repository),
    plain("hasIssuesEnabled", Scope::Repository),
    plain("hasProjectsEnabled", Scope::Repository),
    plain("hasWikiEnabled", Scope::Repository),
    plain("homepageUrl", Scope::Repository),
    plain("id", Scope::Repository),
    plain("isArchived", Scope::Repository),
    plain("isBlankIssuesEnabled", Scope::Repository),
    plain("isEmpty", Scope::Repository),
    plain("isFork", Scope::Repository),
    plain("isInOrganization", Scope::Repository),
    plain("isMirror", Scope::Repository),
    plain("isPrivate", Scope::Repository),
    plain("isSecurityPolicyEnabled", Scope::Repository),
    plain("isTemplate", Scope::Repository),
    plain("isUserConfigurationRepository", Scope::Repository),
    nested("issueTemplates", "issueTemplates{name,title,body,about}", Scope::Repository),
    nested("issues", "issues(states:OPEN){totalCount}", Scope::Repository),
    nested("labels", "labels(first:100){nodes{id,color,name,description}}", Scope::Repository),
    nested("languages", "languages(first:100){edges{size,node{name}}}", Scope::Repository),
    nested("latestRelease", "latestRelease{publishedAt,tagName,name,url}", Scope::Repository),
    nested("licenseInfo", "licenseInfo{key,name,nickname}", Scope::Repository),
    nested("mentionableUsers", "mentionableUsers(first:100){nodes{id,login,name}}", Scope::Repository),
    plain("mergeCommitAllowed", Scope::Repository),
    nested("milestones", "milestones(first:100,states:OPEN){nodes{number,title,description,dueOn}}", Scope::Repository),
    plain("mirrorUrl", Scope::Repository),
    plain("name", Scope::Repository),
    plain("nameWithOwner", Scope::Repository),
    plain("openGraphImageUrl", Scope::Repository),
    nested("owner", "owner{id,login}", Scope::Repository),
    nested("parent", "parent{id,name,owner{id,login}}", Scope::Repository),
    nested("primaryLanguage", "primaryLanguage{name}", Scope::Repository),
    nested("projects", "projects(first:100,states:OPEN){nodes{id,name,number,body,resourcePath}}", Scope::Repository),
    nested(
        "projectsV2",
        r#"projectsV2(first:100,query:"is:open"){nodes{id,number,title,resourcePath,closed,url}}"#,
        Scope::Repository,
    ),
    gated("pullRequestTemplates", "pullRequestTemplates{body,filename}", Scope::Repository, Gate::PullRequestTemplates),
    nested("pullRequests", "pullRequests(states:OPEN){totalCount}", Scope::Repository),
    plain("pushedAt", Scope::Repository),
    plain("rebaseMergeAllowed", Scope::Repository),
    nested("repositoryTopics", "repositoryTopics(first:100){nodes{topic{name}}}", Scope::Repository),
    plain("securityPolicyUrl", Scope::Repository),
    plain("squashMergeAllowed", Scope::Repository),
    plain("sshUrl", Scope::Repository),
    plain("stargazerCount", Scope::Repository),
    nested("templateRepository", "templateRepository{id,name,owner{id,login}}", Scope::Repository),
    plain("updatedAt", Scope::Repository),
    plain("url", Scope::Repository),
    plain("usesCustomOpenGraphImage", Scope::Repository),
    plain("viewerCanAdminister", Scope::Repository),
    plain("viewerDefaultCommitEmail", Scope::Repository),
    plain("viewerDefaultMergeMethod", Scope::Repository),
    plain("viewerHasStarred", Scope::Repository),
    plain("viewerPermission", Scope::Repository),
    plain("viewerPossibleCommitEmails", Scope::Repository),
    plain("viewerSubscription", Scope::Repository),
    gated("visibility", "visibility", Scope::Repository, Gate::RepositoryVisibility),
    nested("watchers", "watchers{totalCount}", Scope::Repository),
];

fn table(kind: ObjectKind) -> &'static [FieldSpec] {
    match kind {
        ObjectKind::Issue | ObjectKind::PullRequest => ISSUE_PR_FIELDS,
        ObjectKind::Repository => REPOSITORY_FIELDS,
    }
}

/// Field names the compiler knows for `kind`, in table order.
pub fn known_fields(kind: ObjectKind) -> Vec<&'static str> {
    table(kind)
        .iter()
        .filter(|spec| spec.scope.admits(kind))
        .map(|spec| spec.name)
        .collect()
}

/// The feature groups a compilation may rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub issue: IssueFeatures,
    pub pull_request: PullRequestFeatures,
    pub repository: RepositoryFeatures,
}

impl Capabilities {
    pub const ALL: Self = Self {
        issue: IssueFeatures::ALL,
        pull_request: PullRequestFeatures::ALL,
        repository: RepositoryFeatures::ALL,
    };

    /// Probe every feature group through `detector`.
    pub async fn detect<T: Transport>(detector: &Detector<'_, T>) -> Self {
        Self {
            issue: detector.issue_features().await,
            pull_request: detector.pull_request_features().await,
            repository: detector.repository_features().await,
        }
    }

    fn allows(&self, gate: Gate) -> bool {
        match gate {
            Gate::IssueStateReason => self.issue.state_reason,
            Gate::MergeQueue => self.pull_request.merge_queue,
            Gate::CheckRunCounts => self.pull_request.check_run_and_status_context_counts,
            Gate::RepositoryVisibility => self.repository.visibility_field,
            Gate::PullRequestTemplates => self.repository.pull_request_template_query,
            Gate::AutoMerge => self.repository.auto_merge,
        }
    }
}

/// Compile `fields` in input order into one comma-joined selection.
pub fn compile<S: AsRef<str>>(kind: ObjectKind, fields: &[S], capabilities: &Capabilities) -> String {
    let specs = table(kind);
    fields
        .iter()
        .filter_map(|field| specs.iter().find(|spec| spec.name == field.as_ref()))
        .filter(|spec| spec.scope.admits(kind))
        .filter(|spec| spec.gate.map_or(true, |gate| capabilities.allows(gate)))
        .map(|spec| spec.fragment)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn issue_graphql<S: AsRef<str>>(fields: &[S]) -> String {
    compile(ObjectKind::Issue, fields, &Capabilities::ALL)
}

pub fn pull_request_graphql<S: AsRef<str>>(fields: &[S]) -> String {
    compile(ObjectKind::PullRequest, fields, &Capabilities::ALL)
}

pub fn repository_graphql<S: AsRef<str>>(fields: &[S]) -> String {
    compile(ObjectKind::Repository, fields, &Capabilities::ALL)
}
