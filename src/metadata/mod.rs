//! Resolution of human-readable names (logins, labels, milestones,
//! projects, teams) to node IDs.
//!
//! [`repo_metadata`] enumerates every candidate of the requested kinds;
//! [`repo_resolve_metadata_ids`] looks up a handful of names in one aliased
//! query. Both produce a [`RepoMetadataResult`] whose lookups fail on the
//! first unknown name. When several candidates compare equal ignoring case,
//! the first one in server order wins.

mod batch;
mod enumerate;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PullpoError, Result};

pub use batch::{repo_resolve_metadata_ids, RepoResolveInput, ResolveQuery, ResolveQueryBuilder};
pub use enumerate::{
    current_login, org_projects, org_projects_v2, org_teams, project_names_to_paths, repo_and_org_projects,
    repo_assignable_users, repo_labels, repo_metadata, repo_milestones, repo_projects, repo_projects_v2,
    viewer_projects_v2, MilestoneState, RepoMetadataInput,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    User,
    Team,
    Label,
    Milestone,
    ProjectV1,
    ProjectV2,
    Viewer,
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MetadataKind::User => "user",
            MetadataKind::Team => "team",
            MetadataKind::Label => "label",
            MetadataKind::Milestone => "milestone",
            MetadataKind::ProjectV1 | MetadataKind::ProjectV2 => "project",
            MetadataKind::Viewer => "viewer",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepoAssignee {
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl RepoAssignee {
    /// `login (Name)`, or just the login when the user has no display name.
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => format!("{} ({})", self.login, name),
            _ => self.login.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepoLabel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepoMilestone {
    pub id: String,
    pub title: String,
}

/// Classic (v1) project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepoProject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub number: u64,
    #[serde(rename = "resourcePath", default)]
    pub resource_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProjectV2 {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub number: u64,
    #[serde(rename = "resourcePath", default)]
    pub resource_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrgTeam {
    pub id: String,
    pub slug: String,
    /// Login of the owning organization; filled in by the resolver.
    #[serde(default)]
    pub organization: String,
}

/// Snapshot of resolvable metadata for one repository.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepoMetadataResult {
    pub current_login: String,
    pub assignable_users: Vec<RepoAssignee>,
    pub labels: Vec<RepoLabel>,
    pub projects: Vec<RepoProject>,
    pub projects_v2: Vec<ProjectV2>,
    pub milestones: Vec<RepoMilestone>,
    pub teams: Vec<OrgTeam>,
    /// Organization assumed for `/slug` team references.
    pub repo_owner: String,
}

fn eq_fold(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Resolve every name through `find`, stopping at the first miss.
fn resolve_all<S, F>(names: &[S], kind: MetadataKind, mut find: F) -> Result<Vec<String>>
where
    S: AsRef<str>,
    F: FnMut(&str) -> Option<String>,
{
    names
        .iter()
        .map(|name| find(name.as_ref()).ok_or_else(|| PullpoError::unresolved(kind, name.as_ref())))
        .collect()
}

impl RepoMetadataResult {
    pub fn members_to_ids<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>> {
        resolve_all(names, MetadataKind::User, |login| {
            self.assignable_users
                .iter()
                .find(|u| eq_fold(&u.login, login))
                .map(|u| u.id.clone())
        })
    }

    /// Teams are given as `ORG/slug`; `/slug` and bare `slug` refer to the
    /// repository owner's organization.
    pub fn teams_to_ids<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>> {
        resolve_all(names, MetadataKind::Team, |reference| {
            let (org, slug) = split_team(reference, &self.repo_owner);
            self.teams
                .iter()
                .find(|t| eq_fold(&t.slug, slug) && eq_fold(&t.organization, org))
                .map(|t| t.id.clone())
        })
    }

    pub fn labels_to_ids<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>> {
        resolve_all(names, MetadataKind::Label, |name| {
            self.labels
                .iter()
                .find(|l| eq_fold(&l.name, name))
                .map(|l| l.id.clone())
        })
    }

    /// Split project names into classic and v2 project IDs. A name matching a
    /// classic project never falls through to v2.
    pub fn projects_to_ids<S: AsRef<str>>(&self, names: &[S]) -> Result<(Vec<String>, Vec<String>)> {
        let mut v1 = Vec::new();
        let mut v2 = Vec::new();
        for name in names {
            let name = name.as_ref();
            if let Some(p) = self.projects.iter().find(|p| eq_fold(&p.name, name)) {
                v1.push(p.id.clone());
            } else if let Some(p) = self.projects_v2.iter().find(|p| eq_fold(&p.title, name)) {
                v2.push(p.id.clone());
            } else {
                return Err(PullpoError::unresolved(MetadataKind::ProjectV1, name));
            }
        }
        Ok((v1, v2))
    }

    pub fn milestone_to_id(&self, title: &str) -> Result<String> {
        self.milestones
            .iter()
            .find(|m| eq_fold(&m.title, title))
            .map(|m| m.id.clone())
            .ok_or_else(|| PullpoError::unresolved(MetadataKind::Milestone, title))
    }
}

pub(crate) fn split_team<'a>(reference: &'a str, default_org: &'a str) -> (&'a str, &'a str) {
    match reference.split_once('/') {
        Some(("", slug)) => (default_org, slug),
        Some((org, slug)) => (org, slug),
        None => (default_org, reference),
    }
}

/// Short path of a project: `OWNER/REPO/N`, `ORG/N` or `USER/N`.
pub fn project_path(resource_path: &str) -> Result<String> {
    let parts: Vec<&str> = resource_path.trim_start_matches('/').split('/').collect();
    match parts.as_slice() {
        ["orgs" | "users", owner, "projects", number] => Ok(format!("{owner}/{number}")),
        [owner, repo, "projects", number] => Ok(format!("{owner}/{repo}/{number}")),
        _ => Err(PullpoError::InvalidProjectPath(resource_path.to_string())),
    }
}

/// Paths of the named projects, in the order requested. Names match exactly;
/// classic projects are searched before v2 ones.
pub fn projects_to_paths<S: AsRef<str>>(
    projects: &[RepoProject],
    projects_v2: &[ProjectV2],
    names: &[S],
) -> Result<Vec<String>> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let resource_path = projects
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.resource_path.as_str())
                .or_else(|| {
                    projects_v2
                        .iter()
                        .find(|p| p.title == name)
                        .map(|p| p.resource_path.as_str())
                })
                .ok_or_else(|| PullpoError::unresolved(MetadataKind::ProjectV1, name))?;
            project_path(resource_path)
        })
        .collect()
}
