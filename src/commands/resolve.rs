use anyhow::{Context, Result};
use serde::Serialize;
use tabled::Tabled;

use pullpo::metadata::{
    self, projects_to_paths, RepoMetadataInput, RepoMetadataResult, RepoResolveInput,
};
use pullpo::{ApiClient, HttpTransport, RepoRef};

use crate::cli::ResolveArgs;
use crate::config::Config;
use crate::output;

#[derive(Debug, Serialize)]
struct Resolved {
    kind: &'static str,
    name: String,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

#[derive(Tabled)]
struct ResolvedRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Path")]
    path: String,
}

impl From<&Resolved> for ResolvedRow {
    fn from(r: &Resolved) -> Self {
        Self {
            kind: r.kind,
            name: r.name.clone(),
            id: output::id(&r.id),
            path: r.path.clone().unwrap_or_default(),
        }
    }
}

/// Replace `@me` with the authenticated user's login.
async fn expand_me(client: &ApiClient<HttpTransport>, host: &str, logins: &mut [String]) -> Result<()> {
    if !logins.iter().any(|l| l == "@me") {
        return Ok(());
    }
    let me = metadata::current_login(client, host).await?;
    for login in logins.iter_mut().filter(|l| *l == "@me") {
        *login = me.clone();
    }
    Ok(())
}

fn rows<'a>(
    kind: &'static str,
    names: &'a [String],
    ids: Vec<String>,
) -> impl Iterator<Item = Resolved> + 'a {
    names.iter().zip(ids).map(move |(name, id)| Resolved {
        kind,
        name: name.clone(),
        id,
        path: None,
    })
}

fn collect(args: &ResolveArgs, result: &RepoMetadataResult) -> Result<Vec<Resolved>> {
    let (teams, users): (Vec<String>, Vec<String>) =
        args.reviewer.iter().cloned().partition(|r| r.contains('/'));

    let mut resolved = Vec::new();
    resolved.extend(rows("assignee", &args.assignee, result.members_to_ids(&args.assignee)?));
    resolved.extend(rows("reviewer", &users, result.members_to_ids(&users)?));
    resolved.extend(rows("team", &teams, result.teams_to_ids(&teams)?));
    resolved.extend(rows("label", &args.label, result.labels_to_ids(&args.label)?));

    if let Some(title) = &args.milestone {
        resolved.push(Resolved {
            kind: "milestone",
            name: title.clone(),
            id: result.milestone_to_id(title)?,
            path: None,
        });
    }

    if !args.project.is_empty() {
        let (v1, v2) = result.projects_to_ids(&args.project)?;
        let mut v1 = v1.into_iter();
        let mut v2 = v2.into_iter();
        for name in &args.project {
            let classic = result.projects.iter().any(|p| p.name.to_lowercase() == name.to_lowercase());
            let (kind, id) = if classic {
                ("project", v1.next())
            } else {
                ("project (v2)", v2.next())
            };
            resolved.push(Resolved {
                kind,
                name: name.clone(),
                id: id.unwrap_or_default(),
                path: projects_to_paths(&result.projects, &result.projects_v2, &[name])
                    .ok()
                    .and_then(|paths| paths.into_iter().next()),
            });
        }
    }

    Ok(resolved)
}

pub async fn run(config: &Config, mut args: ResolveArgs) -> Result<()> {
    let repo = RepoRef::from_full_name_with_host(&args.repo, &config.resolve_host(None))?;
    let client = ApiClient::new(config.transport(repo.host())?);

    expand_me(&client, repo.host(), &mut args.assignee).await?;
    expand_me(&client, repo.host(), &mut args.reviewer).await?;

    let enumerate = args.enumerate || args.milestone.is_some() || !args.project.is_empty();
    let result = if enumerate {
        let input = RepoMetadataInput {
            assignees: !args.assignee.is_empty(),
            reviewers: !args.reviewer.is_empty(),
            labels: !args.label.is_empty(),
            projects: !args.project.is_empty(),
            milestones: args.milestone.is_some(),
        };
        metadata::repo_metadata(&client, &repo, &input).await
    } else {
        let input = RepoResolveInput {
            assignees: args.assignee.clone(),
            reviewers: args.reviewer.clone(),
            labels: args.label.clone(),
        };
        metadata::repo_resolve_metadata_ids(&client, &repo, &input).await
    }
    .with_context(|| format!("failed to resolve metadata for {repo}"))?;

    let resolved = collect(&args, &result)?;
    if resolved.is_empty() {
        output::print_message("Nothing to resolve");
        return Ok(());
    }
    output::print_table(&resolved, |r| ResolvedRow::from(r));

    Ok(())
}

#[cfg(test)]
mod tests {
    use pullpo::metadata::{OrgTeam, ProjectV2, RepoAssignee, RepoLabel, RepoProject};

    use super::*;

    fn args() -> ResolveArgs {
        ResolveArgs {
            repo: "OWNER/REPO".to_string(),
            assignee: vec!["monalisa".to_string()],
            reviewer: vec!["OWNER/core".to_string(), "hubot".to_string()],
            label: vec!["bug".to_string()],
            milestone: None,
            project: vec!["Roadmap".to_string(), "Triage".to_string()],
            enumerate: false,
        }
    }

    fn result() -> RepoMetadataResult {
        RepoMetadataResult {
            assignable_users: vec![
                RepoAssignee {
                    id: "MONAID".to_string(),
                    login: "MonaLisa".to_string(),
                    name: None,
                },
                RepoAssignee {
                    id: "HUBOTID".to_string(),
                    login: "hubot".to_string(),
                    name: None,
                },
            ],
            labels: vec![RepoLabel {
                id: "BUGID".to_string(),
                name: "bug".to_string(),
            }],
            teams: vec![OrgTeam {
                id: "COREID".to_string(),
                slug: "core".to_string(),
                organization: "OWNER".to_string(),
            }],
            projects: vec![RepoProject {
                id: "ROADMAPID".to_string(),
                name: "Roadmap".to_string(),
                number: 2,
                resource_path: "/OWNER/REPO/projects/2".to_string(),
            }],
            projects_v2: vec![ProjectV2 {
                id: "TRIAGEID".to_string(),
                title: "Triage".to_string(),
                number: 1,
                resource_path: "/orgs/OWNER/projects/1".to_string(),
            }],
            repo_owner: "OWNER".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_collect_rows() {
        let resolved = collect(&args(), &result()).unwrap();
        let summary: Vec<(&str, &str, &str)> = resolved
            .iter()
            .map(|r| (r.kind, r.name.as_str(), r.id.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("assignee", "monalisa", "MONAID"),
                ("reviewer", "hubot", "HUBOTID"),
                ("team", "OWNER/core", "COREID"),
                ("label", "bug", "BUGID"),
                ("project", "Roadmap", "ROADMAPID"),
                ("project (v2)", "Triage", "TRIAGEID"),
            ]
        );
        assert_eq!(resolved[4].path.as_deref(), Some("OWNER/REPO/2"));
        assert_eq!(resolved[5].path.as_deref(), Some("OWNER/1"));
    }

    #[test]
    fn test_rows_pair_names_with_ids() {
        let names = vec!["bug".to_string(), "docs".to_string()];
        let resolved: Vec<Resolved> = rows("label", &names, vec!["BUGID".to_string(), "DOCSID".to_string()]).collect();
        assert_eq!(resolved.len(), 2);
        assert_eq!((resolved[1].kind, resolved[1].name.as_str(), resolved[1].id.as_str()), ("label", "docs", "DOCSID"));
        assert!(resolved.iter().all(|r| r.path.is_none()));

        let table: Vec<ResolvedRow> = resolved.iter().map(|r| ResolvedRow::from(r)).collect();
        assert_eq!(table[0].name, "bug");
        assert_eq!(table[0].path, "");
    }

    #[test]
    fn test_collect_fails_on_unknown_label() {
        let mut args = args();
        args.label.push("nope".to_string());
        let err = collect(&args, &result()).unwrap_err();
        assert!(err.to_string().contains("could not resolve label 'nope'"));
    }
}
