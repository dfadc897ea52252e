use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use pullpo::features::{Detector, HostCapabilities};
use pullpo::query_builder::Capabilities;
use pullpo::{ApiClient, HttpTransport};

use crate::config::Config;
use crate::output::{self, flag};

#[derive(Serialize)]
struct FeatureItem {
    group: &'static str,
    feature: &'static str,
    supported: bool,
}

#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "Group")]
    group: &'static str,
    #[tabled(rename = "Feature")]
    feature: &'static str,
    #[tabled(rename = "Supported")]
    supported: String,
}

impl From<&FeatureItem> for FeatureRow {
    fn from(item: &FeatureItem) -> Self {
        Self {
            group: item.group,
            feature: item.feature,
            supported: flag(item.supported),
        }
    }
}

fn items(c: &Capabilities) -> Vec<FeatureItem> {
    let item = |group, feature, supported| FeatureItem {
        group,
        feature,
        supported,
    };
    vec![
        item("issue", "stateReason", c.issue.state_reason),
        item("pull request", "mergeQueue", c.pull_request.merge_queue),
        item(
            "pull request",
            "checkRunAndStatusContextCounts",
            c.pull_request.check_run_and_status_context_counts,
        ),
        item("pull request", "checkRunEvent", c.pull_request.check_run_event),
        item("repository", "pullRequestTemplates", c.repository.pull_request_template_query),
        item("repository", "visibility", c.repository.visibility_field),
        item("repository", "autoMergeAllowed", c.repository.auto_merge),
    ]
}

pub async fn run(config: &Config, hostname: Option<&str>) -> Result<()> {
    let host = config.resolve_host(hostname);

    // Probing works unauthenticated on hosts that allow it.
    let transport = match config.token(&host) {
        Ok(token) => HttpTransport::new().with_token(&host, token),
        Err(_) => HttpTransport::new(),
    };
    let client = ApiClient::new(transport);
    let cache = HostCapabilities::new();
    let detector = Detector::new(&client, &host, &cache);

    let capabilities = Capabilities::detect(&detector).await;
    output::print_message(&format!("Schema features for {host}"));
    output::print_table(&items(&capabilities), |item| FeatureRow::from(item));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_rows() {
        let all = items(&Capabilities::ALL);
        assert_eq!(all.len(), 7);
        assert!(all.iter().all(|item| item.supported));

        let none = items(&Capabilities::default());
        let rows: Vec<FeatureRow> = none.iter().map(|item| FeatureRow::from(item)).collect();
        assert_eq!(rows[0].group, "issue");
        assert_eq!(rows[0].feature, "stateReason");
        assert!(rows.iter().all(|row| row.supported == flag(false)));
    }
}
