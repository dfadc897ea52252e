//! Host classification and API endpoint construction.

pub const DEFAULT_HOST: &str = "github.com";
const LOCALHOST: &str = "github.localhost";
const TENANCY_SUFFIX: &str = ".ghe.com";

/// Lowercase a host name and fold subdomains of the public service, the
/// local development host and tenancy hosts onto their base host. Other
/// hosts keep every label.
pub fn normalize_hostname(host: &str) -> String {
    let host = host.trim().to_lowercase();
    if host == DEFAULT_HOST || host.ends_with(".github.com") {
        return DEFAULT_HOST.to_string();
    }
    if host == LOCALHOST || host.ends_with(".github.localhost") {
        return LOCALHOST.to_string();
    }
    if host.ends_with(TENANCY_SUFFIX) {
        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() > 3 {
            return labels[labels.len() - 3..].join(".");
        }
    }
    host
}

pub fn is_tenancy(host: &str) -> bool {
    normalize_hostname(host).ends_with(TENANCY_SUFFIX)
}

/// Anything other than the public service, its local development host, or a
/// tenancy host is treated as a self-hosted instance with a possibly older schema.
pub fn is_enterprise(host: &str) -> bool {
    let host = normalize_hostname(host);
    host != DEFAULT_HOST && host != LOCALHOST && !host.ends_with(TENANCY_SUFFIX)
}

pub fn graphql_url(host: &str) -> String {
    let host = normalize_hostname(host);
    if host == LOCALHOST {
        "http://api.github.localhost/graphql".to_string()
    } else if is_enterprise(&host) {
        format!("https://{host}/api/graphql")
    } else {
        format!("https://api.{host}/graphql")
    }
}

pub fn rest_prefix(host: &str) -> String {
    let host = normalize_hostname(host);
    if host == LOCALHOST {
        "http://api.github.localhost/".to_string()
    } else if is_enterprise(&host) {
        format!("https://{host}/api/v3/")
    } else {
        format!("https://api.{host}/")
    }
}

/// Full URLs (such as next-page links) pass through unchanged.
pub fn rest_url(host: &str, path: &str) -> String {
    if path.starts_with("https://") || path.starts_with("http://") {
        return path.to_string();
    }
    format!("{}{}", rest_prefix(host), path.trim_start_matches('/'))
}
