use std::sync::OnceLock;

use regex::Regex;

fn link_re() -> &'static Regex {
    static LINK_RE: OnceLock<Regex> = OnceLock::new();
    LINK_RE.get_or_init(|| Regex::new(r#"<([^>]+)>;\s*rel="([^"]+)""#).expect("valid Link header pattern"))
}

/// URL of the `rel="next"` entry of a `Link` response header.
pub fn find_next_page(link: Option<&str>) -> Option<String> {
    link_re()
        .captures_iter(link?)
        .find(|c| &c[2] == "next")
        .map(|c| c[1].to_string())
}

/// Append `per_page=<n>` to a REST path unless the caller already set one,
/// either among `params` or in the path's own query string.
pub fn add_per_page(path: &str, per_page: u32, params: &[(String, String)]) -> String {
    if params.iter().any(|(k, _)| k == "per_page") {
        return path.to_string();
    }

    let separator = match path.split_once('?') {
        Some((_, query)) => {
            let has_per_page = url::form_urlencoded::parse(query.as_bytes())
                .any(|(k, v)| k == "per_page" && !v.is_empty());
            if has_per_page {
                return path.to_string();
            }
            '&'
        }
        None => '?',
    };

    format!("{path}{separator}per_page={per_page}")
}
