//! Shared GraphQL response envelopes.

use serde::Deserialize;

/// A connection's `nodes` list. Missing or null `nodes` decode as empty.
#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Connection<T> {
    #[serde(default = "Vec::new", deserialize_with = "nullable_vec")]
    pub nodes: Vec<T>,
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize, Debug)]
pub struct RepositoryData<C> {
    pub repository: Option<C>,
}

#[derive(Deserialize, Debug)]
pub struct OrganizationData<C> {
    pub organization: Option<C>,
}

#[derive(Deserialize, Debug)]
pub struct ViewerData<C> {
    pub viewer: C,
}

#[derive(Deserialize, Debug)]
pub struct Login {
    pub login: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_null_nodes() {
        let c: Connection<Login> = serde_json::from_str(r#"{"nodes":null}"#).unwrap();
        assert!(c.nodes.is_empty());
        let c: Connection<Login> = serde_json::from_str("{}").unwrap();
        assert!(c.nodes.is_empty());
        let c: Connection<Login> = serde_json::from_str(r#"{"nodes":[{"login":"hubot"}]}"#).unwrap();
        assert_eq!(c.nodes[0].login, "hubot");
    }
}
