//! Repository descriptors advertised by the server during discovery.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// One server-advertised repository and its key endpoint URLs.
///
/// Only the three fields the client navigates by are modeled; everything
/// else the server sends (product name, capabilities, …) is kept verbatim
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub repository_id: String,
    pub root_folder_url: String,
    pub repository_url: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// The full discovery result, in server-provided order.
///
/// The browser binding returns a JSON object keyed by repository id. Object
/// key order is meaningful here: the first entry becomes the session's
/// default repository, so deserialization goes through a map visitor that
/// keeps document order instead of a rehashing collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Repositories {
    entries: Vec<(String, Repository)>,
}

impl Repositories {
    /// The first descriptor in server order, if any.
    pub fn first(&self) -> Option<&Repository> {
        self.entries.first().map(|(_, repository)| repository)
    }

    /// Looks a repository up by the id it was keyed under.
    pub fn get(&self, id: &str) -> Option<&Repository> {
        self.entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, repository)| repository)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Repository)> {
        self.entries
            .iter()
            .map(|(id, repository)| (id.as_str(), repository))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }
}

impl<'de> Deserialize<'de> for Repositories {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RepositoriesVisitor;

        impl<'de> Visitor<'de> for RepositoriesVisitor {
            type Value = Repositories;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of repository descriptors keyed by repository id")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((id, repository)) = map.next_entry::<String, Repository>()? {
                    entries.push((id, repository));
                }
                Ok(Repositories { entries })
            }
        }

        deserializer.deserialize_map(RepositoriesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(id: &str) -> Value {
        json!({
            "repositoryId": id,
            "rootFolderUrl": format!("http://cmis.example/{id}/root"),
            "repositoryUrl": format!("http://cmis.example/{id}"),
            "productName": "Test Server",
        })
    }

    #[test]
    fn deserializes_in_document_order() {
        let body = json!({
            "B": descriptor("B"),
            "A": descriptor("A"),
        });

        let repositories: Repositories = serde_json::from_value(body).unwrap();
        let ids: Vec<&str> = repositories.ids().collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(repositories.first().unwrap().repository_id, "B");
    }

    #[test]
    fn unmodeled_fields_land_in_extra() {
        let repository: Repository = serde_json::from_value(descriptor("A")).unwrap();
        assert_eq!(repository.repository_id, "A");
        assert_eq!(
            repository.extra.get("productName"),
            Some(&Value::String("Test Server".to_string()))
        );
    }

    #[test]
    fn lookup_by_key() {
        let body = json!({"A": descriptor("A"), "B": descriptor("B")});
        let repositories: Repositories = serde_json::from_value(body).unwrap();
        assert_eq!(repositories.get("B").unwrap().repository_id, "B");
        assert!(repositories.get("C").is_none());
    }

    #[test]
    fn empty_map_is_a_valid_result() {
        let repositories: Repositories = serde_json::from_value(json!({})).unwrap();
        assert!(repositories.is_empty());
        assert!(repositories.first().is_none());
    }

    #[test]
    fn non_map_payload_is_rejected() {
        let result: Result<Repositories, _> = serde_json::from_value(json!(["A"]));
        assert!(result.is_err());
    }
}
