//! Browser-binding wire constants and access-control encoding.
//!
//! Read operations are discriminated by `cmisselector`, writes by
//! `cmisaction`; the string values live here so the session layer never
//! spells them inline.

use crate::params::Params;

/// Parameter key carrying the read-operation discriminator.
pub const SELECTOR_KEY: &str = "cmisselector";
/// Parameter key carrying the write-operation discriminator.
pub const ACTION_KEY: &str = "cmisaction";

/// `cmisselector` values for the read operations.
pub mod selector {
    pub const OBJECT: &str = "object";
    pub const REPOSITORY_INFO: &str = "repositoryInfo";
    pub const TYPE_CHILDREN: &str = "typeChildren";
    pub const TYPE_DESCENDANTS: &str = "typeDescendants";
    pub const TYPE_DEFINITION: &str = "typeDefinition";
    pub const CHECKED_OUT: &str = "checkedOut";
    pub const CONTENT_CHANGES: &str = "contentChanges";
}

/// `cmisaction` values for the write operations.
pub mod action {
    pub const CREATE_FOLDER: &str = "createFolder";
    pub const DELETE: &str = "delete";
    pub const QUERY: &str = "query";
}

/// Well-known CMIS property ids and type ids.
pub mod property {
    pub const NAME: &str = "cmis:name";
    pub const OBJECT_TYPE_ID: &str = "cmis:objectTypeId";
    pub const FOLDER_TYPE: &str = "cmis:folder";
}

/// One access-control entry: a principal and the permissions granted to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ace {
    pub principal: String,
    pub permissions: Vec<String>,
}

impl Ace {
    pub fn new(
        principal: impl Into<String>,
        permissions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            principal: principal.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Writes `policy[i]` fields for each policy id.
pub fn apply_policies(params: &mut Params, policies: &[String]) {
    for (index, policy) in policies.iter().enumerate() {
        params.set(format!("policy[{index}]"), policy.as_str());
    }
}

/// Writes `{prefix}Principal[i]` / `{prefix}Permission[i][j]` fields for each
/// entry, `prefix` being `addACE` or `removeACE`.
pub fn apply_aces(params: &mut Params, prefix: &str, aces: &[Ace]) {
    for (index, ace) in aces.iter().enumerate() {
        params.set(format!("{prefix}Principal[{index}]"), ace.principal.as_str());
        for (sub, permission) in ace.permissions.iter().enumerate() {
            params.set(
                format!("{prefix}Permission[{index}][{sub}]"),
                permission.as_str(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn policies_are_indexed() {
        let mut params = Params::new();
        apply_policies(&mut params, &["p1".to_string(), "p2".to_string()]);
        assert_eq!(params.get("policy[0]"), Some(&ParamValue::Str("p1".into())));
        assert_eq!(params.get("policy[1]"), Some(&ParamValue::Str("p2".into())));
    }

    #[test]
    fn aces_nest_permission_indices_under_the_principal() {
        let mut params = Params::new();
        let aces = vec![
            Ace::new("alice", ["cmis:read", "cmis:write"]),
            Ace::new("bob", ["cmis:read"]),
        ];
        apply_aces(&mut params, "addACE", &aces);

        assert_eq!(
            params.get("addACEPrincipal[0]"),
            Some(&ParamValue::Str("alice".into()))
        );
        assert_eq!(
            params.get("addACEPermission[0][1]"),
            Some(&ParamValue::Str("cmis:write".into()))
        );
        assert_eq!(
            params.get("addACEPrincipal[1]"),
            Some(&ParamValue::Str("bob".into()))
        );
        assert_eq!(
            params.get("addACEPermission[1][0]"),
            Some(&ParamValue::Str("cmis:read".into()))
        );
        assert!(params.get("addACEPermission[1][1]").is_none());
    }
}
