//! Typed caller-supplied options for CMIS operations.

use crate::params::{ParamValue, Params};
use crate::wire::{self, Ace};

/// Optional query parameters shared by the read operations.
///
/// Named fields cover the common browser-binding parameters; anything the
/// server understands beyond these goes through [`QueryOptions::extra`].
/// Fields are written into the parameter map in declaration order, extras
/// last, and the session writes operation keys after both, so an option can
/// never override a selector or an identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub filter: Option<String>,
    pub max_items: Option<i64>,
    pub skip_count: Option<i64>,
    pub order_by: Option<String>,
    pub rendition_filter: Option<String>,
    pub include_allowable_actions: Option<bool>,
    pub include_relationships: Option<String>,
    pub include_policy_ids: Option<bool>,
    pub include_acl: Option<bool>,
    pub succinct: Option<bool>,
    pub extra: Params,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a free-form parameter not covered by the named fields.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.extra.set(key, value);
        self
    }

    /// Overlays these options onto `params`, named fields first, extras last.
    pub fn apply_to(&self, params: &mut Params) {
        if let Some(filter) = &self.filter {
            params.set("filter", filter.as_str());
        }
        if let Some(max_items) = self.max_items {
            params.set("maxItems", max_items);
        }
        if let Some(skip_count) = self.skip_count {
            params.set("skipCount", skip_count);
        }
        if let Some(order_by) = &self.order_by {
            params.set("orderBy", order_by.as_str());
        }
        if let Some(rendition_filter) = &self.rendition_filter {
            params.set("renditionFilter", rendition_filter.as_str());
        }
        if let Some(value) = self.include_allowable_actions {
            params.set("includeAllowableActions", value);
        }
        if let Some(value) = &self.include_relationships {
            params.set("includeRelationships", value.as_str());
        }
        if let Some(value) = self.include_policy_ids {
            params.set("includePolicyIds", value);
        }
        if let Some(value) = self.include_acl {
            params.set("includeACL", value);
        }
        if let Some(value) = self.succinct {
            params.set("succinct", value);
        }
        params.merge(&self.extra);
    }
}

/// Side inputs for folder creation: policies to apply and ACL deltas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateFolderOptions {
    pub policies: Vec<String>,
    pub add_aces: Vec<Ace>,
    pub remove_aces: Vec<Ace>,
}

impl CreateFolderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the control fields into `params` using the browser-binding
    /// `policy[i]` / `addACE…` / `removeACE…` encoding.
    pub fn apply_to(&self, params: &mut Params) {
        wire::apply_policies(params, &self.policies);
        wire::apply_aces(params, "addACE", &self.add_aces);
        wire::apply_aces(params, "removeACE", &self.remove_aces);
    }
}
