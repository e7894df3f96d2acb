//! Session: repository connection state and one method per CMIS operation.
//!
//! A [`Session`] holds the base URL, authentication, the `succinct=true`
//! default parameters, and the repositories discovered by
//! [`Session::load_repositories`]. Each operation merges the session
//! defaults with caller options, writes its own selector/action and
//! identifiers last, and hands the built call to the transport, returning a
//! [`CmisRequest`] immediately.
//!
//! Auth and repository state are read at call-issuance time only; mutating
//! them later does not affect an in-flight request. Operations spawn onto
//! the ambient tokio runtime and never block the caller.

use crate::error::{Error, Result};
use crate::request::{CmisRequest, Fallbacks, Outcome};
use crate::transport::{ReqwestTransport, Transport};
use cmis_protocol::wire::{self, action, property, selector};
use cmis_protocol::{
    Auth, CmisResponse, CreateFolderOptions, HttpCall, Method, Params, Properties, QueryOptions,
    Repositories, Repository,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Construction-time configuration for a session.
///
/// Carries the session-wide fallback handlers used by any request that does
/// not get an explicit handler attached for the channel that fired. Both
/// default to doing nothing, so failures are silently swallowed unless the
/// caller or the session opts in.
#[derive(Clone, Default)]
pub struct SessionConfig {
    fallbacks: Fallbacks,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fallback for well-formed non-2xx responses.
    pub fn on_not_ok(mut self, handler: impl Fn(&CmisResponse) + Send + Sync + 'static) -> Self {
        self.fallbacks.not_ok = Some(Arc::new(handler));
        self
    }

    /// Fallback for transport and client-side failures.
    pub fn on_error(mut self, handler: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.fallbacks.error = Some(Arc::new(handler));
        self
    }
}

struct SessionState {
    token: Option<String>,
    credentials: Option<(String, String)>,
    defaults: Params,
    repositories: Option<Repositories>,
    default_repository: Option<Repository>,
}

struct SessionInner {
    base_url: String,
    transport: Arc<dyn Transport>,
    fallbacks: Fallbacks,
    state: Mutex<SessionState>,
}

/// Cheaply cloneable handle to one CMIS connection.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Connects to `base_url` over the default reqwest transport.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(base_url, SessionConfig::new())
    }

    pub fn with_config(base_url: impl Into<String>, config: SessionConfig) -> Self {
        Self::with_transport(base_url, Arc::new(ReqwestTransport::new()), config)
    }

    /// Uses a caller-supplied transport, e.g. a preconfigured
    /// [`ReqwestTransport::with_client`] or a fake in tests.
    pub fn with_transport(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        config: SessionConfig,
    ) -> Self {
        let mut defaults = Params::new();
        defaults.set("succinct", true);
        Self {
            inner: Arc::new(SessionInner {
                base_url: base_url.into(),
                transport,
                fallbacks: config.fallbacks,
                state: Mutex::new(SessionState {
                    token: None,
                    credentials: None,
                    defaults,
                    repositories: None,
                    default_repository: None,
                }),
            }),
        }
    }

    /// Sets the bearer token attached to subsequent calls.
    ///
    /// Token and basic credentials are independent; when both are set the
    /// token wins.
    pub fn set_token(&self, token: impl Into<String>) -> &Self {
        self.inner.state.lock().token = Some(token.into());
        self
    }

    /// Sets basic-auth credentials attached to subsequent calls.
    pub fn set_credentials(&self, username: impl Into<String>, password: impl Into<String>) -> &Self {
        self.inner.state.lock().credentials = Some((username.into(), password.into()));
        self
    }

    /// The repositories discovered by the last [`Session::load_repositories`].
    pub fn repositories(&self) -> Option<Repositories> {
        self.inner.state.lock().repositories.clone()
    }

    /// The repository operations currently target.
    pub fn default_repository(&self) -> Option<Repository> {
        self.inner.state.lock().default_repository.clone()
    }

    /// Switches the default repository to a discovered one by id.
    pub fn select_repository(&self, id: &str) -> Result<()> {
        let mut state = self.inner.state.lock();
        let repository = state
            .repositories
            .as_ref()
            .and_then(|repositories| repositories.get(id))
            .cloned()
            .ok_or_else(|| Error::UnknownRepository(id.to_string()))?;
        state.default_repository = Some(repository);
        Ok(())
    }

    /// Discovers the repositories advertised at the base URL.
    ///
    /// On success the full set is stored in server-provided order and the
    /// first entry becomes the default repository; both happen before any
    /// `ok` continuation attached to the returned request runs. A 2xx body
    /// that is not a descriptor map resolves the request with
    /// [`Error::Payload`]. Non-2xx and transport failures leave the stored
    /// state untouched.
    pub fn load_repositories(&self) -> CmisRequest {
        let (params, auth) = {
            let state = self.inner.state.lock();
            (state.defaults.clone(), auth_of(&state))
        };
        let call = HttpCall {
            method: Method::Get,
            url: self.inner.base_url.clone(),
            params,
            auth,
        };
        debug!(url = %call.url, "loading repositories");

        let (request, completer) = CmisRequest::pending(self.inner.fallbacks.clone());
        let transport = Arc::clone(&self.inner.transport);
        let session = self.clone();
        tokio::spawn(async move {
            let outcome = match transport.execute(call).await {
                Ok(response) if response.is_ok() => {
                    match serde_json::from_value::<Repositories>(response.body.clone()) {
                        Ok(repositories) => {
                            let count = repositories.len();
                            {
                                let mut state = session.inner.state.lock();
                                state.default_repository = repositories.first().cloned();
                                state.repositories = Some(repositories);
                            }
                            debug!(count, "discovered repositories");
                            Outcome::Ok(response)
                        }
                        Err(error) => Outcome::Failed(Error::Payload(error.to_string())),
                    }
                }
                Ok(response) => Outcome::NotOk(response),
                Err(error) => Outcome::Failed(error),
            };
            completer.complete(outcome);
        });
        request
    }

    /// Gets an object by id.
    ///
    /// Requires a default repository; resolves with [`Error::NoRepository`]
    /// otherwise, as does every other repository-targeting operation.
    pub fn get_object(&self, object_id: &str, options: Option<QueryOptions>) -> CmisRequest {
        let repository = match self.require_repository() {
            Ok(repository) => repository,
            Err(error) => return self.failed(error),
        };
        let mut params = self.merged(options.as_ref());
        params.set("objectId", object_id);
        params.set(wire::SELECTOR_KEY, selector::OBJECT);
        self.get(repository.root_folder_url, params)
    }

    /// Gets an object by its path under the repository root folder.
    pub fn get_object_by_path(&self, path: &str, options: Option<QueryOptions>) -> CmisRequest {
        let repository = match self.require_repository() {
            Ok(repository) => repository,
            Err(error) => return self.failed(error),
        };
        let mut params = self.merged(options.as_ref());
        params.set(wire::SELECTOR_KEY, selector::OBJECT);
        let url = join_path(&repository.root_folder_url, path);
        self.get(url, params)
    }

    /// Creates a folder under `parent_id`.
    ///
    /// `input` is either a bare name (wrapped into a `cmis:name` property)
    /// or a full property set; `cmis:objectTypeId` defaults to `cmis:folder`
    /// when absent.
    pub fn create_folder(&self, parent_id: &str, input: impl Into<Properties>) -> CmisRequest {
        self.create_folder_with(parent_id, input, CreateFolderOptions::default())
    }

    /// [`Session::create_folder`] with policies and ACL deltas.
    pub fn create_folder_with(
        &self,
        parent_id: &str,
        input: impl Into<Properties>,
        options: CreateFolderOptions,
    ) -> CmisRequest {
        let repository = match self.require_repository() {
            Ok(repository) => repository,
            Err(error) => return self.failed(error),
        };
        let mut properties = input.into();
        if !properties.contains(property::OBJECT_TYPE_ID) {
            properties.set(property::OBJECT_TYPE_ID, property::FOLDER_TYPE);
        }
        let mut params = self.merged(None);
        properties.apply_to(&mut params);
        options.apply_to(&mut params);
        params.set("repositoryId", repository.repository_id.as_str());
        params.set(wire::ACTION_KEY, action::CREATE_FOLDER);
        params.set("objectId", parent_id);
        self.post(repository.root_folder_url, params)
    }

    /// Deletes an object, all versions of it when `all_versions` is true.
    pub fn delete_object(&self, object_id: &str, all_versions: bool) -> CmisRequest {
        let repository = match self.require_repository() {
            Ok(repository) => repository,
            Err(error) => return self.failed(error),
        };
        let mut params = self.merged(None);
        params.set("repositoryId", repository.repository_id.as_str());
        params.set(wire::ACTION_KEY, action::DELETE);
        params.set("objectId", object_id);
        params.set("allVersions", all_versions);
        self.post(repository.root_folder_url, params)
    }

    pub fn get_repository_info(&self, options: Option<QueryOptions>) -> CmisRequest {
        let repository = match self.require_repository() {
            Ok(repository) => repository,
            Err(error) => return self.failed(error),
        };
        let mut params = self.merged(options.as_ref());
        params.set(wire::SELECTOR_KEY, selector::REPOSITORY_INFO);
        self.get(repository.repository_url, params)
    }

    /// Gets the immediate children of `type_id`, or the base types when no
    /// type id is given.
    pub fn get_type_children(
        &self,
        type_id: Option<&str>,
        include_property_definitions: Option<bool>,
        options: Option<QueryOptions>,
    ) -> CmisRequest {
        let repository = match self.require_repository() {
            Ok(repository) => repository,
            Err(error) => return self.failed(error),
        };
        let mut params = self.merged(options.as_ref());
        if let Some(type_id) = type_id {
            params.set("typeId", type_id);
        }
        if let Some(value) = include_property_definitions {
            params.set("includePropertyDefinitions", value);
        }
        params.set(wire::SELECTOR_KEY, selector::TYPE_CHILDREN);
        self.get(repository.repository_url, params)
    }

    /// Gets all types descended from `type_id`, or every type in the
    /// repository when no type id is given. `depth` defaults to 1.
    pub fn get_type_descendants(
        &self,
        type_id: Option<&str>,
        depth: Option<i64>,
        include_property_definitions: Option<bool>,
        options: Option<QueryOptions>,
    ) -> CmisRequest {
        let repository = match self.require_repository() {
            Ok(repository) => repository,
            Err(error) => return self.failed(error),
        };
        let mut params = self.merged(options.as_ref());
        if let Some(type_id) = type_id {
            params.set("typeId", type_id);
        }
        params.set("depth", depth.unwrap_or(1));
        if let Some(value) = include_property_definitions {
            params.set("includePropertyDefinitions", value);
        }
        params.set(wire::SELECTOR_KEY, selector::TYPE_DESCENDANTS);
        self.get(repository.repository_url, params)
    }

    pub fn get_type_definition(&self, type_id: &str, options: Option<QueryOptions>) -> CmisRequest {
        let repository = match self.require_repository() {
            Ok(repository) => repository,
            Err(error) => return self.failed(error),
        };
        let mut params = self.merged(options.as_ref());
        params.set("typeId", type_id);
        params.set(wire::SELECTOR_KEY, selector::TYPE_DEFINITION);
        self.get(repository.repository_url, params)
    }

    /// Gets the documents checked out in the repository, optionally scoped
    /// to one folder.
    pub fn get_checked_out_docs(
        &self,
        object_id: Option<&str>,
        options: Option<QueryOptions>,
    ) -> CmisRequest {
        let repository = match self.require_repository() {
            Ok(repository) => repository,
            Err(error) => return self.failed(error),
        };
        let mut params = self.merged(options.as_ref());
        if let Some(object_id) = object_id {
            params.set("objectId", object_id);
        }
        params.set(wire::SELECTOR_KEY, selector::CHECKED_OUT);
        self.get(repository.repository_url, params)
    }

    /// Gets the change log, starting from `change_log_token` when given.
    pub fn get_content_changes(
        &self,
        change_log_token: Option<&str>,
        include_properties: bool,
        include_policy_ids: bool,
        include_acl: bool,
        options: Option<QueryOptions>,
    ) -> CmisRequest {
        let repository = match self.require_repository() {
            Ok(repository) => repository,
            Err(error) => return self.failed(error),
        };
        let mut params = self.merged(options.as_ref());
        if let Some(token) = change_log_token {
            params.set("changeLogToken", token);
        }
        params.set("includeProperties", include_properties);
        params.set("includePolicyIds", include_policy_ids);
        params.set("includeACL", include_acl);
        params.set(wire::SELECTOR_KEY, selector::CONTENT_CHANGES);
        self.get(repository.repository_url, params)
    }

    /// Runs a CMIS query statement against the repository.
    pub fn query(
        &self,
        statement: &str,
        search_all_versions: bool,
        options: Option<QueryOptions>,
    ) -> CmisRequest {
        let repository = match self.require_repository() {
            Ok(repository) => repository,
            Err(error) => return self.failed(error),
        };
        let mut params = self.merged(options.as_ref());
        params.set(wire::ACTION_KEY, action::QUERY);
        params.set("statement", statement);
        params.set("searchAllversions", search_all_versions);
        self.post(repository.repository_url, params)
    }

    // Operations below exist in the CMIS specification but are not
    // implemented by this client. Each resolves immediately with
    // `Error::Unsupported` so misuse is loud, never a silent no-op.

    /// Not yet implemented.
    pub fn create_document(&self) -> CmisRequest {
        self.unsupported("createDocument")
    }

    /// Not yet implemented.
    pub fn create_document_from_source(&self) -> CmisRequest {
        self.unsupported("createDocumentFromSource")
    }

    /// Not yet implemented.
    pub fn create_relationship(&self) -> CmisRequest {
        self.unsupported("createRelationship")
    }

    /// Not yet implemented.
    pub fn create_policy(&self) -> CmisRequest {
        self.unsupported("createPolicy")
    }

    /// Not yet implemented.
    pub fn create_item(&self) -> CmisRequest {
        self.unsupported("createItem")
    }

    /// Not yet implemented.
    pub fn bulk_update_properties(&self) -> CmisRequest {
        self.unsupported("bulkUpdateProperties")
    }

    /// Not yet implemented.
    pub fn create_type(&self, _type: Value, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("createType")
    }

    /// Not yet implemented.
    pub fn update_type(&self, _type: Value, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("updateType")
    }

    /// Not yet implemented.
    pub fn delete_type(&self, _type_id: &str, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("deleteType")
    }

    /// Not yet implemented.
    pub fn get_last_result(&self, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("getLastResult")
    }

    /// Not yet implemented.
    pub fn get_children(&self, _object_id: &str, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("getChildren")
    }

    /// Not yet implemented.
    pub fn get_descendants(&self, _object_id: &str, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("getDescendants")
    }

    /// Not yet implemented.
    pub fn get_folder_tree(&self, _object_id: &str, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("getFolderTree")
    }

    /// Not yet implemented.
    pub fn get_folder_parent(&self, _object_id: &str, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("getFolderParent")
    }

    /// Not yet implemented.
    pub fn get_object_parents(&self, _object_id: &str, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("getObjectParents")
    }

    /// Not yet implemented.
    pub fn get_allowable_actions(
        &self,
        _object_id: &str,
        _options: Option<QueryOptions>,
    ) -> CmisRequest {
        self.unsupported("getAllowableActions")
    }

    /// Not yet implemented.
    pub fn get_properties(&self, _object_id: &str, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("getProperties")
    }

    /// Not yet implemented.
    pub fn get_content_stream(
        &self,
        _stream_id: &str,
        _download: bool,
        _options: Option<QueryOptions>,
    ) -> CmisRequest {
        self.unsupported("getContentStream")
    }

    /// Not yet implemented.
    pub fn get_renditions(
        &self,
        _rendition_filter: &str,
        _options: Option<QueryOptions>,
    ) -> CmisRequest {
        self.unsupported("getRenditions")
    }

    /// Not yet implemented.
    pub fn update_properties(
        &self,
        _properties: Properties,
        _options: Option<QueryOptions>,
    ) -> CmisRequest {
        self.unsupported("updateProperties")
    }

    /// Not yet implemented.
    pub fn move_object(
        &self,
        _target_id: &str,
        _source_id: &str,
        _options: Option<QueryOptions>,
    ) -> CmisRequest {
        self.unsupported("moveObject")
    }

    /// Not yet implemented.
    pub fn delete_tree(&self, _object_id: &str) -> CmisRequest {
        self.unsupported("deleteTree")
    }

    /// Not yet implemented.
    pub fn set_content_stream(&self, _object_id: &str) -> CmisRequest {
        self.unsupported("setContentStream")
    }

    /// Not yet implemented.
    pub fn append_content_stream(&self, _object_id: &str) -> CmisRequest {
        self.unsupported("appendContentStream")
    }

    /// Not yet implemented.
    pub fn delete_content_stream(&self, _object_id: &str) -> CmisRequest {
        self.unsupported("deleteContentStream")
    }

    /// Not yet implemented.
    pub fn add_object_to_folder(
        &self,
        _folder_id: &str,
        _all_versions: bool,
        _options: Option<QueryOptions>,
    ) -> CmisRequest {
        self.unsupported("addObjectToFolder")
    }

    /// Not yet implemented.
    pub fn remove_object_from_folder(
        &self,
        _folder_id: &str,
        _options: Option<QueryOptions>,
    ) -> CmisRequest {
        self.unsupported("removeObjectFromFolder")
    }

    /// Not yet implemented.
    pub fn check_out(&self, _object_id: &str, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("checkOut")
    }

    /// Not yet implemented.
    pub fn cancel_check_out(&self, _object_id: &str, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("cancelCheckOut")
    }

    /// Not yet implemented.
    pub fn check_in(&self) -> CmisRequest {
        self.unsupported("checkIn")
    }

    /// Not yet implemented.
    pub fn get_object_of_latest_version(&self) -> CmisRequest {
        self.unsupported("getObjectOfLatestVersion")
    }

    /// Not yet implemented.
    pub fn get_properties_of_latest_version(&self) -> CmisRequest {
        self.unsupported("getPropertiesOfLatestVersion")
    }

    /// Not yet implemented.
    pub fn get_all_versions(&self, _filter: &str, _options: Option<QueryOptions>) -> CmisRequest {
        self.unsupported("getAllVersions")
    }

    /// Not yet implemented.
    pub fn get_object_relationships(
        &self,
        _include_sub_relationship_types: bool,
        _relationship_direction: &str,
        _type_id: &str,
        _options: Option<QueryOptions>,
    ) -> CmisRequest {
        self.unsupported("getObjectRelationships")
    }

    /// Not yet implemented.
    pub fn get_applied_policies(
        &self,
        _object_id: &str,
        _options: Option<QueryOptions>,
    ) -> CmisRequest {
        self.unsupported("getAppliedPolicies")
    }

    /// Not yet implemented.
    pub fn apply_policy(
        &self,
        _object_id: &str,
        _policy_id: &str,
        _options: Option<QueryOptions>,
    ) -> CmisRequest {
        self.unsupported("applyPolicy")
    }

    /// Not yet implemented.
    pub fn remove_policy(
        &self,
        _object_id: &str,
        _policy_id: &str,
        _options: Option<QueryOptions>,
    ) -> CmisRequest {
        self.unsupported("removePolicy")
    }

    /// Not yet implemented.
    pub fn apply_acl(&self, _object_id: &str) -> CmisRequest {
        self.unsupported("applyACL")
    }

    /// Not yet implemented.
    pub fn get_acl(&self) -> CmisRequest {
        self.unsupported("getACL")
    }

    /// Fresh copy of the session defaults with caller options overlaid.
    /// Stored defaults are never mutated; operation keys are written by the
    /// caller after this, so caller input cannot override them.
    fn merged(&self, options: Option<&QueryOptions>) -> Params {
        let mut params = self.inner.state.lock().defaults.clone();
        if let Some(options) = options {
            options.apply_to(&mut params);
        }
        params
    }

    fn require_repository(&self) -> Result<Repository> {
        self.inner
            .state
            .lock()
            .default_repository
            .clone()
            .ok_or(Error::NoRepository)
    }

    fn get(&self, url: String, params: Params) -> CmisRequest {
        self.issue(Method::Get, url, params)
    }

    fn post(&self, url: String, params: Params) -> CmisRequest {
        self.issue(Method::Post, url, params)
    }

    fn issue(&self, method: Method, url: String, params: Params) -> CmisRequest {
        let auth = auth_of(&self.inner.state.lock());
        let call = HttpCall {
            method,
            url,
            params,
            auth,
        };
        debug!(method = %call.method, url = %call.url, "issuing request");

        let (request, completer) = CmisRequest::pending(self.inner.fallbacks.clone());
        let transport = Arc::clone(&self.inner.transport);
        tokio::spawn(async move {
            let outcome = match transport.execute(call).await {
                Ok(response) if response.is_ok() => Outcome::Ok(response),
                Ok(response) => Outcome::NotOk(response),
                Err(error) => Outcome::Failed(error),
            };
            completer.complete(outcome);
        });
        request
    }

    fn failed(&self, error: Error) -> CmisRequest {
        CmisRequest::failed(error, self.inner.fallbacks.clone())
    }

    fn unsupported(&self, operation: &'static str) -> CmisRequest {
        warn!(operation, "operation not implemented");
        self.failed(Error::Unsupported(operation))
    }
}

/// Token beats basic auth when both are set.
fn auth_of(state: &SessionState) -> Option<Auth> {
    if let Some(token) = &state.token {
        return Some(Auth::Bearer(token.clone()));
    }
    state.credentials.as_ref().map(|(username, password)| Auth::Basic {
        username: username.clone(),
        password: password.clone(),
    })
}

fn join_path(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{root}{path}")
    } else {
        format!("{root}/{path}")
    }
}
