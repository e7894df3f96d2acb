//! Client for the CMIS browser binding.
//!
//! Talks to CMIS-compliant content repositories (Alfresco, Nuxeo, …) over
//! plain HTTP: repository discovery, object retrieval, folder creation,
//! deletion, and query. Reads are GETs discriminated by `cmisselector`,
//! writes are form-encoded POSTs discriminated by `cmisaction`; responses
//! are requested in succinct JSON form by default.
//!
//! ```no_run
//! # use cmis::{Session, QueryOptions};
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new("http://cmis.example/cmisbrowser");
//! session.set_credentials("admin", "admin");
//! session.load_repositories().result().await?;
//!
//! let object = session
//!     .get_object_by_path("/Sites/docs", None)
//!     .result()
//!     .await?;
//! println!("{}", object.body);
//! # Ok(())
//! # }
//! ```
//!
//! Every operation returns a [`CmisRequest`] whose HTTP call is already in
//! flight; chain `ok`/`not_ok`/`error` continuations on it, or await
//! [`CmisRequest::outcome`]/[`CmisRequest::result`]. Operations must run
//! inside a tokio runtime.

pub mod error;
pub mod fake_transport;
pub mod request;
pub mod session;
pub mod transport;

pub use cmis_protocol as protocol;

pub use error::{Error, Result};
pub use request::{CmisRequest, Outcome};
pub use session::{Session, SessionConfig};
pub use transport::{ReqwestTransport, Transport};

pub use cmis_protocol::{
    Ace, Auth, CmisResponse, CreateFolderOptions, HttpCall, Method, ParamValue, Params,
    Properties, QueryOptions, Repositories, Repository,
};
