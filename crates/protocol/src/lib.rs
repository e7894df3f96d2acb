//! Wire types for the CMIS browser binding.
//!
//! This crate contains the shapes of data as they appear on the wire when
//! talking to a CMIS repository over plain HTTP: flat parameter maps, typed
//! query options, repository descriptors, and the call/response structs
//! handed to the transport.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond (de)serialization and map building
//! * 1:1 with protocol: Match the browser-binding query/form conventions
//! * Stable: Changes only when the wire protocol changes
//!
//! The session and request machinery is built on top of these types in
//! `cmis-rs`.

pub mod call;
pub mod options;
pub mod params;
pub mod repository;
pub mod wire;

pub use call::*;
pub use options::*;
pub use params::*;
pub use repository::*;
pub use wire::*;
