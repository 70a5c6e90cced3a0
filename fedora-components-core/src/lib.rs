#![doc = "fedora-components-core: core logic library for fedora-components."]

//! This crate contains the repository-facing logic of fedora-components without any
//! transport code: the capability traits a Fedora client must implement, the
//! paginated object collector, and the typed component operations built on them.
//!
//! # Usage
//! Depend on this crate from any binary that provides a concrete client (see the
//! `fedora-components` crate for the REST implementation) or from tests that use the
//! generated `mockall` mocks.

pub mod collect;
pub mod components;
pub mod config;
pub mod contract;
pub mod error;

pub use collect::collect_objects;
pub use contract::{FieldSearchQuery, ListSession, ObjectRecord, ResultPage};
pub use error::{CollectError, ComponentError, RepositoryError};
