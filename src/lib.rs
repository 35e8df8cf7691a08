//! Core library for the pravasi-registry district office application.
//!
//! The registry tracks migrant workers per annual cycle together with the
//! establishments that employ them. Entities live in [`pravasi::registry::model`],
//! typed mutation inputs in [`pravasi::registry::command`], and the
//! [`pravasi::registry::store`] owns the snapshot and enforces the cross-entity
//! rules. Snapshots are persisted through [`pravasi::registry::persistence`],
//! flattened into the district workbook by [`pravasi::registry::report`], and
//! pushed to the integration webhook by [`pravasi::registry::sync`].

pub mod pravasi;

pub use pravasi::registry::{
    RegistryError, Result, command, config, error, io, logging, model, persistence, report,
    store, sync, validation,
};
