pub mod command;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod report;
pub mod store;
pub mod sync;
pub mod validation;

pub use error::{RegistryError, Result};
