//! Parceljoin Core - Domain models, input readers, and configuration
//!
//! This crate contains the record types shared by every stage of the
//! footprint-to-parcel pipeline, the readers that produce them, and the
//! layered run configuration.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;

pub use error::{ParceljoinError, Result};
