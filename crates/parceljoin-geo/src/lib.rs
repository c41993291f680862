//! Parceljoin Geo - Point-in-polygon matching and local frame projection
//!
//! This crate holds the geometric half of the pipeline: conversions to the
//! `geo` crate, the parcel matcher with its tie-break, and the planar frame
//! and height rules applied to every building.

pub mod models;
pub mod spatial;
pub mod transform;
