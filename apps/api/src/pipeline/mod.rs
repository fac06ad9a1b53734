//! The analyze → optimize → download pipeline.
//!
//! `controller` enforces operation ordering against the case store, `apply`
//! is the deterministic change-application engine, `models` holds the shared
//! data types, and `handlers` binds the pipeline to the HTTP surface.

pub mod apply;
pub mod controller;
pub mod handlers;
pub mod models;
