//! Lottery drawing and ranking engine for affordable housing listings.
//!
//! The engine turns the pool of submitted applications for an open listing
//! into a fair, reproducible, preference-aware rank ordering, persists it
//! exactly once under a generated lottery identifier, and serves the ranking
//! back as sorted, paginated pages. Listings, applications, lottery storage,
//! and audit delivery are collaborator traits so the engine stays agnostic of
//! persistence technology.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
