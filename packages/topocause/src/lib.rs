//! Topology-aware root-cause inference for network alarm storms.
//!
//! Facade over the workspace layers: `domain` holds the engines,
//! `infrastructure` the file formats and hot reload, `application` the
//! per-tenant analysis service.

pub use application;
pub use domain;
pub use infrastructure;
