//! Analysis pipeline stages and result aggregation
//!
//! - Bootstrap uncertainty
//! - Immutable analysis snapshot
//! - Metadata

pub mod bootstrap;
pub mod metadata;
pub mod result;
