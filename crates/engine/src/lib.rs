//! Access decision engine: registry loading, row-level visibility, field
//! gating, mutation guards, and read projections over entity metadata.

#![forbid(unsafe_code)]

pub mod catalog;
mod decision_service;
mod field_access;
mod filter;
mod mutation;
mod ports;
mod registry;
mod rls;

pub use decision_service::AccessDecisionService;
pub use field_access::can_access_field;
pub use filter::filter_for_read;
pub use mutation::{MutationCheck, validate_mutation};
pub use ports::{InMemoryRowStore, RowLookup};
pub use registry::MetadataRegistry;
pub use rls::{RlsEvaluator, RowVisibility};
