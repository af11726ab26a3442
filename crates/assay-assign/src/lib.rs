//! Assay Assign — batch assignment creation: request validation, identity
//! provisioning, per-user question selection, and access-link issuing.

pub mod engine;
pub mod identity;
pub mod request;
pub mod selection;
