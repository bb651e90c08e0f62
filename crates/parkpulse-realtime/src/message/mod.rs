//! Inbound/outbound frame types and classification.

pub mod envelope;
pub mod types;
