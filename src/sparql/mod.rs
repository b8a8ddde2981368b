//! SPARQL Module
//!
//! Endpoint transport and normalization of its result documents.

mod client;
mod result;

pub use client::{GraphEndpoint, SparqlClient, RESULT_FORMAT};
pub use result::{normalize, Answer, ResultPayload, Row, Term, GENERATION_FAILED, NO_RESULT};
