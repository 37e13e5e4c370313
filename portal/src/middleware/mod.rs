pub mod domain;
pub mod edge_gate;

pub use domain::{resolve_domain_middleware, resolve_request_domain};
pub use edge_gate::{edge_gate_middleware, EdgeDecision, ORG_QUERY_PARAM, ORG_SLUG_HEADER};
