//! Shared HTTP plumbing for the Pantry REST surface: RFC 9457 problem
//! responses and request-id propagation.

pub mod problem;
pub mod request_id;

pub use problem::{Problem, ProblemResponse, ValidationError, APPLICATION_PROBLEM_JSON};
pub use request_id::XRequestId;
