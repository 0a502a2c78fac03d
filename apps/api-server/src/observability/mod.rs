//! Observability - request ids on top of the tracing spans.

mod request_id;

pub use request_id::RequestIdMiddleware;
