//! # Quill Core
//!
//! The domain layer of the Quill blog API.
//! This crate contains the auth and blog flows, the ownership policy and the
//! ports they depend on. It has no infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod policy;
pub mod ports;
pub mod services;
pub mod validation;

pub use error::DomainError;
pub use validation::{FieldError, ValidationErrors};
