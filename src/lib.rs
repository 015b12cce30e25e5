//! # swagger-mock-validator
//!
//! Checks that a consumer-driven contract (a Pact mock of recorded HTTP interactions) is
//! compatible with a provider's API specification (Swagger 2 or OpenAPI 3).
//!
//! ## Overview
//!
//! Both documents are parsed once into read-only models: a [`ParsedSpec`] holding an arena of
//! operations and a [`ParsedMock`] holding an arena of interactions. Every interaction is then
//! matched to an operation and checked facet by facet (path, method, content negotiation,
//! query, headers, security, bodies, status). Every incompatibility is reported; validation never
//! stops at the first one.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use swagger_mock_validator::{loader, ValidationOptions};
//!
//! #[tokio::main]
//! async fn main() -> swagger_mock_validator::Result<()> {
//!     let outcome = loader::validate_files(
//!         "pacts/web-widgets.json",
//!         "specs/widgets.yaml",
//!         ValidationOptions::default(),
//!     )
//!     .await?;
//!
//!     for error in &outcome.errors {
//!         println!("{}: {}", error.code, error.message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`spec`] | Parsed spec model; Swagger 2 and OpenAPI 3 parsers |
//! | [`mock`] | Parsed mock model; Pact parser |
//! | [`schema`] | Format adapter, schema resolver and structural validator |
//! | [`validation`] | Operation matching, content negotiation, facet checks, results |
//! | [`validator`] | Run orchestration |
//! | [`loader`] | File / URL loading and JSON-or-YAML decoding |
//! | [`config`] | Validation options |

pub mod config;
pub mod loader;
pub mod mock;
pub mod schema;
pub mod spec;
pub mod utils;
pub mod validation;
pub mod validator;

pub use config::ValidationOptions;
pub use mock::{ParsedMock, ParsedMockInteraction, QueryValue};
pub use spec::{ParsedSpec, ParsedSpecOperation, SpecFormat};
pub use validation::{
    combine, ResultCode, ResultType, ValidationOutcome, ValidationResult, ValidationSource,
};
pub use validator::{validate_parsed, validate_spec_and_mock};

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, Result};
