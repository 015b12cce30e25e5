//! Compatibility checks between a parsed mock and a parsed spec.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`result`] | Result codes, diagnostics, outcome and aggregation |
//! | [`matcher`] | Interaction to operation matching |
//! | [`content_negotiation`] | Media-type compatibility |
//! | [`params`] | Textual parameter coercion and validation |
//! | [`request`] / [`response`] | Facet checks of a matched interaction |
//! | [`interaction`] | Per-interaction pipeline |

pub mod content_negotiation;
pub mod context;
pub mod interaction;
pub mod matcher;
pub(crate) mod params;
pub mod request;
pub mod response;
pub mod result;

pub use context::ValidationContext;
pub use interaction::validate_interaction;
pub use matcher::{match_operation, MatchResult};
pub use result::{
    classify, combine, MockDetails, ResultCode, ResultType, SpecDetails, ValidationOutcome,
    ValidationResult, ValidationSource,
};
