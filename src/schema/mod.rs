//! Schema preparation and structural validation.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`format`] | Format-keyword adapter and the numeric/Base64 format predicates |
//! | [`traverse`] | Generic walk over every inline subschema |
//! | [`resolver`] | Makes a spec schema fragment self-contained and validator-ready |
//! | [`validator`] | Compiles resolved schemas and reports violations with sub-paths |

pub mod format;
pub mod resolver;
pub mod traverse;
pub mod validator;

pub use format::{is_byte, is_double, is_float, is_int32, is_int64, CustomFormat};
pub use resolver::{resolve, resolve_with_definitions, ResolveOptions, ResolvedSchema};
pub use traverse::{traverse_schema_mut, SchemaPosition};
pub use validator::{SchemaValidator, SchemaViolation};
