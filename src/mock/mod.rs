//! Parsed mock model and the Pact parser.

pub mod model;
pub mod pact;

pub use model::{
    InteractionId, ParsedMock, ParsedMockInteraction, ParsedMockValue, QueryValue,
    NO_PROVIDER_STATE,
};
pub use pact::parse_pact;

use serde_json::Value;

impl ParsedMock {
    /// Builds the model from a decoded pact document.
    pub fn from_document(document: &Value) -> crate::Result<Self> {
        parse_pact(document)
    }
}
