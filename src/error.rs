use thiserror::Error;

/// Structured error context for locating a failure inside a spec or mock document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Location inside the document that caused the error (e.g., "[root].paths./users.get.responses")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected shape, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "openapi3_parser", "pact_parser")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the validator.
///
/// These are failures that prevent a run from producing diagnostics at all (unreadable
/// documents, malformed specs or mocks, schemas the structural validator cannot compile).
/// Incompatibilities between a spec and a mock are never reported through this type; they
/// are collected as [`crate::validation::ValidationResult`]s instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to load {location}: {reason}")]
    Load { location: String, reason: String },

    #[error("Spec parse error: {message}{}", format_context(.context))]
    SpecParse {
        message: String,
        context: ErrorContext,
    },

    #[error("Mock parse error: {message}{}", format_context(.context))]
    MockParse {
        message: String,
        context: ErrorContext,
    },

    #[error("Schema error: {message}{}", format_context(.context))]
    Schema {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML syntax error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for validator operations
pub type Result<T> = std::result::Result<T, Error>;

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("at: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a spec parse error located at `field_path`
    pub fn spec_parse(msg: impl Into<String>, field_path: impl Into<String>) -> Self {
        Error::SpecParse {
            message: msg.into(),
            context: ErrorContext::new().with_field_path(field_path),
        }
    }

    /// Create a mock parse error located at `field_path`
    pub fn mock_parse(msg: impl Into<String>, field_path: impl Into<String>) -> Self {
        Error::MockParse {
            message: msg.into(),
            context: ErrorContext::new().with_field_path(field_path),
        }
    }

    /// Create a schema error with structured context
    pub fn schema_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Schema {
            message: msg.into(),
            context,
        }
    }

    /// Create a runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::SpecParse { context, .. }
            | Error::MockParse { context, .. }
            | Error::Schema { context, .. }
            | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}
