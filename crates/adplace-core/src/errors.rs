use adplace_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias for model-level operations
pub type Result<T> = std::result::Result<T, AdError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure that crosses the store or engine boundary is classified into
/// exactly one of these kinds. Callers (an HTTP adapter, the CLI) map kinds to
/// transport-specific responses; the kind never carries user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Malformed or missing required input. Caller's fault, never retried.
    Validation,
    /// The referenced identifier does not exist.
    NotFound,
    /// Internal filter/update construction failure. A programming defect.
    QueryBuild,
    /// Transport, connection, pool or constraint failure. May be transient.
    Storage,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::QueryBuild => "ERR_QUERY_BUILD",
            ExErrorKind::Storage => "ERR_STORAGE",
        }
    }

    /// Whether a caller may reasonably retry the same request later
    pub fn is_transient(&self) -> bool {
        matches!(self, ExErrorKind::Storage)
    }
}

/// Canonical structured error type
///
/// Carries the classification plus optional context for debugging. Built
/// with the `with_*` methods:
///
/// ```
/// use adplace_core::errors::{ExError, ExErrorKind};
///
/// let err = ExError::new(ExErrorKind::NotFound)
///     .with_op("update_ads")
///     .with_entity_id("ad-1")
///     .with_message("no advertisement with this id");
/// assert_eq!(err.code(), "ERR_NOT_FOUND");
/// ```
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    transient: bool,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            transient: kind.is_transient(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Override the retry hint the kind implies
    ///
    /// A constraint violation is a `Storage` failure that retrying cannot fix.
    pub fn with_transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        self.transient
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Model-level failures raised while building or validating records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdError {
    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Placement must not be empty")]
    EmptyPlacement,

    /// The image URL is not an absolute URL with a scheme and host
    #[error("Invalid image URL '{url}': {reason}")]
    InvalidImageUrl { url: String, reason: String },

    /// An identifier is required but was empty
    #[error("Advertisement id must not be empty")]
    EmptyId,

    /// A status string outside the closed {active, inactive} set
    #[error("Unknown advertisement status: {value}")]
    UnknownStatus { value: String },

    /// created_at + ttl does not fit in a unix timestamp
    #[error("TTL of {ttl_minutes} minutes overflows the expiration timestamp")]
    TtlOverflow { ttl_minutes: i64 },
}

impl From<AdError> for ExError {
    fn from(err: AdError) -> Self {
        let base = ExError::new(ExErrorKind::Validation).with_message(err.to_string());
        match &err {
            AdError::InvalidImageUrl { url, .. } => base.with_entity_id(url.clone()),
            AdError::UnknownStatus { value } => base.with_entity_id(value.clone()),
            _ => base,
        }
    }
}
