//! # Error Types
//!
//! This module defines error types used throughout the carteles library.
//!
//! The variants split into three groups:
//!
//! - **Setup errors** (`UnknownField`, `UnknownFamily`, `EmptyFieldSet`,
//!   `Config`, `Template`): a misconfigured registry or template store.
//!   These are loud and never recovered.
//! - **User errors** (`JustificationTooShort`, `InvalidValue`): recovered at
//!   the boundary with an inline message.
//! - **Degradations** (`MissingTemplateComponent`, `AssetUnavailable`,
//!   `PrintSurfaceUnavailable`): normally absorbed by a fallback before they
//!   reach the caller. `ReportSendFailed` is the one hard stop.

use thiserror::Error;

/// Main error type for carteles operations
#[derive(Debug, Error)]
pub enum CartelError {
    /// A field identifier outside the canonical vocabulary or the active field set
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A template family with no registry entry
    #[error("Unknown template family: {0}")]
    UnknownFamily(String),

    /// Neither introspection nor the family fallback produced any field
    #[error("Empty field set for {family}/{variant}")]
    EmptyFieldSet { family: String, variant: String },

    /// The selected variant has no renderer for a product
    #[error("Missing template component '{component}' for product {product_id}")]
    MissingTemplateComponent {
        product_id: String,
        component: String,
    },

    /// A decorative asset could not be loaded in time
    #[error("Asset unavailable: {0}")]
    AssetUnavailable(String),

    /// The audit justification is shorter than the configured minimum
    #[error("Justification too short: {actual} characters, at least {min} required")]
    JustificationTooShort { min: usize, actual: usize },

    /// The change report was rejected or could not be delivered
    #[error("Change report could not be sent: {0}")]
    ReportSendFailed(String),

    /// The print surface could not be opened or refused the document
    #[error("Print surface unavailable: {0}")]
    PrintSurfaceUnavailable(String),

    /// A user-entered value that does not parse for the field's type
    #[error("Invalid value '{value}' for field {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Product catalog errors (missing product, unreadable catalog)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Template store errors (unreadable or malformed template)
    #[error("Template error: {0}")]
    Template(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CartelError {
    /// Whether the user can fix this by re-entering input or retrying.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            CartelError::JustificationTooShort { .. }
                | CartelError::InvalidValue { .. }
                | CartelError::ReportSendFailed(_)
        )
    }

    /// Guidance shown next to the error message, when there is any.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            CartelError::JustificationTooShort { .. } => {
                Some("Describe why the printed values differ from the catalog.")
            }
            CartelError::ReportSendFailed(_) => {
                Some("Nothing was printed. Check the connection and try again.")
            }
            CartelError::PrintSurfaceUnavailable(_) => {
                Some("Allow pop-up windows for this site, or print from the preview.")
            }
            _ => None,
        }
    }
}
