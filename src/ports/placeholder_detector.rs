//! Placeholder detector port.
//!
//! Supplies the initial list of blanks for a template. Invoked once when a
//! session is started; its output is fixed for the life of the session.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::template::PlaceholderDefinition;

/// Port for finding placeholders in template text.
#[async_trait]
pub trait PlaceholderDetector: Send + Sync {
    /// Detect placeholders in definition order.
    ///
    /// Keys in the returned list must be unique.
    async fn detect(&self, template_text: &str) -> Result<Vec<PlaceholderDefinition>, DomainError>;
}
