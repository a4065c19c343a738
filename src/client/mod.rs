pub mod http;
pub mod session;

use crate::{error::Result, models::edit::EditRequest};
use async_trait::async_trait;

pub use http::EditClient;
pub use session::{EditSession, ImageSource, SessionSnapshot, SessionStatus, SubmitOutcome};

/// Anything that can carry an edit request to the proxy.
#[async_trait]
pub trait EditService: Send + Sync {
    /// `Ok(None)` when the proxy answered 2xx without image data.
    async fn edit(&self, request: &EditRequest) -> Result<Option<String>>;
}
