use crate::actors::messages::AppError;
use async_trait::async_trait;

/// Defines the public interface for an advice actor.
///
/// This trait abstracts where advice comes from, so the supervisor and the
/// response crafter can be exercised against a canned source in tests.
#[async_trait]
pub trait AdviceActor: Send + Sync + 'static {
    /// Fetches one piece of advice.
    async fn fetch_advice(&self) -> Result<String, AppError>;
}
