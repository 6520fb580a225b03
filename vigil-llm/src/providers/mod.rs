pub mod google;

use async_trait::async_trait;
use crate::error::Result;

/// Remote text generation used for scene descriptions
#[async_trait]
pub trait SceneProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn has_api_key(&self) -> bool;

    /// Generate a completion for a single user prompt
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub use google::GoogleProvider;
