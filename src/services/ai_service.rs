use crate::error::UpstreamError;
use crate::models::{AnalysisResult, FoodImage};

/// Trait for the model backend behind the relay (Anthropic, or a mock in tests)
#[async_trait::async_trait]
pub trait FoodAnalyzer: Send + Sync {
    async fn analyze_food(&self, food: &str) -> Result<AnalysisResult, UpstreamError>;
    async fn analyze_food_image(&self, image: &FoodImage) -> Result<AnalysisResult, UpstreamError>;
}
