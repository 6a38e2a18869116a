//! Cost estimate for a research call from its token usage.

use shared::grounding::UsageMetadata;

/// Pricing per 1M tokens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub fn calculate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.input_per_million;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.output_per_million;
        input_cost + output_cost
    }
}

/// Known Gemini pricings; anything else gets a conservative default.
pub fn get_model_pricing(model: &str) -> ModelPricing {
    let model_lower = model.to_lowercase();
    let (input, output) = if model_lower.contains("2.5-pro") {
        (2.5, 10.0)
    } else if model_lower.contains("1.5-pro") {
        (1.25, 5.0)
    } else if model_lower.contains("flash-8b") {
        (0.0375, 0.15)
    } else if model_lower.contains("flash") {
        (0.075, 0.3)
    } else {
        (0.5, 1.5)
    };
    ModelPricing {
        input_per_million: input,
        output_per_million: output,
    }
}

/// Estimated USD cost of one call. Thinking tokens bill as output.
pub fn estimate_cost(model: &str, usage: &UsageMetadata) -> f64 {
    let input = usage.prompt_token_count.unwrap_or(0) + usage.tool_use_prompt_token_count.unwrap_or(0);
    let output = usage.candidates_token_count.unwrap_or(0) + usage.thoughts_token_count.unwrap_or(0);
    get_model_pricing(model).calculate_cost(input, output)
}
