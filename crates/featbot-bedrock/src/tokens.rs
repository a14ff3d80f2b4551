use featbot_core::models::token_count::TokenCount;

/// Rough characters-per-token ratio for English text on Claude models.
const CHARS_PER_TOKEN: usize = 4;

/// Extract token counts from a Bedrock Converse response.
pub fn extract_token_usage(usage: &aws_sdk_bedrockruntime::types::TokenUsage) -> TokenCount {
    TokenCount {
        input: usage.input_tokens.max(0) as u64,
        output: usage.output_tokens.max(0) as u64,
    }
}

/// Approximate the token count of `text` without a tokenizer.
pub fn estimate(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}
