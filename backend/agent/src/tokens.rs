//! Token-budget estimation.

use anyhow::Result;
use tiktoken_rs::CoreBPE;
use webrun_core::Tokenizer;

/// Characters assumed per token when turning a token budget into a history
/// character budget.
pub const CHARS_PER_TOKEN: usize = 3;

/// BPE tokenizer backed by `tiktoken-rs`.
pub struct BpeTokenizer {
    bpe: CoreBPE,
}

impl BpeTokenizer {
    /// The `cl100k_base` encoding used by the GPT-3.5/4 family.
    pub fn cl100k() -> Result<Self> {
        Ok(Self {
            bpe: tiktoken_rs::cl100k_base()?,
        })
    }

    /// Encoding for a named model, falling back to `cl100k_base` when the
    /// model is unknown to tiktoken.
    pub fn for_model(model: &str) -> Result<Self> {
        match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Ok(Self { bpe }),
            Err(_) => Self::cl100k(),
        }
    }
}

impl Tokenizer for BpeTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Character budget left for history once `fixed_tokens` of the context are
/// spent on the fixed prompt parts. Never negative.
pub fn history_char_budget(context_len: usize, fixed_tokens: usize) -> usize {
    context_len.saturating_sub(fixed_tokens) * CHARS_PER_TOKEN
}
