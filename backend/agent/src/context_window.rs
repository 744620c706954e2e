//! History truncation against the model's context budget.

use std::sync::Arc;

use webrun_core::Tokenizer;

use crate::tokens::history_char_budget;

/// A model context budget plus the tokenizer used to measure prompts.
#[derive(Clone)]
pub struct ContextWindow {
    pub context_len: usize,
    tokenizer: Arc<dyn Tokenizer>,
}

impl ContextWindow {
    pub fn new(context_len: usize, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            context_len,
            tokenizer,
        }
    }

    /// Characters of history that fit next to `fixed`.
    pub fn history_budget(&self, fixed: &str) -> usize {
        history_char_budget(self.context_len, self.tokenizer.count_tokens(fixed))
    }

    /// Keep the most recent part of `history` that fits next to `fixed`.
    /// Oldest turns are dropped first.
    pub fn fit<'a>(&self, fixed: &str, history: &'a str) -> &'a str {
        tail_chars(history, self.history_budget(fixed))
    }
}

impl std::fmt::Debug for ContextWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextWindow")
            .field("context_len", &self.context_len)
            .finish_non_exhaustive()
    }
}

/// The last `n` characters of `s`.
pub fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
