//! Token usage accounting.

use serde::{Deserialize, Serialize};

/// Token usage reported by the backend for one chat call.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
