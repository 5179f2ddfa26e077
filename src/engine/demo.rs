//! Offline fallback responder.
//!
//! This is the engine's availability floor: when every live provider is
//! skipped or fails, the demo responder synthesizes a reply. It is a
//! pure function of the request with no I/O and no failure modes, which
//! is exactly why it must stay free of external dependencies.

use crate::engine::types::{GenerationRequest, GenerationResult, TokenUsage};

/// Provider name stamped on demo results. Demo output is never cached
/// so it cannot mask a later live attempt.
pub const DEMO_PROVIDER_NAME: &str = "demo";

const DEMO_MODEL_NAME: &str = "demo-offline";

/// Longest prompt excerpt quoted back in a demo reply, in bytes.
const EXCERPT_LIMIT: usize = 60;

const TEMPLATES: &[&str] = &[
    "That's a fair point about \"{topic}\" — though I'd push back a little. \
     The loudest take is rarely the most accurate one, and this feels like \
     a case where the details matter more than the headline.",
    "I keep coming back to \"{topic}\". Everyone wants a simple answer here, \
     but the honest position is that the trade-offs are real and pretending \
     otherwise doesn't help anyone.",
    "Interesting framing of \"{topic}\". My read is the opposite: the \
     incentives behind this are doing most of the work, and until those \
     change, the rest is noise.",
    "On \"{topic}\": I've seen this debate go in circles for years. What \
     would actually move it forward is someone engaging with the strongest \
     version of the other side's argument for once.",
    "\"{topic}\" deserves more attention than it gets. Not because the \
     popular take is wrong, exactly, but because it skips the part where \
     real people deal with the consequences.",
    "Hot take on \"{topic}\": both camps are arguing about the wrong thing. \
     The question isn't whether it happens, it's who gets to decide the \
     terms when it does.",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct DemoResponder;

impl DemoResponder {
    pub fn new() -> Self {
        Self
    }

    /// Synthesize a deterministic reply. Identical prompts always yield
    /// identical output; content length is bounded by the template bank
    /// plus a truncated prompt excerpt.
    pub fn respond(&self, request: &GenerationRequest) -> GenerationResult {
        let topic = excerpt(request.prompt.trim(), EXCERPT_LIMIT);
        let template = TEMPLATES[select_template(&request.prompt)];
        let content = template.replace("{topic}", topic);

        let prompt_tokens = estimate_tokens(&request.prompt);
        let completion_tokens = estimate_tokens(&content);

        GenerationResult {
            content,
            provider_name: DEMO_PROVIDER_NAME.to_string(),
            model_name: DEMO_MODEL_NAME.to_string(),
            usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            finish_reason: "stop".to_string(),
        }
    }
}

/// Stable FNV-1a fold; std's `DefaultHasher` is not guaranteed stable
/// across releases and this module must stay dependency-free.
fn select_template(prompt: &str) -> usize {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in prompt.trim().as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % TEMPLATES.len() as u64) as usize
}

fn estimate_tokens(text: &str) -> u64 {
    (text.len() as f64 / 4.0).ceil() as u64
}

/// Truncate on a char boundary so multi-byte prompts cannot panic.
fn excerpt(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
