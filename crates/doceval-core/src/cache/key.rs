use crate::model::PromptUnit;
use sha2::{Digest, Sha256};

/// Content-addressed cache key for one (model, prompt, document) combination.
///
/// Every component is length-prefixed so that moving bytes between adjacent
/// fields always changes the key.
pub fn cache_key(model: &str, prompt: &PromptUnit, document: &str) -> String {
    let mut h = Sha256::new();
    for part in [
        model,
        prompt.role.as_str(),
        prompt.base_name.as_str(),
        prompt.content.as_str(),
        document,
    ] {
        h.update((part.len() as u64).to_le_bytes());
        h.update(part.as_bytes());
    }
    hex::encode(h.finalize())
}

/// True for names in the format [`cache_key`] produces: 64 lowercase hex digits.
pub fn is_cache_key(name: &str) -> bool {
    name.len() == 64
        && name
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
