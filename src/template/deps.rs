// src/template/deps.rs

//! Layout → fragment dependency extraction.

use std::collections::BTreeSet;

use crate::template::tokens::embed_tokens;

/// Distinct fragment names embedded in `content`.
///
/// Single level: fragments cannot embed other fragments, so this is the
/// complete dependency set of a layout.
pub fn fragment_dependencies(content: &str) -> BTreeSet<String> {
    embed_tokens(content).map(|token| token.name).collect()
}
