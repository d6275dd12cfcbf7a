//! Build-time generator for a terminal's Unicode lookup tables.
//!
//! The Unicode Character Database is folded into one packed byte per
//! codepoint (a grapheme cluster break class plus a character width),
//! compressed into the smallest multi-stage lookup trie found by a parallel
//! search over stage shift configurations, and emitted together with the
//! packed grapheme join rules as a self-contained C++ module.

pub mod emit;
pub mod rules;
pub mod search;
pub mod trie;
pub mod ucd;
