//! Voiceline Engine: voice-over resolution for scripted game dialogue.
//!
//! Turns raw dialogue script lines into canonical text segments, indexes
//! them into voice packs, resolves on-screen text back to an audio file at
//! runtime (same-language and cross-language), and migrates packs recorded
//! under an older canonicalization scheme.

pub mod core;
pub mod schema;
