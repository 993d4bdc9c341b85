//! Canonicalization, indexing, resolution and migration.

pub mod builder;
pub mod canonical;
pub mod config;
pub mod dictionary;
pub mod lexicon;
pub mod migration;
pub mod pack;
pub mod playback;
pub mod punctuation;
pub mod resolver;
pub mod sanitize;
pub mod service;
pub mod tracker;
