//! Plain data types shared by the canonicalizer, packs and resolver.

pub mod capture;
pub mod entry;
pub mod line;
pub mod source;
