//! # Snapshot testing support
//!
//! Parsing behavior is pinned down by fixture notes whose tree outlines
//! ([`Tree::outline`](crate::parsing::Tree::outline)) are stored as `insta`
//! snapshots, plus the structural checks in [`invariants`] that every parse
//! must satisfy.

pub mod invariants;

pub use invariants::check as invariants;
