//! Command implementations for the trialtree CLI.
//!
//! Read commands settle the requested subtree first, so their output reflects
//! the store as of the call instead of a half-loaded cache.

pub mod browse;
pub mod context;
pub mod edit;
pub mod output;
