//! Edits and queries on a [`RuleStore`](crate::model::RuleStore).
//!
//! Every operation is a small struct built with `new(..)` and run with
//! `execute(..)`. Edits check their preconditions before touching the store.

pub mod creation;
pub mod editing;
pub mod normalize;
pub mod query;
