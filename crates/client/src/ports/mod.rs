//! Client port definitions.
//!
//! The connection layer only talks to the outside world (persisted session,
//! game selection, wall clock, user-facing notifications) through these traits.

pub mod outbound;
