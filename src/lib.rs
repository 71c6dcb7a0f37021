//! condtree — nestable entry/exit condition trees for trading strategies.
//!
//! Hexagonal architecture: the condition model, its builder and JSON codec in
//! [`domain`], port traits in [`ports`], concrete implementations in
//! [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
