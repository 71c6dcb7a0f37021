//! Core domain types and logic.

pub mod condition;
pub mod builder;
pub mod codec;
pub mod edit;
pub mod session;
pub mod catalog;
pub mod payload;
pub mod error;
