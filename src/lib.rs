//! Rent Finder — a chat bot that asks a few questions and pages through
//! matching rental listings.

pub mod channels;
pub mod config;
pub mod conversation;
pub mod dataset;
pub mod error;
pub mod matching;
pub mod session;
