//! Per-user conversation sessions.
//!
//! A session walks a user through a fixed questionnaire, collects their
//! answers as search criteria, and then pages through matching listings.

pub mod cursor;
pub mod state;
pub mod store;

pub use cursor::SearchCursor;
pub use state::{Question, Session, Stage, Transition};
pub use store::SessionStore;
