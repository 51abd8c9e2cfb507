//! Find GitHub accounts you follow that don't follow you back, and unfollow
//! them after confirmation.

pub mod config;
pub mod console;
pub mod error;
pub mod github;
pub mod pagination;
pub mod relationship;
pub mod session;
