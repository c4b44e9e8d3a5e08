//! Data models for Toodledo entities

mod account;
mod list;
mod task;

pub use account::*;
pub use list::*;
pub use task::*;
