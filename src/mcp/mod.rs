//! Model Context Protocol surface: tool catalog, argument checks, dispatch

mod args;
pub mod catalog;
pub mod gateway;
pub mod server;

pub use gateway::ToolGateway;
pub use server::serve;
