//! MCP server exposing language-server refactoring operations as tools.

pub mod args;
pub mod service;

pub use service::RefactorService;
