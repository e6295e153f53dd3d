//! LSP client for driving code-intelligence queries and workspace edits.

pub mod codec;
pub mod edit;
pub mod error;
pub mod process;

pub(crate) mod protocol;

mod session;
mod sync;
mod workspace;

pub use edit::{EditPlan, Position, Range, TextEdit};
pub use error::{LspError, PlanError};
pub use process::BackendConfig;
pub use session::Session;
pub use sync::DocumentSync;
pub use workspace::Workspace;
