//! Tool parameter schemas exposed to MCP clients.

use rmcp::schemars;
use serde::Deserialize;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PositionArgs {
    /// Absolute or workspace-relative path to the source file
    #[schemars(description = "Path to the source file")]
    pub file_path: String,

    /// Zero-based line of the symbol
    #[schemars(description = "Zero-based line number")]
    pub line: u32,

    /// Zero-based character offset within the line
    #[schemars(description = "Zero-based character offset")]
    pub character: u32,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReferencesArgs {
    #[schemars(description = "Path to the source file")]
    pub file_path: String,

    #[schemars(description = "Zero-based line number")]
    pub line: u32,

    #[schemars(description = "Zero-based character offset")]
    pub character: u32,

    /// Whether the declaration site counts as a reference (default true)
    #[serde(default = "default_true")]
    #[schemars(description = "Include the declaration itself in the results")]
    pub include_declaration: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RenameArgs {
    #[schemars(description = "Path to the source file")]
    pub file_path: String,

    #[schemars(description = "Zero-based line number")]
    pub line: u32,

    #[schemars(description = "Zero-based character offset")]
    pub character: u32,

    /// The identifier the symbol should be renamed to
    #[schemars(description = "New name for the symbol")]
    pub new_name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CodeActionArgs {
    #[schemars(description = "Path to the source file")]
    pub file_path: String,

    #[schemars(description = "Zero-based start line of the range")]
    pub start_line: u32,

    #[schemars(description = "Zero-based start character of the range")]
    pub start_character: u32,

    #[schemars(description = "Zero-based end line of the range")]
    pub end_line: u32,

    #[schemars(description = "Zero-based end character of the range")]
    pub end_character: u32,

    /// Optional kind prefix filter, e.g. "refactor" or "quickfix"
    #[schemars(description = "Filter actions by kind prefix (e.g. 'refactor')")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ApplyEditArgs {
    /// The WorkspaceEdit to apply, exactly as returned by rename_symbol or
    /// carried by a code action
    #[schemars(description = "WorkspaceEdit object (changes map or documentChanges array)")]
    pub edit: serde_json::Value,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FileArgs {
    #[schemars(description = "Path to the source file")]
    pub file_path: String,
}
