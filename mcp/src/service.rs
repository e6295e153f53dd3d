//! The MCP service: seven refactoring tools backed by one workspace.
//!
//! Write access is deliberately two-staged: `rename_symbol` only produces
//! a plan describing the changes; nothing touches disk until the agent
//! passes that plan back through `apply_workspace_edit`.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use refactor_lsp::Workspace;

use crate::args::{
    ApplyEditArgs, CodeActionArgs, FileArgs, PositionArgs, ReferencesArgs, RenameArgs,
};

#[derive(Clone)]
pub struct RefactorService {
    workspace: Arc<Workspace>,
    tool_router: ToolRouter<Self>,
}

impl RefactorService {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self {
            workspace,
            tool_router: Self::tool_router(),
        }
    }

    /// Resolve a caller-supplied path against the workspace root.
    fn resolve(&self, file_path: &str) -> PathBuf {
        let path = PathBuf::from(file_path);
        if path.is_absolute() {
            path
        } else {
            self.workspace.root().join(path)
        }
    }

    fn json_result(value: &serde_json::Value) -> CallToolResult {
        CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(value).unwrap_or_default(),
        )])
    }

    fn error_result(message: impl std::fmt::Display) -> CallToolResult {
        CallToolResult::error(vec![Content::text(format!("Error: {message}"))])
    }
}

#[tool_handler]
impl ServerHandler for RefactorService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Code intelligence and refactoring over a language server. \
                 Use goto_definition/find_references/hover to navigate, \
                 rename_symbol to plan a rename (it does NOT modify files), \
                 and apply_workspace_edit to apply a previously returned plan. \
                 apply_workspace_edit is the only tool that writes to disk."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

#[tool_router]
impl RefactorService {
    #[tool(
        description = "Find where the symbol at a position is defined. Returns LSP Location(s), or null if the backend finds nothing."
    )]
    pub async fn goto_definition(
        &self,
        Parameters(args): Parameters<PositionArgs>,
    ) -> Result<CallToolResult, McpError> {
        let path = self.resolve(&args.file_path);
        match self
            .workspace
            .goto_definition(&path, args.line, args.character)
            .await
        {
            Ok(value) => Ok(Self::json_result(&value)),
            Err(e) => Ok(Self::error_result(e)),
        }
    }

    #[tool(
        description = "Find all references to the symbol at a position across the workspace. Returns an array of LSP Locations."
    )]
    pub async fn find_references(
        &self,
        Parameters(args): Parameters<ReferencesArgs>,
    ) -> Result<CallToolResult, McpError> {
        let path = self.resolve(&args.file_path);
        match self
            .workspace
            .find_references(&path, args.line, args.character, args.include_declaration)
            .await
        {
            Ok(value) => Ok(Self::json_result(&value)),
            Err(e) => Ok(Self::error_result(e)),
        }
    }

    #[tool(
        description = "Get hover documentation (type signature, docstring) for the symbol at a position."
    )]
    pub async fn hover(
        &self,
        Parameters(args): Parameters<PositionArgs>,
    ) -> Result<CallToolResult, McpError> {
        let path = self.resolve(&args.file_path);
        match self.workspace.hover(&path, args.line, args.character).await {
            Ok(value) => Ok(Self::json_result(&value)),
            Err(e) => Ok(Self::error_result(e)),
        }
    }

    #[tool(
        description = "Plan a rename of the symbol at a position. Returns a WorkspaceEdit describing every change across the workspace. Does NOT modify any files; pass the returned edit to apply_workspace_edit after user approval."
    )]
    pub async fn rename_symbol(
        &self,
        Parameters(args): Parameters<RenameArgs>,
    ) -> Result<CallToolResult, McpError> {
        let path = self.resolve(&args.file_path);
        match self
            .workspace
            .rename(&path, args.line, args.character, &args.new_name)
            .await
        {
            Ok(value) if value.is_null() => Ok(Self::error_result(
                "symbol at this position cannot be renamed",
            )),
            Ok(value) => Ok(Self::json_result(&value)),
            Err(e) => Ok(Self::error_result(e)),
        }
    }

    #[tool(
        description = "List code actions (quick fixes, refactorings) available for a range, optionally filtered by kind prefix such as 'refactor'."
    )]
    pub async fn get_code_actions(
        &self,
        Parameters(args): Parameters<CodeActionArgs>,
    ) -> Result<CallToolResult, McpError> {
        let path = self.resolve(&args.file_path);
        match self
            .workspace
            .code_actions(
                &path,
                (args.start_line, args.start_character),
                (args.end_line, args.end_character),
                args.kind.as_deref(),
            )
            .await
        {
            Ok(value) => Ok(Self::json_result(&value)),
            Err(e) => Ok(Self::error_result(e)),
        }
    }

    #[tool(
        description = "Apply a WorkspaceEdit to disk. This is the ONLY tool that modifies files; use it only with an edit the user has approved. Returns the list of modified files."
    )]
    pub async fn apply_workspace_edit(
        &self,
        Parameters(args): Parameters<ApplyEditArgs>,
    ) -> Result<CallToolResult, McpError> {
        match self.workspace.apply_edit(&args.edit).await {
            Ok(modified) => {
                let files: Vec<String> = modified
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                Ok(Self::json_result(&serde_json::json!({
                    "applied": true,
                    "modified_files": files
                })))
            }
            Err(e) => Ok(Self::error_result(e)),
        }
    }

    #[tool(
        description = "Trigger language-server analysis of a file. Diagnostics are published asynchronously by the backend."
    )]
    pub async fn get_diagnostics(
        &self,
        Parameters(args): Parameters<FileArgs>,
    ) -> Result<CallToolResult, McpError> {
        let path = self.resolve(&args.file_path);
        match self.workspace.diagnostics(&path).await {
            Ok(value) => Ok(Self::json_result(&value)),
            Err(e) => Ok(Self::error_result(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_exposes_the_seven_tools() {
        let router = RefactorService::tool_router();
        let mut names: Vec<String> = router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "apply_workspace_edit",
                "find_references",
                "get_code_actions",
                "get_diagnostics",
                "goto_definition",
                "hover",
                "rename_symbol",
            ]
        );
    }

    #[test]
    fn write_tool_description_names_the_approval_requirement() {
        let router = RefactorService::tool_router();
        let apply = router
            .list_all()
            .into_iter()
            .find(|t| t.name == "apply_workspace_edit")
            .unwrap();
        let description = apply.description.unwrap();
        assert!(description.contains("ONLY tool that modifies files"));

        let rename = RefactorService::tool_router()
            .list_all()
            .into_iter()
            .find(|t| t.name == "rename_symbol")
            .unwrap();
        assert!(rename.description.unwrap().contains("Does NOT modify"));
    }
}
