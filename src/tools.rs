//! Runtime tool path resolution
//!
//! For each tool (e.g., `dwc`), we:
//! 1. Check for an environment variable `{TOOL}_BIN` (e.g., `DWC_BIN`)
//! 2. Fall back to a `PATH` lookup
//!
//! This lets CI images pin an explicit binary while local runs use whatever
//! is installed.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Release CLI binary name
pub const RELEASE_CLI: &str = "dwc";

/// Name of the override variable for a tool: `{TOOL}_BIN`, `-` mapped to `_`
pub fn tool_env_var(tool: &str) -> String {
    format!("{}_BIN", tool.to_uppercase().replace('-', "_"))
}

/// Get the path to an external tool
///
/// Returns the value of `{TOOL}_BIN` when set, otherwise the tool name
/// itself, which relies on `PATH` at invocation time.
pub fn get_tool_path(tool: &str) -> String {
    env::var(tool_env_var(tool)).unwrap_or_else(|_| tool.to_string())
}

/// Resolve a tool to an absolute path, failing if it cannot be found
pub fn locate_tool(tool: &str) -> Result<PathBuf> {
    let candidate = get_tool_path(tool);
    which::which(&candidate).with_context(|| {
        format!(
            "{} not found. Install it or point {} at the binary",
            candidate,
            tool_env_var(tool)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_env_var() {
        assert_eq!(tool_env_var("dwc"), "DWC_BIN");
        assert_eq!(tool_env_var("release-cli"), "RELEASE_CLI_BIN");
    }

    #[test]
    fn test_get_tool_path_from_env() {
        env::set_var("STAGE_RELEASE_TEST_TOOL_BIN", "/custom/path/to/tool");
        assert_eq!(get_tool_path("stage-release-test-tool"), "/custom/path/to/tool");
        env::remove_var("STAGE_RELEASE_TEST_TOOL_BIN");
    }

    #[test]
    fn test_get_tool_path_fallback() {
        env::remove_var("MISSING_TOOL_BIN");
        assert_eq!(get_tool_path("missing-tool"), "missing-tool");
    }

    #[test]
    fn test_locate_missing_tool_fails() {
        let err = locate_tool("stage-release-no-such-binary").unwrap_err();
        assert!(err.to_string().contains("STAGE_RELEASE_NO_SUCH_BINARY_BIN"));
    }
}
