use crate::{
    errors::AppError,
    plugin::{registry::Tool, ToolContext},
    tools::resolve_path,
};
use async_trait::async_trait;
use serde_json::json;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
    time::Instant,
};
use tokio::process::Command;

/// Interpreter the validator script runs under, looked up on PATH per call.
const INTERPRETER: &str = "python";

/// Fixed location of the validator script inside the worktree.
pub fn validator_script(worktree: &Path) -> PathBuf {
    worktree.join(".opencode").join("tools").join("validate-schema.py")
}

/// Argument vector handed to the interpreter: the script path, then the two
/// flagged file paths resolved against the worktree. Built as an explicit
/// argv array, never a shell string.
pub fn build_argv(worktree: &Path, schema: &str, input: &str) -> Vec<OsString> {
    let script = validator_script(worktree);
    let schema_path = resolve_path(worktree, schema);
    let input_path = resolve_path(worktree, input);
    vec![
        script.into_os_string(),
        OsString::from("--schema"),
        schema_path.into_os_string(),
        OsString::from("--input"),
        input_path.into_os_string(),
    ]
}

pub struct ValidateSchemaTool {
    interpreter: String,
}

impl ValidateSchemaTool {
    pub fn new() -> Self {
        Self { interpreter: INTERPRETER.to_string() }
    }

    #[cfg(test)]
    pub(crate) fn with_interpreter(interpreter: impl Into<String>) -> Self {
        Self { interpreter: interpreter.into() }
    }
}

impl Default for ValidateSchemaTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ValidateSchemaTool {
    fn name(&self) -> &'static str {
        "validate_schema"
    }

    fn description(&self) -> &'static str {
        "Validate a JSON file against a protocol schema."
    }

    fn capabilities(&self) -> serde_json::Value {
        json!({"input": {"type":"object","required":["schema","input"],"properties": {"schema": {"type":"string","description":"Path to a JSON schema file."},"input":{"type":"string","description":"Path to a JSON input file."}}}, "output": {"type":"string","description":"Trimmed validator output."}})
    }

    async fn call(
        &self,
        ctx: &ToolContext,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, AppError> {
        let schema = params
            .get("schema")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::ToolError("missing schema".into()))?;
        let input = params
            .get("input")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::ToolError("missing input".into()))?;

        let interpreter =
            which::which(&self.interpreter).map_err(|e| AppError::LaunchFailed(e.to_string()))?;
        let argv = build_argv(ctx.worktree(), schema, input);

        let mut command = Command::new(&interpreter);
        command.args(&argv);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let start = Instant::now();
        let output = command
            .output()
            .await
            .map_err(|e| AppError::LaunchFailed(e.to_string()))?;
        let duration_ms = start.elapsed().as_millis() as u64;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(code = ?output.status.code(), duration_ms, "validator failed");
            return Err(AppError::ValidatorFailed { code: output.status.code(), stderr });
        }

        let report = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::debug!(duration_ms, bytes = report.len(), "validator ok");
        Ok(serde_json::Value::String(report))
    }
}
