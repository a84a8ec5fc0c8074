use crate::{errors::AppError, plugin::ToolContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type DynTool = Arc<dyn Tool + Send + Sync + 'static>;

#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<(String, DynTool)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        use crate::tools::validate_schema::ValidateSchemaTool;
        let mut tools: Vec<(String, DynTool)> =
            vec![("validate_schema".to_string(), Arc::new(ValidateSchemaTool::new()))];
        tools.sort_by(|a, b| a.0.cmp(&b.0));
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<DynTool> {
        self.tools.iter().find(|(n, _)| n == name).map(|(_, t)| t.clone())
    }

    pub fn list_names(&self) -> Vec<String> {
        self.tools.iter().map(|(n, _)| n.clone()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub id: String,
    pub tool: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")] pub error: Option<super::types::ErrorObj>,
}

/// A named operation exposed to the host runtime. The context carries the
/// worktree root for exactly one invocation.
#[async_trait]
pub trait Tool {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn capabilities(&self) -> serde_json::Value;
    async fn call(&self, ctx: &ToolContext, params: serde_json::Value) -> Result<serde_json::Value, AppError>;
}
