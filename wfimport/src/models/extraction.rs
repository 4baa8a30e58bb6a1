//! Metadata Extraction Service responses

use crate::error::ImportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reason used when the service reports failure without an error text
pub const NO_WORKFLOW_FOUND: &str = "No workflow found in image";

/// Reason used when neither a workflow graph nor an API prompt is present
pub const NO_VALID_WORKFLOW_DATA: &str = "No valid workflow data found";

/// JSON body returned by the extraction endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub success: bool,
    /// Full workflow graph, as an object or a JSON string
    #[serde(default)]
    pub workflow: Option<Value>,
    /// API prompt, as an object or a JSON string
    #[serde(default)]
    pub prompt: Option<Value>,
    /// Opaque extra information about the image
    #[serde(default)]
    pub info: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Successful extraction; at least one payload is present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSuccess {
    pub workflow_graph: Option<Value>,
    pub api_prompt: Option<Value>,
    pub info: Option<Value>,
}

/// Outcome of extracting one file
pub type ExtractionResult = Result<ExtractionSuccess, ImportError>;

/// Null and empty-string payloads count as absent
fn present(value: Option<Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        other => other,
    }
}

impl ExtractionResponse {
    /// Normalize a 2xx response body into a typed result
    pub fn into_result(self) -> ExtractionResult {
        if !self.success {
            return Err(ImportError::Extraction(
                self.error.unwrap_or_else(|| NO_WORKFLOW_FOUND.to_string()),
            ));
        }

        let workflow_graph = present(self.workflow);
        let api_prompt = present(self.prompt);
        if workflow_graph.is_none() && api_prompt.is_none() {
            return Err(ImportError::Extraction(NO_VALID_WORKFLOW_DATA.to_string()));
        }

        Ok(ExtractionSuccess {
            workflow_graph,
            api_prompt,
            info: self.info,
        })
    }
}
