pub mod generate_outfit;
pub mod list_wardrobe;
pub mod recommend_outfit;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::TryOnError;

pub use generate_outfit::{GenerateOutfitRequest, generate_outfit};
pub use list_wardrobe::{ListWardrobeRequest, list_wardrobe};
pub use recommend_outfit::{RecommendOutfitRequest, recommend_outfit};

/// User input problems become `invalid_params`; everything else is internal
/// and carries whether a later retry may succeed.
pub fn to_mcp_error(err: TryOnError) -> McpError {
    if err.is_user_error() {
        return McpError::invalid_params(err.to_string(), None);
    }
    let retryable = matches!(err, TryOnError::ProviderRetryable(_));
    McpError::internal_error(
        err.to_string(),
        Some(serde_json::json!({ "retryable": retryable })),
    )
}

pub fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string(value).map_err(|err| {
        McpError::internal_error(
            "serialize tool response failed",
            Some(serde_json::Value::String(err.to_string())),
        )
    })?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
