use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::{
    service::TryOnService,
    tools::{json_result, to_mcp_error},
};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecommendOutfitRequest {
    #[schemars(description = "Free-text style theme, e.g. \"business casual\"")]
    pub theme: Option<String>,
}

pub async fn recommend_outfit(
    service: &TryOnService,
    Parameters(request): Parameters<RecommendOutfitRequest>,
) -> Result<CallToolResult, McpError> {
    let theme = request.theme.unwrap_or_default();
    let recommendation = service.recommend(&theme).await.map_err(to_mcp_error)?;
    json_result(&recommendation)
}
