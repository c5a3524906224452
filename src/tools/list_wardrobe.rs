use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::{
    models::Category,
    service::TryOnService,
    tools::{json_result, to_mcp_error},
};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListWardrobeRequest {
    #[schemars(description = "Filter by category: top, bottom or all (default)")]
    pub category: Option<String>,
}

pub async fn list_wardrobe(
    service: &TryOnService,
    Parameters(request): Parameters<ListWardrobeRequest>,
) -> Result<CallToolResult, McpError> {
    let category = match request.category.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(Category::parse(raw).map_err(to_mcp_error)?),
    };
    let items = service.list_clothing(category).await.map_err(to_mcp_error)?;
    json_result(&items)
}
