use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::{
    generation::GenerateRequest,
    service::TryOnService,
    tools::{json_result, to_mcp_error},
};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateOutfitRequest {
    #[schemars(description = "Reference photo id; the most recent upload is used when omitted")]
    pub reference_id: Option<String>,
    #[schemars(description = "Wardrobe id of the top")]
    pub top_id: String,
    #[schemars(description = "Wardrobe id of the bottom")]
    pub bottom_id: String,
    #[schemars(description = "Optional style theme passed to the generator")]
    pub theme: Option<String>,
}

pub async fn generate_outfit(
    service: &TryOnService,
    Parameters(request): Parameters<GenerateOutfitRequest>,
) -> Result<CallToolResult, McpError> {
    let request = GenerateRequest {
        reference_id: request.reference_id.filter(|id| !id.trim().is_empty()),
        top_id: request.top_id,
        bottom_id: request.bottom_id,
        theme: request.theme.unwrap_or_default(),
    };
    let outcome = service.generate(&request).await.map_err(to_mcp_error)?;
    json_result(&outcome)
}
