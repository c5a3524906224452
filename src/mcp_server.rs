use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use crate::service::TryOnService;
use crate::tools::{GenerateOutfitRequest, ListWardrobeRequest, RecommendOutfitRequest};

#[derive(Clone)]
pub struct TryOnServer {
    tool_router: ToolRouter<Self>,
    service: Arc<TryOnService>,
}

impl TryOnServer {
    pub fn new(service: Arc<TryOnService>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            service,
        }
    }
}

#[tool_router]
impl TryOnServer {
    #[tool(description = "List wardrobe items (id, type, tags, url), optionally filtered by category")]
    async fn list_wardrobe(
        &self,
        Parameters(request): Parameters<ListWardrobeRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::list_wardrobe(&self.service, Parameters(request)).await
    }

    #[tool(description = "Recommend a top and a bottom from the wardrobe for a style theme")]
    async fn recommend_outfit(
        &self,
        Parameters(request): Parameters<RecommendOutfitRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::recommend_outfit(&self.service, Parameters(request)).await
    }

    #[tool(
        description = "Generate a try-on image of the reference person wearing the given top and bottom. Identical requests return the cached image. May take a while; show the result with ![](url)"
    )]
    async fn generate_outfit(
        &self,
        Parameters(request): Parameters<GenerateOutfitRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::generate_outfit(&self.service, Parameters(request)).await
    }
}

#[tool_handler]
impl ServerHandler for TryOnServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
