//! MCP server exposing the documentation search tools over stdio.

use crate::state::DocsetState;
use crate::tools::find::{FindRequest, handle_find};
use crate::tools::search::{SearchRequest, handle_search};
use crate::tools::sections::handle_sections;
use crate::tools::set_docset::{SetDocsetRequest, handle_set_docset};
use crate::tools::validate::{ValidateRequest, handle_validate};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct DocsetServer {
    state: Arc<DocsetState>,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for DocsetServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocsetServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl DocsetServer {
    pub fn new(state: Arc<DocsetState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    pub const fn state(&self) -> &Arc<DocsetState> {
        &self.state
    }

    #[tool(
        description = "Open a generated HTML documentation tree. Accepts the HTML directory that contains search/, or the search/ directory itself, and lists its search sections."
    )]
    async fn set_docset(
        &self,
        Parameters(request): Parameters<SetDocsetRequest>,
    ) -> std::result::Result<String, String> {
        handle_set_docset(&self.state, request).await
    }

    #[tool(
        description = "Prefix search with the same rules as the documentation's search box: the query is lowercased and escaped, and every entry whose token starts with it is returned in table order with its target URLs.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request).await
    }

    #[tool(
        description = "Keyword search over entry labels using TF-IDF with stemming and snake_case/CamelCase splitting. Suggests similar labels when nothing matches.",
        input_schema = inline_schema_for_type::<FindRequest>()
    )]
    async fn find(
        &self,
        Parameters(request): Parameters<FindRequest>,
    ) -> std::result::Result<String, String> {
        handle_find(&self.state, request).await
    }

    #[tool(
        description = "Check search tables for malformed tokens, missing targets, invalid or duplicate target URLs, and entries filed under the wrong bucket. Checks every table, or one file.",
        input_schema = inline_schema_for_type::<ValidateRequest>()
    )]
    async fn validate(
        &self,
        Parameters(request): Parameters<ValidateRequest>,
    ) -> std::result::Result<String, String> {
        handle_validate(&self.state, request).await
    }

    #[tool(description = "List the search sections of the active documentation tree with their bucket characters.")]
    async fn sections(&self) -> std::result::Result<String, String> {
        handle_sections(&self.state).await
    }
}

#[tool_handler]
impl ServerHandler for DocsetServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "doxysearch: searches the generated search index of a Doxygen HTML documentation tree. \
                 Use set_docset with the HTML directory first unless docs_root is configured. \
                 search follows the search box's prefix rules; find ranks entries by keywords.",
            )
    }
}

/// Inline JSON schema for tool parameters, without `$ref` indirection.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    match serde_json::to_value(schema) {
        Ok(serde_json::Value::Object(object)) => Arc::new(object),
        _ => Arc::new(JsonObject::new()),
    }
}
