//! MCP server core: registry and JSON-RPC dispatcher.
//!
//! The registry holds tool, resource, and prompt definitions, populated
//! once at startup and read-only afterwards. The dispatcher routes
//! decoded JSON-RPC requests by method, validates tool arguments, and
//! produces at most one response per request (notifications produce
//! none). Transports live in [`stdio`] and [`sse`].

pub mod protocol;
pub mod sse;
pub mod stdio;
pub mod validate;

use std::collections::HashMap;

use serde_json::{json, Map, Value};

pub use protocol::*;

use protocol::error_codes;

/// Processes a tool call and returns a result. Domain failures are
/// reported in-band via `ToolResult::is_error`; an `Err` becomes a
/// JSON-RPC handler error.
pub type ToolHandler = Box<dyn Fn(&Map<String, Value>) -> crate::Result<ToolResult> + Send + Sync>;

/// Reads a resource by URI and returns its contents.
pub type ResourceHandler =
    Box<dyn Fn(&str) -> crate::Result<Vec<ResourceContent>> + Send + Sync>;

/// Generates prompt messages from arguments: `(description, messages)`.
pub type PromptHandler = Box<
    dyn Fn(&std::collections::HashMap<String, String>) -> crate::Result<(String, Vec<PromptMessage>)>
        + Send
        + Sync,
>;

/// A tool definition paired with its handler. A non-empty namespace makes
/// `<ns>.<name>` resolvable as an alias for the flat name.
pub struct Tool {
    pub definition: ToolDefinition,
    pub namespace: Option<String>,
    pub handler: ToolHandler,
}

/// A resource definition paired with its handler.
pub struct Resource {
    pub definition: ResourceDefinition,
    pub handler: ResourceHandler,
}

/// A prompt definition paired with its handler.
pub struct Prompt {
    pub definition: PromptDefinition,
    pub handler: PromptHandler,
}

/// Abstracts how JSON-RPC responses leave the dispatcher, so transports
/// can plug in their own delivery.
pub trait ResponseWriter {
    fn write_response(&mut self, response: &JsonRpcResponse) -> crate::Result<()>;
}

/// The MCP server: registries plus the method dispatch table.
pub struct McpServer {
    name: String,
    version: String,
    tools: HashMap<String, Tool>,
    tool_alias: HashMap<String, String>,
    resources: HashMap<String, Resource>,
    prompts: HashMap<String, Prompt>,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            tools: HashMap::new(),
            tool_alias: HashMap::new(),
            resources: HashMap::new(),
            prompts: HashMap::new(),
        }
    }

    /// Add a single tool, recording its namespace alias when present.
    pub fn register_tool(&mut self, tool: Tool) {
        let name = tool.definition.name.clone();
        if let Some(ns) = tool.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            self.tool_alias.insert(format!("{}.{}", ns, name), name.clone());
        }
        self.tools.insert(name, tool);
    }

    pub fn register_tools(&mut self, tools: Vec<Tool>) {
        for tool in tools {
            self.register_tool(tool);
        }
    }

    /// Remove a tool by flat name and clean up its aliases.
    pub fn unregister_tool(&mut self, name: &str) {
        self.tools.remove(name);
        self.tool_alias.retain(|_, flat| flat != name);
    }

    pub fn register_resource(&mut self, resource: Resource) {
        self.resources
            .insert(resource.definition.uri.clone(), resource);
    }

    pub fn register_resources(&mut self, resources: Vec<Resource>) {
        for r in resources {
            self.register_resource(r);
        }
    }

    pub fn unregister_resource(&mut self, uri: &str) {
        self.resources.remove(uri);
    }

    pub fn register_prompt(&mut self, prompt: Prompt) {
        self.prompts.insert(prompt.definition.name.clone(), prompt);
    }

    pub fn register_prompts(&mut self, prompts: Vec<Prompt>) {
        for p in prompts {
            self.register_prompt(p);
        }
    }

    pub fn unregister_prompt(&mut self, name: &str) {
        self.prompts.remove(name);
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// All registered tool definitions, sorted by name for stable listings.
    pub fn tool_definitions(&self) -> Vec<&ToolDefinition> {
        let mut defs: Vec<&ToolDefinition> = self.tools.values().map(|t| &t.definition).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn resource_definitions(&self) -> Vec<&ResourceDefinition> {
        let mut defs: Vec<&ResourceDefinition> =
            self.resources.values().map(|r| &r.definition).collect();
        defs.sort_by(|a, b| a.uri.cmp(&b.uri));
        defs
    }

    pub fn prompt_definitions(&self) -> Vec<&PromptDefinition> {
        let mut defs: Vec<&PromptDefinition> =
            self.prompts.values().map(|p| &p.definition).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Resolve a tool by exact name first, then the alias map.
    pub fn find_tool(&self, name: &str) -> Option<&Tool> {
        if let Some(tool) = self.tools.get(name) {
            return Some(tool);
        }
        self.tool_alias
            .get(name)
            .and_then(|flat| self.tools.get(flat))
    }

    /// Resolve a resource by exact URI, then by URI-template match.
    pub fn find_resource(&self, uri: &str) -> Option<&Resource> {
        if let Some(resource) = self.resources.get(uri) {
            return Some(resource);
        }
        self.resources
            .iter()
            .find(|(pattern, _)| match_pattern(pattern, uri))
            .map(|(_, resource)| resource)
    }

    /// Route a request by method. Returns `None` for notifications.
    pub fn handle_request(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        match request.method.as_str() {
            "initialize" => Some(JsonRpcResponse::success(id, self.initialize_result())),
            "notifications/initialized" => None,
            "ping" => Some(JsonRpcResponse::success(id, json!({}))),
            "tools/list" => Some(JsonRpcResponse::success(
                id,
                json!({ "tools": self.tool_definitions() }),
            )),
            "tools/call" => Some(self.handle_tool_call(request)),
            "resources/list" => Some(JsonRpcResponse::success(
                id,
                json!({ "resources": self.resource_definitions() }),
            )),
            "resources/read" => Some(self.handle_resource_read(request)),
            "prompts/list" => Some(JsonRpcResponse::success(
                id,
                json!({ "prompts": self.prompt_definitions() }),
            )),
            "prompts/get" => Some(self.handle_prompt_get(request)),
            method => Some(JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("method not found: {}", method),
            )),
        }
    }

    /// Dispatch a request and hand any response to the writer.
    pub fn handle_request_with(
        &self,
        request: &JsonRpcRequest,
        writer: &mut dyn ResponseWriter,
    ) -> crate::Result<()> {
        if let Some(response) = self.handle_request(request) {
            writer.write_response(&response)?;
        }
        Ok(())
    }

    fn initialize_result(&self) -> Value {
        let mut capabilities = Map::new();
        if !self.tools.is_empty() {
            capabilities.insert("tools".to_string(), json!({}));
        }
        if !self.resources.is_empty() {
            capabilities.insert("resources".to_string(), json!({}));
        }
        if !self.prompts.is_empty() {
            capabilities.insert("prompts".to_string(), json!({}));
        }
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": capabilities,
            "serverInfo": { "name": self.name, "version": self.version },
        })
    }

    fn handle_tool_call(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        let params: CallToolParams = match request
            .params
            .clone()
            .map(serde_json::from_value)
            .transpose()
        {
            Ok(Some(p)) => p,
            _ => {
                return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "invalid params")
            }
        };
        let Some(tool) = self.find_tool(&params.name) else {
            return JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("unknown tool: {}", params.name),
            );
        };
        if let Err(msg) = validate::validate_args(&params.arguments, &tool.definition.input_schema)
        {
            return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, msg);
        }
        match (tool.handler)(&params.arguments) {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => {
                    JsonRpcResponse::error(id, error_codes::HANDLER_ERROR, e.to_string())
                }
            },
            Err(e) => JsonRpcResponse::error(id, error_codes::HANDLER_ERROR, e.to_string()),
        }
    }

    fn handle_resource_read(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        let params: ReadResourceParams = match request
            .params
            .clone()
            .map(serde_json::from_value)
            .transpose()
        {
            Ok(Some(p)) => p,
            _ => {
                return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "invalid params")
            }
        };
        let Some(resource) = self.find_resource(&params.uri) else {
            return JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("unknown resource: {}", params.uri),
            );
        };
        match (resource.handler)(&params.uri) {
            Ok(contents) => JsonRpcResponse::success(id, json!({ "contents": contents })),
            Err(e) => JsonRpcResponse::error(id, error_codes::HANDLER_ERROR, e.to_string()),
        }
    }

    fn handle_prompt_get(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        let params: GetPromptParams = match request
            .params
            .clone()
            .map(serde_json::from_value)
            .transpose()
        {
            Ok(Some(p)) => p,
            _ => {
                return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "invalid params")
            }
        };
        let Some(prompt) = self.prompts.get(&params.name) else {
            return JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("unknown prompt: {}", params.name),
            );
        };
        match (prompt.handler)(&params.arguments) {
            Ok((description, messages)) => {
                let mut result = Map::new();
                if !description.is_empty() {
                    result.insert("description".to_string(), json!(description));
                }
                result.insert("messages".to_string(), json!(messages));
                JsonRpcResponse::success(id, Value::Object(result))
            }
            Err(e) => JsonRpcResponse::error(id, error_codes::HANDLER_ERROR, e.to_string()),
        }
    }
}

/// URI-template match: equal segment counts, `{param}` segments match any
/// value, other segments must be byte-equal. No escaping or decoding.
pub fn match_pattern(pattern: &str, uri: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let uri_segments: Vec<&str> = uri.split('/').collect();
    if pattern_segments.len() != uri_segments.len() {
        return false;
    }
    pattern_segments
        .iter()
        .zip(uri_segments.iter())
        .all(|(p, u)| (p.starts_with('{') && p.ends_with('}')) || p == u)
}
