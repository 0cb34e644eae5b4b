use mcp::{CallToolParams, CallToolResult, Handler, ServerInfo, Tool};

use graph::GraphApi;

use crate::dispatcher::Dispatcher;

impl<C: GraphApi> Handler for Dispatcher<C> {
    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: crate::SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.catalogue().to_mcp()
    }

    async fn call_tool(&self, params: CallToolParams) -> CallToolResult {
        self.dispatch(params.into()).await.into()
    }
}
