//! Language server for Sand documents
//!
//! Documents are kept whole (full sync) and reparsed on every request.

pub mod analysis;
pub mod diagnostics;
pub mod position;
mod server;

pub use server::SandServer;

use tower_lsp::{LspService, Server};

/// Serve the language server over stdin and stdout until the client exits
pub async fn serve_stdio() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(SandServer::new);
    tracing::info!("serving language server on stdio");
    Server::new(stdin, stdout, socket).serve(service).await;
}
