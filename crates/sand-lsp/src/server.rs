use rustc_hash::FxHashMap;
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CompletionOptions, CompletionParams, CompletionResponse, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, GotoDefinitionParams,
    GotoDefinitionResponse, Hover, HoverContents, HoverParams, HoverProviderCapability,
    InitializeParams, InitializeResult, InitializedParams, Location, MarkupContent, MarkupKind,
    MessageType, OneOf, Position, ServerCapabilities, ServerInfo, TextDocumentSyncCapability,
    TextDocumentSyncKind, Url,
};
use tower_lsp::{Client, LanguageServer};

use crate::analysis;
use crate::diagnostics::diagnostics;
use crate::position::{position_to_offset, span_to_range};

#[derive(Debug)]
pub struct SandServer {
    client: Client,
    documents: Mutex<FxHashMap<Url, String>>,
}

impl SandServer {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Mutex::new(FxHashMap::default()),
        }
    }

    async fn publish_diagnostics(&self, uri: Url, text: &str) {
        let diagnostics = diagnostics(text);
        tracing::debug!(%uri, count = diagnostics.len(), "publishing diagnostics");
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }

    /// Current text of `uri` and the byte offset of `position` in it
    async fn text_at(&self, uri: &Url, position: Position) -> Option<(String, usize)> {
        let documents = self.documents.lock().await;
        let text = documents.get(uri)?;
        let offset = position_to_offset(text, position)?;
        Some((text.clone(), offset))
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for SandServer {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "sand".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string(), "/".to_string()]),
                    ..CompletionOptions::default()
                }),
                ..ServerCapabilities::default()
            },
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("language server initialized");
        self.client
            .log_message(MessageType::INFO, "sand language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("language server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        self.documents.lock().await.insert(uri.clone(), text.clone());

        tracing::debug!(%uri, "opened");
        self.client
            .log_message(MessageType::INFO, format!("file opened: {uri}"))
            .await;
        self.publish_diagnostics(uri, &text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // full sync: the last change carries the whole text
        let Some(text) = params.content_changes.into_iter().last().map(|change| change.text)
        else {
            tracing::warn!(%uri, version, "change without content");
            self.client
                .log_message(MessageType::WARNING, format!("change without content: {uri}"))
                .await;
            return;
        };

        self.documents.lock().await.insert(uri.clone(), text.clone());
        tracing::debug!(%uri, version, "changed");
        self.publish_diagnostics(uri, &text).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.lock().await.remove(&uri);

        tracing::debug!(%uri, "closed");
        self.client
            .log_message(MessageType::INFO, format!("file closed: {uri}"))
            .await;
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let request = params.text_document_position_params;
        let Some((text, offset)) = self
            .text_at(&request.text_document.uri, request.position)
            .await
        else {
            return Ok(None);
        };

        Ok(analysis::hover(&text, offset).map(|(value, span)| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            }),
            range: Some(span_to_range(&text, span)),
        }))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let request = params.text_document_position_params;
        let uri = request.text_document.uri;
        let Some((text, offset)) = self.text_at(&uri, request.position).await else {
            return Ok(None);
        };

        Ok(analysis::definition(&text, offset).map(|span| {
            GotoDefinitionResponse::Scalar(Location::new(uri, span_to_range(&text, span)))
        }))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let request = params.text_document_position;
        let Some((text, offset)) = self
            .text_at(&request.text_document.uri, request.position)
            .await
        else {
            return Ok(None);
        };

        let items = analysis::completions(&text, offset);
        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }
}
