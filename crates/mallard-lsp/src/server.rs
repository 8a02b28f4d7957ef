//! LSP server implementation using tower-lsp.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use mallard_lsp_core::{DocumentStore, LanguageService};

use crate::capabilities::server_capabilities;
use crate::convert;
use crate::settings::{self, RawSettings};

/// Configuration section pulled from the client; also the diagnostic source.
const LANGUAGE_ID: &str = "mallard";

/// Delay between a save and the validation pass it schedules. A newer save
/// for the same document cancels and replaces the pending pass.
const VALIDATION_DELAY: Duration = Duration::from_millis(200);

/// The Mallard pipeline language server.
pub struct MallardLanguageServer {
    /// The LSP client for sending notifications.
    client: Client,
    /// Open documents, full-text synced.
    documents: Arc<RwLock<DocumentStore>>,
    /// The engine: schema catalog plus settings.
    service: Arc<RwLock<LanguageService>>,
    /// Pending validation task per document, last-write-wins.
    pending: Mutex<HashMap<Url, JoinHandle<()>>>,
}

impl MallardLanguageServer {
    /// Create a new language server instance.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(RwLock::new(DocumentStore::new())),
            service: Arc::new(RwLock::new(LanguageService::new(LANGUAGE_ID))),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Schedule a debounced validation pass for a document, cancelling any
    /// pass already pending for it.
    async fn schedule_validation(&self, uri: Url) {
        let client = self.client.clone();
        let documents = Arc::clone(&self.documents);
        let service = Arc::clone(&self.service);
        let task_uri = uri.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(VALIDATION_DELAY).await;

            let published = {
                let documents = documents.read().await;
                let service = service.read().await;
                documents.get(task_uri.as_str()).map(|doc| {
                    let diagnostics = service
                        .do_validation(doc)
                        .iter()
                        .map(convert::diagnostic_to_lsp)
                        .collect::<Vec<_>>();
                    (diagnostics, doc.version())
                })
            };
            if let Some((diagnostics, version)) = published {
                client
                    .publish_diagnostics(task_uri, diagnostics, version)
                    .await;
            }
        });

        if let Some(previous) = self.pending.lock().await.insert(uri, handle) {
            previous.abort();
        }
    }

    /// Cancel a document's pending validation, if any.
    async fn cancel_validation(&self, uri: &Url) {
        if let Some(handle) = self.pending.lock().await.remove(uri) {
            handle.abort();
        }
    }

    /// Pull the `mallard` section from the client, reconfigure the engine,
    /// and re-validate every open document.
    async fn pull_configuration(&self) {
        let items = vec![ConfigurationItem {
            scope_uri: None,
            section: Some(LANGUAGE_ID.to_string()),
        }];
        let raw = match self.client.configuration(items).await {
            Ok(mut values) if !values.is_empty() => {
                serde_json::from_value::<RawSettings>(values.remove(0)).unwrap_or_default()
            }
            Ok(_) => RawSettings::default(),
            Err(err) => {
                tracing::warn!(error = %err, "configuration pull failed");
                return;
            }
        };

        let resolved = settings::resolve(&raw);
        self.service.write().await.configure(resolved);
        tracing::info!("schema catalog rebuilt from configuration");

        let uris: Vec<Url> = {
            let documents = self.documents.read().await;
            documents.uris().filter_map(|uri| uri.parse().ok()).collect()
        };
        for uri in uris {
            self.schedule_validation(uri).await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for MallardLanguageServer {
    async fn initialize(&self, _params: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "mallard-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "Mallard LSP server initialized")
            .await;
        self.pull_configuration().await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_change_configuration(&self, _params: DidChangeConfigurationParams) {
        self.pull_configuration().await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut documents = self.documents.write().await;
            documents.open(
                uri.as_str(),
                params.text_document.text,
                params.text_document.version,
            );
        }
        self.schedule_validation(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full document sync: keep the snapshot current; validation waits
        // for the next save.
        if let Some(change) = params.content_changes.into_iter().last() {
            let mut documents = self.documents.write().await;
            documents.change(
                params.text_document.uri.as_str(),
                change.text,
                params.text_document.version,
            );
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.schedule_validation(params.text_document.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.cancel_validation(&uri).await;
        {
            let mut documents = self.documents.write().await;
            documents.close(uri.as_str());
        }
        // Clear any previously published diagnostics.
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = convert::position_from_lsp(&params.text_document_position.position);
        let Some(trigger) = convert::trigger_from_context(params.context.as_ref()) else {
            return Ok(None);
        };

        let documents = self.documents.read().await;
        let Some(doc) = documents.get(uri.as_str()) else {
            return Ok(None);
        };

        let service = self.service.read().await;
        // The engine re-parses the snapshot's live text itself.
        let items = service
            .do_completion(doc, position, trigger)
            .iter()
            .map(convert::completion_item_to_lsp)
            .collect::<Vec<_>>();
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn completion_resolve(&self, item: CompletionItem) -> Result<CompletionItem> {
        let service = self.service.read().await;
        let resolved = service.do_completion_resolve(convert::completion_item_from_lsp(&item));
        Ok(convert::completion_item_to_lsp(&resolved))
    }
}

/// Run the LSP server over stdio.
pub async fn run_server() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(MallardLanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
