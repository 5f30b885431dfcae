//! LSP protocol handler implementations
//!
//! - Lifecycle (initialize, initialized, shutdown)
//! - Document sync (did_open, did_change, did_save, did_close), mapped onto
//!   the session registry
//! - Setting-name completion and hover
//! - Semantic tokens from the per-session highlight cache

use tower_lsp::LanguageServer;
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionOptions, CompletionParams, CompletionResponse,
    CompletionTextEdit, DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, Documentation, Hover, HoverContents, HoverParams, HoverProviderCapability,
    InitializeParams, InitializeResult, InitializedParams, MarkupContent, MarkupKind, Range, SaveOptions,
    SemanticTokens, SemanticTokensFullOptions, SemanticTokensOptions, SemanticTokensParams,
    SemanticTokensRangeParams, SemanticTokensRangeResult, SemanticTokensResult, SemanticTokensServerCapabilities,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind, TextDocumentSyncOptions,
    TextDocumentSyncSaveOptions,
};
use tracing::{debug, info, warn};

use super::path_of;
use super::state::RobotBackend;
use super::utils::{legend, tokens_for_lines};
use crate::data::TableKind;
use crate::lsp::document::{
    apply_content_changes, from_lsp_position, start_at_caret, to_lsp_position, to_lsp_text_edit,
};
use crate::session::EditSession;

/// Setting names are looked up only in the Settings table or before any header.
fn offers_settings(session: &EditSession, line: usize, any_table: bool) -> bool {
    let table = session.table_at(line);
    if !any_table && !matches!(table, TableKind::Settings | TableKind::None) {
        debug!("No setting names in {:?} table", table);
        return false;
    }
    true
}

#[tower_lsp::async_trait]
impl LanguageServer for RobotBackend {
    /// Records the root, merges client options and lists the workspace's test data files.
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        info!("Received initialize from {:?}", params.client_info.as_ref().map(|c| &c.name));

        self.config.write().merge_init_options(params.initialization_options.as_ref());

        #[allow(deprecated)]
        let root_uri = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(|folder| folder.uri.clone())
            .or(params.root_uri);

        if let Some(root_uri) = root_uri {
            match root_uri.to_file_path() {
                Ok(root_path) => {
                    let count = self.index_workspace(&root_path);
                    info!("Found {} test data files below {}", count, root_path.display());
                    *self.root_dir.write() = Some(root_path);
                }
                Err(()) => warn!("Failed to convert root_uri to path: {}. Skipping workspace listing.", root_uri),
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::INCREMENTAL),
                    save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                        include_text: Some(false),
                    })),
                    ..Default::default()
                })),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                semantic_tokens_provider: Some(SemanticTokensServerCapabilities::SemanticTokensOptions(
                    SemanticTokensOptions {
                        legend: legend(),
                        full: Some(SemanticTokensFullOptions::Bool(true)),
                        range: Some(true),
                        ..Default::default()
                    },
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("Initialized");
        self.spawn_autosave();
    }

    /// Flushes every dirty session, then stops background tasks.
    async fn shutdown(&self) -> LspResult<()> {
        info!("Received shutdown request");
        let failures = self.sessions.lock().save_all();
        for (_, error) in &failures {
            self.report_persistence_error(error).await;
        }
        let _ = self.shutdown_tx.send(());
        info!("Shutdown signal sent to background tasks");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        info!("Opening document: URI={}, version={}", document.uri, document.version);
        let Some(path) = path_of(&document.uri) else {
            return;
        };
        self.versions.reset(&document.uri, document.version);
        let result = self.sessions.lock().open_with_text(path, &document.text);
        if let Err(e) = result {
            self.report_persistence_error(&e).await;
        }
    }

    /// Applies changes to the session and makes it the active one.
    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        debug!("textDocument/didChange: URI={}, version={}, {} changes", uri, version, params.content_changes.len());
        let Some(path) = path_of(&uri) else {
            return;
        };
        if !self.versions.advance(&uri, version) {
            return;
        }

        let result = {
            let mut sessions = self.sessions.lock();
            match sessions.get_mut(&path) {
                Some(session) => {
                    apply_content_changes(session, params.content_changes);
                    Some(sessions.activate(&path))
                }
                None => None,
            }
        };
        match result {
            Some(Ok(_)) => {}
            Some(Err(e)) => self.report_persistence_error(&e).await,
            None => warn!("Failed to find session for URI={}", uri),
        }
    }

    /// The client wrote the file itself, so the session is clean.
    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        info!("textDocument/didSave: {}", params.text_document.uri);
        let Some(path) = path_of(&params.text_document.uri) else {
            return;
        };
        if let Some(session) = self.sessions.lock().get_mut(&path) {
            session.mark_saved();
        }
    }

    /// Saves unsaved changes and forgets the session.
    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        info!("textDocument/didClose: {}", uri);
        self.versions.remove(&uri);
        let Some(path) = path_of(&uri) else {
            return;
        };
        let result = self.sessions.lock().close(&path);
        match result {
            Ok(true) => {}
            Ok(false) => warn!("Failed to find session for URI={}", uri),
            Err(e) => self.report_persistence_error(&e).await,
        }
    }

    /// Offers setting names in the Settings table (or before any header).
    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let lsp_position = params.text_document_position.position;
        debug!("Completion request at {}:{:?}", uri, lsp_position);
        let Some(path) = path_of(&uri) else {
            return Ok(None);
        };
        let any_table = self.config.read().completion_in_any_table;

        let items: Vec<CompletionItem> = {
            let sessions = self.sessions.lock();
            let Some(session) = sessions.get(&path) else {
                debug!("Document not found: {}", uri);
                return Ok(None);
            };
            let caret = from_lsp_position(session.buffer(), lsp_position);
            if !offers_settings(session, caret.line, any_table) {
                return Ok(None);
            }
            let query = session.completion_query(caret);
            self.completion
                .entries(&query.prefix)
                .map(|setting| {
                    let edit = start_at_caret(session, self.completion.accept(setting.name, &query), caret);
                    CompletionItem {
                        label: setting.name.to_string(),
                        kind: Some(CompletionItemKind::PROPERTY),
                        detail: Some("setting".to_string()),
                        documentation: Some(Documentation::String(setting.description.to_string())),
                        text_edit: Some(CompletionTextEdit::Edit(to_lsp_text_edit(session.buffer(), &edit))),
                        ..Default::default()
                    }
                })
                .collect()
        };

        debug!("Returning {} completion items", items.len());
        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }

    /// Shows the description of the setting name under the pointer.
    async fn hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let lsp_position = params.text_document_position_params.position;
        debug!("Hover request at {}:{:?}", uri, lsp_position);
        let Some(path) = path_of(&uri) else {
            return Ok(None);
        };
        let any_table = self.config.read().completion_in_any_table;

        let sessions = self.sessions.lock();
        let Some(session) = sessions.get(&path) else {
            debug!("Document not found: {}", uri);
            return Ok(None);
        };
        let position = from_lsp_position(session.buffer(), lsp_position);
        if !offers_settings(session, position.line, any_table) {
            return Ok(None);
        }
        let target = session.lookup_query(position);
        let Some(setting) = self.completion.describe(&target.prefix) else {
            debug!("No setting named {:?}", target.prefix);
            return Ok(None);
        };

        debug!("Returning hover for setting '{}'", setting.name);
        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: format!("**{}**\n\n{}", setting.name, setting.description),
            }),
            range: Some(Range::new(
                to_lsp_position(session.buffer(), target.anchor),
                to_lsp_position(session.buffer(), target.cursor()),
            )),
        }))
    }

    async fn semantic_tokens_full(&self, params: SemanticTokensParams) -> LspResult<Option<SemanticTokensResult>> {
        let uri = params.text_document.uri;
        debug!("Semantic tokens request for: {}", uri);
        let Some(path) = path_of(&uri) else {
            return Ok(None);
        };
        let sessions = self.sessions.lock();
        let Some(session) = sessions.get(&path) else {
            return Ok(None);
        };
        let data = tokens_for_lines(session.highlights(), session.buffer(), 0, usize::MAX);
        debug!("Generated {} semantic tokens", data.len());
        Ok(Some(SemanticTokensResult::Tokens(SemanticTokens { result_id: None, data })))
    }

    async fn semantic_tokens_range(
        &self,
        params: SemanticTokensRangeParams,
    ) -> LspResult<Option<SemanticTokensRangeResult>> {
        let uri = params.text_document.uri;
        let Some(path) = path_of(&uri) else {
            return Ok(None);
        };
        let sessions = self.sessions.lock();
        let Some(session) = sessions.get(&path) else {
            return Ok(None);
        };
        let data = tokens_for_lines(
            session.highlights(),
            session.buffer(),
            params.range.start.line as usize,
            params.range.end.line as usize,
        );
        Ok(Some(SemanticTokensRangeResult::Tokens(SemanticTokens { result_id: None, data })))
    }
}
