//! Per-conversation state: history, active document and the request gate.

use crate::classifier::classify;
use crate::context::{build_request, extract_reply};
use crate::doc_processor::Document;
use crate::error::ChatError;
use crate::llm::{ChatMessage, ChatTransport, StreamChunk};
use crate::prompts::AUTO_ANALYSIS_PROMPT;

#[derive(Debug, Clone)]
struct ActiveDocument {
    document: Document,
    is_medical: bool,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    document: Option<ActiveDocument>,
    loading: bool,
    /// Id of the document the auto-analysis already ran for.
    auto_analyzed: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref().map(|d| &d.document)
    }

    pub fn is_medical(&self) -> bool {
        self.document.as_ref().is_some_and(|d| d.is_medical)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Make `document` the active one and return its verdict.
    ///
    /// A document with a new id starts a new conversation; loading the same id
    /// again changes nothing.
    pub fn load_document(&mut self, document: Document) -> bool {
        if let Some(active) = &self.document {
            if active.document.id == document.id {
                return active.is_medical;
            }
        }

        let is_medical = classify(&document.text);
        tracing::info!(id = %document.id, name = %document.name, is_medical, "document loaded");

        self.messages.clear();
        self.auto_analyzed = None;
        self.document = Some(ActiveDocument {
            document,
            is_medical,
        });
        is_medical
    }

    pub fn clear_document(&mut self) {
        if let Some(active) = self.document.take() {
            tracing::info!(id = %active.document.id, "document cleared");
        }
        self.auto_analyzed = None;
    }

    /// The synthetic opening turn for a freshly loaded medical report.
    ///
    /// Yields the prompt at most once per document id, and only while the
    /// conversation is still empty and idle.
    pub fn take_auto_analysis(&mut self) -> Option<&'static str> {
        let active = self.document.as_ref()?;
        if !active.is_medical || !self.messages.is_empty() || self.loading {
            return None;
        }
        if self.auto_analyzed.as_deref() == Some(active.document.id.as_str()) {
            return None;
        }

        self.auto_analyzed = Some(active.document.id.clone());
        tracing::info!(id = %active.document.id, "auto-analysing medical report");
        Some(AUTO_ANALYSIS_PROMPT)
    }

    /// Record the user turn and return the payload to send.
    pub fn begin_turn(&mut self, content: &str) -> Result<Vec<ChatMessage>, ChatError> {
        if self.loading {
            return Err(ChatError::Busy);
        }
        if content.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let user_message = ChatMessage::user(content);
        let payload = build_request(&self.messages, user_message.clone(), self.document());
        self.messages.push(user_message);
        self.loading = true;
        Ok(payload)
    }

    /// Close the outstanding turn. Failures leave the history untouched.
    pub fn finish_turn(
        &mut self,
        reply: Result<ChatMessage, ChatError>,
    ) -> Result<ChatMessage, ChatError> {
        self.loading = false;
        match reply {
            Ok(message) => {
                self.messages.push(message.clone());
                Ok(message)
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat turn failed");
                Err(e)
            }
        }
    }

    pub async fn send(
        &mut self,
        transport: &dyn ChatTransport,
        content: &str,
    ) -> Result<ChatMessage, ChatError> {
        let payload = self.begin_turn(content)?;
        let reply = match transport.send(&payload).await {
            Ok(raw) => extract_reply(&raw),
            Err(e) => Err(e.into()),
        };
        self.finish_turn(reply)
    }

    pub async fn send_streaming(
        &mut self,
        transport: &dyn ChatTransport,
        content: &str,
        on_chunk: &(dyn Fn(StreamChunk) + Send + Sync),
    ) -> Result<ChatMessage, ChatError> {
        let payload = self.begin_turn(content)?;
        let reply = match transport.send_stream(&payload, on_chunk).await {
            Ok(text) if text.is_empty() => Err(ChatError::MalformedResponse(
                "stream carried no content".into(),
            )),
            Ok(text) => Ok(ChatMessage::assistant(text)),
            Err(e) => Err(e.into()),
        };
        self.finish_turn(reply)
    }
}
