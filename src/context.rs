//! Outbound payload assembly and reply unwrapping.
//!
//! Everything here is a pure transformation; the transport and the session
//! own I/O and state.

use crate::classifier::classify;
use crate::doc_processor::Document;
use crate::error::ChatError;
use crate::llm::ChatMessage;
use crate::prompts::{generic_document_prompt, medical_report_prompt};

/// System prompt for the active document, if it carries any text.
///
/// The verdict is recomputed from the text on every call.
pub fn system_prompt(document: Option<&Document>) -> Option<String> {
    let document = document?;
    if document.text.trim().is_empty() {
        return None;
    }

    let prompt = if classify(&document.text) {
        medical_report_prompt(&document.text)
    } else {
        generic_document_prompt(&document.text)
    };
    Some(prompt)
}

/// Builds the message list for one turn.
///
/// `history` must not already contain `new_user_message`.
pub fn build_request(
    history: &[ChatMessage],
    new_user_message: ChatMessage,
    document: Option<&Document>,
) -> Vec<ChatMessage> {
    let system = system_prompt(document);

    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(content) = system {
        messages.push(ChatMessage::system(content));
    }
    messages.extend_from_slice(history);
    messages.push(new_user_message);
    messages
}

/// Pulls `choices[0].message.content` out of a chat-completions body.
pub fn extract_reply(raw: &serde_json::Value) -> Result<ChatMessage, ChatError> {
    let choices = raw
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| ChatError::MalformedResponse("missing `choices` array".into()))?;

    let first = choices
        .first()
        .ok_or_else(|| ChatError::MalformedResponse("`choices` is empty".into()))?;

    let content = first
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| {
            ChatError::MalformedResponse("`choices[0].message.content` is not a string".into())
        })?;

    Ok(ChatMessage::assistant(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use crate::prompts::{MEDICAL_DISCLAIMER, MEDICAL_SECTIONS};
    use serde_json::json;

    fn document(text: &str) -> Document {
        Document {
            id: "doc-1".into(),
            name: "report.pdf".into(),
            size: 2048,
            page_count: 1,
            text: text.into(),
        }
    }

    fn history() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("Hi! How can I help?"),
        ]
    }

    #[test]
    fn no_document_passes_conversation_through() {
        let payload = build_request(&history(), ChatMessage::user("next"), None);
        assert_eq!(
            payload,
            vec![
                ChatMessage::user("hello"),
                ChatMessage::assistant("Hi! How can I help?"),
                ChatMessage::user("next"),
            ]
        );
    }

    #[test]
    fn blank_document_adds_no_system_message() {
        let doc = document("  \n\t ");
        let payload = build_request(&[], ChatMessage::user("what is this?"), Some(&doc));
        assert_eq!(payload, vec![ChatMessage::user("what is this?")]);
    }

    #[test]
    fn generic_document_is_prepended_once() {
        let text = "Quarterly sales rose by 4% in the northern region.";
        let doc = document(text);
        let payload = build_request(&history(), ChatMessage::user("summarize"), Some(&doc));

        assert_eq!(payload.len(), 4);
        assert_eq!(payload[0].role, Role::System);
        assert_eq!(payload[0].content, generic_document_prompt(text));
        assert!(payload[0].content.contains(text));
        assert_eq!(&payload[1..3], history().as_slice());
        assert_eq!(payload[3], ChatMessage::user("summarize"));
        assert_eq!(payload.iter().filter(|m| m.role == Role::System).count(), 1);
    }

    #[test]
    fn medical_document_uses_report_template() {
        let text = "Cholesterol 210 mg/dL\nGlucose 98 mg/dL\nHbA1c 5.4%";
        let doc = document(text);
        let payload = build_request(&[], ChatMessage::user("explain"), Some(&doc));

        assert_eq!(payload.len(), 2);
        let system = &payload[0];
        assert_eq!(system.role, Role::System);
        assert_eq!(system.content, medical_report_prompt(text));
        assert!(system.content.ends_with(MEDICAL_DISCLAIMER));

        let positions: Vec<usize> = MEDICAL_SECTIONS
            .iter()
            .map(|s| system.content.rfind(&format!("\n{s}:\n")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn new_message_is_appended_exactly_once() {
        let mut convo = history();
        let payload = build_request(&convo, ChatMessage::user("again"), None);
        convo.push(ChatMessage::user("again"));
        assert_eq!(payload, convo);
        assert_eq!(payload.iter().filter(|m| m.content == "again").count(), 1);
    }

    #[test]
    fn extract_reply_reads_first_choice() {
        let raw = json!({"choices": [{"message": {"role": "assistant", "content": "hi"}}]});
        assert_eq!(extract_reply(&raw).unwrap(), ChatMessage::assistant("hi"));
    }

    #[test]
    fn extract_reply_rejects_empty_choices() {
        let err = extract_reply(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, ChatError::MalformedResponse(_)));
    }

    #[test]
    fn extract_reply_rejects_other_shapes() {
        for raw in [
            json!({}),
            json!({"choices": "nope"}),
            json!({"choices": [{"message": {}}]}),
            json!({"choices": [{"message": {"content": null}}]}),
            json!({"error": {"message": "rate limited"}}),
        ] {
            assert!(
                matches!(extract_reply(&raw), Err(ChatError::MalformedResponse(_))),
                "accepted {raw}"
            );
        }
    }
}
