// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! End-to-end tests for the chat flow: configuration on disk, composition,
//! streaming, buffer rewriting, and manifest synchronization.

use std::path::PathBuf;

use async_trait::async_trait;
use tempfile::TempDir;

use refit::config::load_workspace_settings;
use refit::config::merge_settings;
use refit::handler::{ChatHandler, ChatRequest};
use refit::manifest::{sync_commands, CommandEntry};
use refit::stream::{replace_with_stream, CollectingSink, EditBuffer, TextBuffer};
use refit::types::{
    FragmentStream, PromptMessage, Provider, Reference, RequestOptions,
};
use refit::ProviderError;

/// Provider that replays fixed fragments and records the last message
/// sequence it received.
struct ReplayProvider {
    fragments: Vec<String>,
    seen: std::sync::Mutex<Vec<PromptMessage>>,
}

impl ReplayProvider {
    fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Provider for ReplayProvider {
    async fn stream_chat(
        &self,
        messages: &[PromptMessage],
        _options: &RequestOptions,
    ) -> Result<FragmentStream, ProviderError> {
        *self.seen.lock().unwrap() = messages.to_vec();
        Ok(FragmentStream::preloaded(
            self.fragments.iter().cloned().map(Ok).collect(),
        ))
    }

    fn name(&self) -> &str {
        "Replay"
    }

    fn model(&self) -> &str {
        "replay-1"
    }
}

fn workspace_with_config(json: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join(".refit.json"), json).unwrap();
    temp
}

#[tokio::test]
async fn command_turn_uses_workspace_override() {
    let temp = workspace_with_config(
        r#"{"prompts": {"refactor_function": "Use my house style instead."}}"#,
    );
    let settings = merge_settings(None, load_workspace_settings(temp.path()).unwrap());

    let provider = ReplayProvider::new(&["refactored"]);
    let seen_handle = std::sync::Arc::new(provider);

    // ChatHandler owns a boxed provider, so capture the messages through a
    // shared wrapper.
    struct Shared(std::sync::Arc<ReplayProvider>);

    #[async_trait]
    impl Provider for Shared {
        async fn stream_chat(
            &self,
            messages: &[PromptMessage],
            options: &RequestOptions,
        ) -> Result<FragmentStream, ProviderError> {
            self.0.stream_chat(messages, options).await
        }
        fn name(&self) -> &str {
            self.0.name()
        }
        fn model(&self) -> &str {
            self.0.model()
        }
    }

    let handler = ChatHandler::new(Box::new(Shared(seen_handle.clone())));
    let mut sink = CollectingSink::new();
    let request = ChatRequest {
        command: "refactor_function".to_string(),
        prompt: "tidy up".to_string(),
        active_document: Some(Reference::new("lib.rs", "rust", "fn f() {}")),
        ..Default::default()
    };

    let outcome = handler.handle(&request, &settings, &mut sink).await.unwrap();
    assert_eq!(outcome.command, "refactor_function");
    assert_eq!(sink.output(), "refactored");

    let messages = seen_handle.seen.lock().unwrap().clone();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].content, "Use my house style instead.");
    assert_eq!(messages[1].content, "tidy up");
    assert!(messages[2].content.starts_with("# LIB.RS CONTEXT"));
}

#[tokio::test]
async fn attachments_reach_the_composed_sequence_in_order() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("first.rs");
    let second = temp.path().join("second.py");
    std::fs::write(&first, "fn one() {}").unwrap();
    std::fs::write(&second, "def two(): pass").unwrap();

    let provider = std::sync::Arc::new(ReplayProvider::new(&["ok"]));

    struct Shared(std::sync::Arc<ReplayProvider>);

    #[async_trait]
    impl Provider for Shared {
        async fn stream_chat(
            &self,
            messages: &[PromptMessage],
            options: &RequestOptions,
        ) -> Result<FragmentStream, ProviderError> {
            self.0.stream_chat(messages, options).await
        }
        fn name(&self) -> &str {
            self.0.name()
        }
        fn model(&self) -> &str {
            self.0.model()
        }
    }

    let handler = ChatHandler::new(Box::new(Shared(provider.clone())));
    let mut sink = CollectingSink::new();
    let request = ChatRequest {
        command: "refactor_components".to_string(),
        prompt: "split these".to_string(),
        attachments: vec![first, second],
        active_document: None,
    };

    handler
        .handle(&request, &Default::default(), &mut sink)
        .await
        .unwrap();

    let messages = provider.seen.lock().unwrap().clone();
    // template + query + two references
    assert_eq!(messages.len(), 4);
    assert!(messages[2].content.starts_with("# FIRST.RS CONTEXT"));
    assert!(messages[3].content.starts_with("# SECOND.PY CONTEXT"));
}

#[tokio::test]
async fn buffer_rewrite_survives_mid_stream_failure() {
    let stream = FragmentStream::preloaded(vec![
        Ok("fn better() {}".to_string()),
        Err(ProviderError::StreamError("network interruption".to_string())),
    ]);
    let mut buffer = TextBuffer::from_text("fn worse() {}");

    replace_with_stream(&mut buffer, stream).await.unwrap();

    let contents = buffer.contents();
    assert!(contents.starts_with("fn better() {}"));
    assert!(contents.contains("network interruption"));
    assert!(!contents.contains("fn worse"));
}

#[test]
fn manifest_sync_end_to_end() {
    let temp = workspace_with_config(
        r#"{"prompts": {"a": "new", "b": "desc-b", "ignored": 7}}"#,
    );
    let settings = merge_settings(None, load_workspace_settings(temp.path()).unwrap());

    let manifest_path: PathBuf = temp.path().join("package.json");
    std::fs::write(
        &manifest_path,
        serde_json::to_string_pretty(&serde_json::json!({
            "contributes": {
                "chatParticipants": [{
                    "commands": [{"name": "a", "description": "old"}],
                }],
            },
        }))
        .unwrap(),
    )
    .unwrap();

    let entries = sync_commands(&manifest_path, &settings).unwrap();
    assert_eq!(
        entries,
        vec![
            CommandEntry {
                name: "a".to_string(),
                description: "new".to_string()
            },
            CommandEntry {
                name: "b".to_string(),
                description: "desc-b".to_string()
            },
        ]
    );

    // Running the sync again is a no-op.
    let again = sync_commands(&manifest_path, &settings).unwrap();
    assert_eq!(again, entries);
}
