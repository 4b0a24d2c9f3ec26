//! End-to-end turn scenarios driven by a scripted model.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use crate::bus::EventBus;
    use crate::model::{ChatMessage, CompletionClient, ModelError, Role};
    use crate::runtime::approval::{ApprovalGate, WriteApprovalRequest};
    use crate::runtime::orchestrator::{
        Orchestrator, SessionConfig, TurnError, TurnOutcome, TurnState,
    };
    use crate::tests::{temp_workspace, ScriptedClient};

    fn orchestrator_in(
        root: &std::path::Path,
        client: ScriptedClient,
    ) -> Orchestrator<ScriptedClient> {
        Orchestrator::new(client, root, Arc::new(EventBus::new()))
    }

    async fn wait_for_pending(gate: &ApprovalGate) -> WriteApprovalRequest {
        for _ in 0..200 {
            if let Some(request) = gate.list_pending().into_iter().next() {
                return request;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no approval request arrived");
    }

    #[tokio::test]
    async fn read_request_roundtrips_file_content() {
        let ws = temp_workspace();
        std::fs::create_dir_all(ws.path().join("src")).unwrap();
        std::fs::write(ws.path().join("src/a.rs"), "pub fn alpha() {}\n").unwrap();

        let client = ScriptedClient::new(&["READ_FILE: src/a.rs", "The file defines alpha()."]);
        let orchestrator = orchestrator_in(ws.path(), client.clone());

        let outcome = orchestrator
            .send("What does src/a.rs do?", "")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Answer {
                reply: "The file defines alpha().".to_string(),
                inline_suggestion: None,
            }
        );

        let calls = client.calls();
        assert_eq!(calls.len(), 2);

        // The second call carries the assistant's request plus the injected
        // file content, and resumes with the fixed continuation prompt.
        let second = &calls[1];
        let note = second
            .iter()
            .find(|m| m.role == Role::System && m.content.contains("pub fn alpha"))
            .expect("file content injected as a system message");
        assert!(note.content.contains("Content of src/a.rs"));
        let last = second.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "Continue based on the file content.");

        // No approval involved; the log holds the prompt and the answer.
        assert!(orchestrator.approvals().list_pending().is_empty());
        let history = orchestrator.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].content, "The file defines alpha().");
        assert_eq!(orchestrator.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn write_request_waits_for_approval_before_touching_disk() {
        let ws = temp_workspace();
        let client = ScriptedClient::new(&["WRITE_FILE: out.txt\n```\nhello\n```"]);
        let orchestrator = Arc::new(orchestrator_in(ws.path(), client));
        let approvals = orchestrator.approvals();

        let task = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.send("write hello", "").await }
        });

        let request = wait_for_pending(&approvals).await;
        assert_eq!(request.path, "out.txt");
        assert_eq!(request.content, "hello\n");
        assert!(!ws.path().join("out.txt").exists());
        assert_eq!(orchestrator.state(), TurnState::AwaitingApproval);

        approvals.resolve(&request.id, true).unwrap();
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::WriteApplied {
                path: "out.txt".to_string()
            }
        );
        assert_eq!(
            std::fs::read_to_string(ws.path().join("out.txt")).unwrap(),
            "hello\n"
        );
        assert_eq!(
            orchestrator.history().last().unwrap().content,
            "File written: out.txt"
        );
        assert_eq!(orchestrator.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn rejected_write_leaves_no_trace() {
        let ws = temp_workspace();
        let client = ScriptedClient::new(&["WRITE_FILE: out.txt\n```\nhello\n```"]);
        let orchestrator = Arc::new(orchestrator_in(ws.path(), client));
        let approvals = orchestrator.approvals();

        let task = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.send("write hello", "").await }
        });

        let request = wait_for_pending(&approvals).await;
        approvals.resolve(&request.id, false).unwrap();

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::WriteRejected {
                path: "out.txt".to_string()
            }
        );
        assert!(!ws.path().join("out.txt").exists());

        // Only the optimistically recorded prompt remains.
        let history = orchestrator.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
    }

    #[tokio::test]
    async fn read_escape_is_denied_without_file_access() {
        let ws = temp_workspace();
        let root = ws.path().join("project");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(ws.path().join("secret.txt"), "s3cr3t").unwrap();

        let client = ScriptedClient::new(&["READ_FILE: ../secret.txt", "understood"]);
        let orchestrator = orchestrator_in(&root, client.clone());

        orchestrator.send("read the secret", "").await.unwrap();

        let second = &client.calls()[1];
        let note = second
            .iter()
            .find(|m| m.role == Role::System && m.content.contains("../secret.txt"))
            .expect("denial note injected");
        assert!(note.content.contains("access denied"), "{}", note.content);
        assert!(!note.content.contains("s3cr3t"));
    }

    #[tokio::test]
    async fn transport_failure_keeps_the_prompt_for_retry() {
        let ws = temp_workspace();
        let client = ScriptedClient::from_results(vec![
            Err(ModelError::Upstream {
                status: 500,
                body: "boom".to_string(),
            }),
            Ok("recovered".to_string()),
        ]);
        let orchestrator = orchestrator_in(ws.path(), client);

        let err = orchestrator.send("hello", "").await.unwrap_err();
        assert!(matches!(
            err,
            TurnError::Model(ModelError::Upstream { status: 500, .. })
        ));
        assert_eq!(orchestrator.state(), TurnState::Idle);

        let history = orchestrator.history();
        assert_eq!(history.last().unwrap().role, Role::User);
        assert_eq!(history.last().unwrap().content, "hello");

        // Resubmitting the same prompt is the recovery path.
        let outcome = orchestrator.send("hello", "").await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Answer { .. }));
    }

    #[tokio::test]
    async fn read_loop_hits_the_recursion_cap() {
        let ws = temp_workspace();
        std::fs::write(ws.path().join("a.txt"), "a").unwrap();

        let client =
            ScriptedClient::new(&["READ_FILE: a.txt", "READ_FILE: a.txt", "READ_FILE: a.txt"]);
        let config = SessionConfig {
            max_tool_hops: 2,
            ..SessionConfig::default()
        };
        let orchestrator = Orchestrator::with_config(
            client.clone(),
            ws.path(),
            Arc::new(EventBus::new()),
            config,
        );

        let err = orchestrator.send("loop forever", "").await.unwrap_err();
        assert!(matches!(err, TurnError::RecursionLimitExceeded(2)));
        assert_eq!(client.calls().len(), 3);
        assert_eq!(orchestrator.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn command_directive_is_inert() {
        let ws = temp_workspace();
        let client = ScriptedClient::new(&["RUN_COMMAND: cargo test"]);
        let orchestrator = orchestrator_in(ws.path(), client);

        let outcome = orchestrator.send("run the tests", "").await.unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Answer {
                reply: "RUN_COMMAND: cargo test".to_string(),
                inline_suggestion: None,
            }
        );
    }

    #[tokio::test]
    async fn plain_answer_surfaces_first_code_block_as_suggestion() {
        let ws = temp_workspace();
        let client = ScriptedClient::new(&["Try this:\n```rust\nfn main() {}\n```"]);
        let orchestrator = orchestrator_in(ws.path(), client);

        let outcome = orchestrator.send("improve", "fn main(){}").await.unwrap();
        let TurnOutcome::Answer {
            inline_suggestion, ..
        } = outcome
        else {
            panic!("expected answer");
        };
        assert_eq!(inline_suggestion.as_deref(), Some("fn main() {}"));
    }

    struct BlockingClient {
        release: Arc<tokio::sync::Notify>,
    }

    impl CompletionClient for BlockingClient {
        fn model_id(&self) -> String {
            "blocking".to_string()
        }

        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, ModelError> {
            self.release.notified().await;
            Ok("done".to_string())
        }
    }

    #[tokio::test]
    async fn second_send_while_in_flight_is_busy() {
        let ws = temp_workspace();
        let release = Arc::new(tokio::sync::Notify::new());
        let orchestrator = Arc::new(Orchestrator::new(
            BlockingClient {
                release: Arc::clone(&release),
            },
            ws.path(),
            Arc::new(EventBus::new()),
        ));

        let task = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.send("first", "").await }
        });

        // Wait until the first turn reaches the model call.
        while orchestrator.state() == TurnState::Idle {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let err = orchestrator.send("second", "").await.unwrap_err();
        assert!(matches!(err, TurnError::Busy));

        release.notify_one();
        let outcome = task.await.unwrap().unwrap();
        assert!(matches!(outcome, TurnOutcome::Answer { .. }));

        // Only the first turn made it into the log.
        let history = orchestrator.history();
        assert_eq!(history.first().unwrap().content, "first");
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn reset_clears_history() {
        let ws = temp_workspace();
        let client = ScriptedClient::new(&["fine"]);
        let orchestrator = orchestrator_in(ws.path(), client);

        orchestrator.send("hi", "").await.unwrap();
        assert_eq!(orchestrator.history().len(), 2);

        orchestrator.reset();
        assert!(orchestrator.history().is_empty());
    }

    #[tokio::test]
    async fn reset_cancels_a_pending_write() {
        let ws = temp_workspace();
        let client = ScriptedClient::new(&["WRITE_FILE: out.txt\n```\nhello\n```"]);
        let orchestrator = Arc::new(orchestrator_in(ws.path(), client));
        let approvals = orchestrator.approvals();

        let task = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.send("write", "").await }
        });
        wait_for_pending(&approvals).await;

        orchestrator.reset();
        let outcome = task.await.unwrap().unwrap();
        assert!(matches!(outcome, TurnOutcome::WriteRejected { .. }));
        assert!(!ws.path().join("out.txt").exists());
    }

    #[tokio::test]
    async fn restored_history_is_sent_to_the_model() {
        let ws = temp_workspace();
        let client = ScriptedClient::new(&["ok"]);
        let orchestrator = orchestrator_in(ws.path(), client.clone());

        orchestrator
            .load_history(&[
                r#"{"role":"user","content":"earlier question"}"#,
                r#"{"role":"assistant","content":"earlier answer"}"#,
            ])
            .unwrap();

        orchestrator.send("follow-up", "").await.unwrap();

        let first_call = &client.calls()[0];
        assert!(first_call
            .iter()
            .any(|m| m.role == Role::Assistant && m.content == "earlier answer"));
    }
}
