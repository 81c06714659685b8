//! One request/response cycle against the model.

use std::future::Future;

use tracing::{debug, warn};

use crate::commit::message::GenerateResult;
use crate::commit::prompt::{PromptRequest, build_prompt, system_prompt};
use crate::commit::protocol::{parse_response, tool_schemas};
use crate::diff::TruncationLimits;
use crate::error::GenerateError;
use crate::llm::ChatProvider;

/// Lifecycle of the most recent generation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CycleState {
    #[default]
    Idle,
    Requesting,
    Completed,
    Failed { reason: String },
}

/// Drives generation cycles against a [`ChatProvider`].
///
/// Cycles take `&mut self`, so a session never has two requests in flight.
pub struct Generator<P: ChatProvider> {
    provider: P,
    limits: TruncationLimits,
    state: CycleState,
}

impl<P: ChatProvider> Generator<P> {
    pub fn new(provider: P, limits: TruncationLimits) -> Self {
        Self {
            provider,
            limits,
            state: CycleState::Idle,
        }
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    /// Swap in a provider and limits built from changed settings. The next
    /// cycle uses them; the state returns to idle.
    pub fn reconfigure(&mut self, provider: P, limits: TruncationLimits) {
        debug!(?limits, "Generator reconfigured");
        self.provider = provider;
        self.limits = limits;
        self.state = CycleState::Idle;
    }

    /// Run one cycle: build the prompt, issue exactly one model call and
    /// parse the structured response.
    pub async fn generate(
        &mut self,
        request: &PromptRequest,
    ) -> Result<GenerateResult, GenerateError> {
        let outcome = self.run_cycle(request).await;
        self.finish(outcome)
    }

    /// Like [`generate`](Self::generate), but gives up as soon as `cancel`
    /// resolves. A cancelled cycle yields [`GenerateError::Cancelled`] and
    /// its late response, if any, is dropped.
    pub async fn generate_until<F>(
        &mut self,
        request: &PromptRequest,
        cancel: F,
    ) -> Result<GenerateResult, GenerateError>
    where
        F: Future<Output = ()>,
    {
        let outcome = tokio::select! {
            result = self.run_cycle(request) => result,
            () = cancel => {
                debug!("Generation cancelled while waiting for the model");
                Err(GenerateError::Cancelled)
            }
        };
        self.finish(outcome)
    }

    async fn run_cycle(&mut self, request: &PromptRequest) -> Result<GenerateResult, GenerateError> {
        if request.files.is_empty() {
            return Err(GenerateError::NoFilesSelected);
        }

        self.state = CycleState::Requesting;
        let prompt = build_prompt(request, &self.limits);
        debug!(
            files = request.files.len(),
            prompt_len = prompt.len(),
            regeneration = request.is_regeneration(),
            "Requesting commit message"
        );

        let response = self
            .provider
            .complete(system_prompt(), &prompt, &tool_schemas())
            .await?;

        parse_response(&response, &request.files)
    }

    fn finish(
        &mut self,
        outcome: Result<GenerateResult, GenerateError>,
    ) -> Result<GenerateResult, GenerateError> {
        match &outcome {
            Ok(result) => {
                debug!(
                    commits = result.commits.len(),
                    split = result.is_split,
                    "Generation completed"
                );
                self.state = CycleState::Completed;
            }
            Err(err) => {
                warn!(kind = err.kind(), "Generation failed: {}", err);
                self.state = CycleState::Failed {
                    reason: err.to_string(),
                };
            }
        }
        outcome
    }
}

/// Rendered text of the commit at `index`, used as regeneration context.
pub fn previous_message_for(result: &GenerateResult, index: usize) -> Option<String> {
    result.commits.get(index).map(|commit| commit.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::message::CommitMessage;
    use crate::llm::{MockChatProvider, ModelResponse, ToolInvocation};

    fn request(files: &[&str]) -> PromptRequest {
        PromptRequest {
            files: files.iter().map(|f| f.to_string()).collect(),
            diff: "diff --git a/a.rs b/a.rs\n@@ -1 +1 @@\n-old\n+new\n".to_string(),
            conventional: true,
            types: vec!["feat".into(), "fix".into()],
            ..PromptRequest::default()
        }
    }

    fn submit(arguments: &str) -> ModelResponse {
        ModelResponse {
            tool_call: Some(ToolInvocation {
                name: "submit_commit".to_string(),
                arguments: arguments.to_string(),
            }),
            content: None,
        }
    }

    #[tokio::test]
    async fn test_generate_single_commit() {
        let mut mock = MockChatProvider::new();
        mock.expect_complete()
            .withf(|system, user, tools| {
                system.contains("split_commits")
                    && user.contains("Files changed:\n- a.rs\n")
                    && tools.len() == 2
            })
            .times(1)
            .returning(|_, _, _| Ok(submit(r#"{"type": "fix", "subject": "swap value"}"#)));

        let mut generator = Generator::new(mock, TruncationLimits::default());
        assert_eq!(generator.state(), &CycleState::Idle);

        let result = generator.generate(&request(&["a.rs"])).await.unwrap();
        assert!(!result.is_split);
        assert_eq!(result.commits[0].render(), "fix: swap value");
        assert_eq!(result.commits[0].files, vec!["a.rs"]);
        assert_eq!(generator.state(), &CycleState::Completed);
    }

    #[tokio::test]
    async fn test_reconfigure_swaps_provider_and_limits() {
        let mut failing = MockChatProvider::new();
        failing
            .expect_complete()
            .times(1)
            .returning(|_, _, _| Err(GenerateError::Transport("HTTP 401".into())));
        let mut generator = Generator::new(failing, TruncationLimits::default());
        assert!(generator.generate(&request(&["a.rs"])).await.is_err());

        let mut replacement = MockChatProvider::new();
        replacement
            .expect_complete()
            .withf(|_, user, _| user.contains("lines skipped"))
            .times(1)
            .returning(|_, _, _| Ok(submit(r#"{"type": "fix", "subject": "swap value"}"#)));
        let limits = TruncationLimits {
            show_lines: 1,
            ..TruncationLimits::default()
        };
        generator.reconfigure(replacement, limits);
        assert_eq!(generator.state(), &CycleState::Idle);

        let result = generator.generate(&request(&["a.rs"])).await.unwrap();
        assert_eq!(result.commits[0].render(), "fix: swap value");
        assert_eq!(generator.state(), &CycleState::Completed);
    }

    #[tokio::test]
    async fn test_no_files_rejected_before_provider_call() {
        let mut mock = MockChatProvider::new();
        mock.expect_complete().times(0);

        let mut generator = Generator::new(mock, TruncationLimits::default());
        let err = generator.generate(&request(&[])).await.unwrap_err();
        assert!(matches!(err, GenerateError::NoFilesSelected));
        assert!(matches!(generator.state(), CycleState::Failed { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let mut mock = MockChatProvider::new();
        mock.expect_complete()
            .times(1)
            .returning(|_, _, _| Err(GenerateError::Transport("connection refused".into())));

        let mut generator = Generator::new(mock, TruncationLimits::default());
        let err = generator.generate(&request(&["a.rs"])).await.unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert_eq!(
            generator.state(),
            &CycleState::Failed {
                reason: "AI request failed: connection refused".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_protocol_error_propagates() {
        let mut mock = MockChatProvider::new();
        mock.expect_complete()
            .times(1)
            .returning(|_, _, _| Ok(ModelResponse::default()));

        let mut generator = Generator::new(mock, TruncationLimits::default());
        let err = generator.generate(&request(&["a.rs"])).await.unwrap_err();
        assert!(matches!(err, GenerateError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_regeneration_sends_previous_message_and_feedback() {
        let mut mock = MockChatProvider::new();
        mock.expect_complete()
            .withf(|_, user, _| {
                user.contains("Previous message:\n```\nfix: swap value\n```")
                    && user.contains("User feedback: mention the parser")
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(submit(r#"{"type": "fix", "scope": "parser", "subject": "swap value"}"#))
            });

        let first = GenerateResult::single(
            CommitMessage {
                commit_type: "fix".into(),
                subject: "swap value".into(),
                ..CommitMessage::default()
            },
            &["a.rs".to_string()],
        );

        let mut req = request(&["a.rs"]);
        req.previous_message = previous_message_for(&first, 0);
        req.feedback = Some("mention the parser".into());

        let mut generator = Generator::new(mock, TruncationLimits::default());
        let result = generator.generate(&req).await.unwrap();
        assert_eq!(result.commits[0].render(), "fix(parser): swap value");
    }

    struct StalledProvider;

    #[async_trait::async_trait]
    impl ChatProvider for StalledProvider {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _tools: &[crate::llm::ToolSchema],
        ) -> Result<ModelResponse, GenerateError> {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            Ok(submit(r#"{"type": "feat", "subject": "too late"}"#))
        }
    }

    #[tokio::test]
    async fn test_cancel_discards_in_flight_cycle() {
        let mut generator = Generator::new(StalledProvider, TruncationLimits::default());
        let cancel = tokio::time::sleep(std::time::Duration::from_millis(20));

        let err = generator
            .generate_until(&request(&["a.rs"]), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Cancelled));
        assert!(matches!(generator.state(), CycleState::Failed { .. }));
    }

    #[tokio::test]
    async fn test_generate_until_completes_when_not_cancelled() {
        let mut mock = MockChatProvider::new();
        mock.expect_complete()
            .times(1)
            .returning(|_, _, _| Ok(submit(r#"{"type": "feat", "subject": "in time"}"#)));

        let mut generator = Generator::new(mock, TruncationLimits::default());
        let result = generator
            .generate_until(&request(&["a.rs"]), std::future::pending())
            .await
            .unwrap();
        assert_eq!(result.commits[0].subject, "in time");
    }

    #[test]
    fn test_previous_message_for_out_of_range() {
        let result = GenerateResult::split(vec![CommitMessage::plain("a", vec!["x".into()])]);
        assert_eq!(previous_message_for(&result, 0).as_deref(), Some("a"));
        assert_eq!(previous_message_for(&result, 1), None);
    }
}
