//! Sends submitted commands to the remote executor, one at a time, and
//! folds each response back into the transcript.
//!
//! A submission runs in two halves. [`CommandDispatcher::submit`] records and
//! echoes the command, then spawns the executor call and returns right away.
//! The spawned task reports through [`AppEvent::CommandCompleted`], and the
//! event loop hands that to [`CommandDispatcher::complete`], the only place
//! where a response touches the transcript or the session path.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use webpi_protocol::ExecuteCommandRequest;
use webpi_protocol::ExecuteCommandResponse;
use webpi_protocol::LineKind;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::terminal_session::TerminalState;

/// Remote side of the terminal: runs one command line and reports the result.
pub trait CommandExecutor: Send + Sync + 'static {
    fn execute(
        &self,
        request: ExecuteCommandRequest,
    ) -> impl Future<Output = Result<ExecuteCommandResponse, ExecutorError>> + Send;
}

/// Transport-level failures. Application errors travel inside
/// [`ExecuteCommandResponse::error`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("{0}")]
    Transport(String),
    #[error("server responded with status {status}")]
    Status { status: u16 },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("no response after {}s", .0.as_secs())]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("`{command}` is still running")]
    RequestPending { command: String },
}

/// What `submit` did with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank command: no history, no echo, no network; a fresh prompt is already shown.
    Skipped,
    /// Sent to the executor; a completion with this id will follow.
    Dispatched { request_id: u64 },
}

/// The one executor call that may be outstanding.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    id: u64,
    command: String,
    started_at: Instant,
}

impl PendingRequest {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[derive(Debug)]
pub struct CommandCompletion {
    pub request_id: u64,
    pub result: Result<ExecuteCommandResponse, ExecutorError>,
}

pub struct CommandDispatcher<E> {
    executor: Arc<E>,
    app_event_tx: AppEventSender,
    pending: Option<PendingRequest>,
    next_request_id: u64,
}

impl<E: CommandExecutor> CommandDispatcher<E> {
    pub fn new(executor: Arc<E>, app_event_tx: AppEventSender) -> Self {
        Self {
            executor,
            app_event_tx,
            pending: None,
            next_request_id: 1,
        }
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start handling a submitted command.
    ///
    /// Rejects the submission while another request is in flight so that at
    /// most one executor call is ever outstanding.
    pub fn submit(
        &mut self,
        command: String,
        state: &mut TerminalState,
    ) -> Result<SubmitOutcome, DispatchError> {
        if let Some(pending) = &self.pending {
            return Err(DispatchError::RequestPending {
                command: pending.command.clone(),
            });
        }

        if command.trim().is_empty() {
            self.rearm(state);
            return Ok(SubmitOutcome::Skipped);
        }

        state.history.record(&command);
        state
            .transcript
            .append_command_echo(state.session.path(), &command);
        state.input.disarm();

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending = Some(PendingRequest {
            id: request_id,
            command: command.clone(),
            started_at: Instant::now(),
        });
        tracing::debug!(request_id, %command, "dispatching command");

        let executor = Arc::clone(&self.executor);
        let app_event_tx = self.app_event_tx.clone();
        tokio::spawn(async move {
            let result = executor.execute(ExecuteCommandRequest::new(command)).await;
            app_event_tx.send(AppEvent::CommandCompleted(CommandCompletion {
                request_id,
                result,
            }));
        });

        Ok(SubmitOutcome::Dispatched { request_id })
    }

    /// Reconcile a finished executor call with the transcript and session,
    /// then show the next prompt. Returns `false` for a completion that does
    /// not belong to the pending request.
    pub fn complete(&mut self, completion: CommandCompletion, state: &mut TerminalState) -> bool {
        let CommandCompletion { request_id, result } = completion;
        let Some(pending) = self.pending.take_if(|pending| pending.id == request_id) else {
            tracing::warn!(request_id, "dropping completion for unknown request");
            return false;
        };

        match result {
            Ok(response) => {
                if let Some(output) = response.output_text() {
                    state.transcript.append(output, LineKind::Output);
                }
                if let Some(error) = response.error_text() {
                    state.transcript.append(error, LineKind::Error);
                }
                state.session.apply_new_path(response.new_path_text());
            }
            Err(err) => {
                tracing::warn!(
                    request_id,
                    command = %pending.command,
                    "command request failed: {err}"
                );
                state.transcript.append(
                    format!("Error connecting to backend: {err}"),
                    LineKind::Error,
                );
            }
        }
        tracing::debug!(
            request_id,
            elapsed_ms = u64::try_from(pending.elapsed().as_millis()).unwrap_or(u64::MAX),
            "command finished"
        );

        self.rearm(state);
        true
    }

    fn rearm(&mut self, state: &mut TerminalState) {
        let region = state.transcript.append_prompt(state.session.path());
        state.input.arm(region, &mut state.transcript);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    type Reply = Result<ExecuteCommandResponse, ExecutorError>;

    /// Executor that replays canned replies and records what it was asked.
    #[derive(Default)]
    struct ScriptedExecutor {
        replies: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedExecutor {
        fn with_replies(replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            })
        }
    }

    impl CommandExecutor for ScriptedExecutor {
        async fn execute(&self, request: ExecuteCommandRequest) -> Reply {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.command);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ExecuteCommandResponse::default()))
        }
    }

    fn output(text: &str) -> Reply {
        Ok(ExecuteCommandResponse {
            output: Some(text.to_string()),
            ..Default::default()
        })
    }

    struct Fixture {
        executor: Arc<ScriptedExecutor>,
        dispatcher: CommandDispatcher<ScriptedExecutor>,
        state: TerminalState,
        rx: UnboundedReceiver<AppEvent>,
    }

    impl Fixture {
        fn new(replies: Vec<Reply>) -> Self {
            let executor = ScriptedExecutor::with_replies(replies);
            let (tx, rx) = unbounded_channel();
            let dispatcher =
                CommandDispatcher::new(Arc::clone(&executor), AppEventSender::new(tx));
            let mut state = TerminalState::new("pi@webpi");
            let region = state.transcript.append_prompt(state.session.path());
            state.input.arm(region, &mut state.transcript);
            Self {
                executor,
                dispatcher,
                state,
                rx,
            }
        }

        async fn run(&mut self, command: &str) {
            let outcome = self
                .dispatcher
                .submit(command.to_string(), &mut self.state)
                .expect("submit");
            if let SubmitOutcome::Dispatched { .. } = outcome {
                let AppEvent::CommandCompleted(completion) =
                    self.rx.recv().await.expect("completion");
                assert!(self.dispatcher.complete(completion, &mut self.state));
            }
        }

        fn lines(&self) -> Vec<(String, LineKind)> {
            self.state
                .transcript
                .snapshot()
                .into_iter()
                .map(|line| (line.text().to_string(), line.kind()))
                .collect()
        }
    }

    fn prompt(text: &str) -> (String, LineKind) {
        (text.to_string(), LineKind::Prompt)
    }

    #[tokio::test]
    async fn ls_echoes_outputs_and_reprompts() {
        let mut f = Fixture::new(vec![output("file.txt")]);
        f.run("ls").await;

        assert_eq!(
            f.lines(),
            vec![
                prompt("pi@webpi:~$ "),
                ("pi@webpi:~$ ls".to_string(), LineKind::CommandEcho),
                ("file.txt".to_string(), LineKind::Output),
                prompt("pi@webpi:~$ "),
            ]
        );
        assert_eq!(*f.executor.requests.lock().unwrap(), vec!["ls".to_string()]);
        assert!(!f.dispatcher.is_pending());
        assert!(f.state.input.is_armed());
    }

    #[tokio::test]
    async fn new_path_moves_the_next_prompt() {
        let mut f = Fixture::new(vec![Ok(ExecuteCommandResponse {
            new_path: Some("/tmp".to_string()),
            ..Default::default()
        })]);
        f.run("cd /tmp").await;

        assert_eq!(f.state.session.path(), "/tmp");
        assert_eq!(f.lines().last(), Some(&prompt("pi@webpi:/tmp$ ")));
    }

    #[tokio::test]
    async fn error_and_output_are_both_rendered_in_order() {
        let mut f = Fixture::new(vec![Ok(ExecuteCommandResponse {
            output: Some("partial".to_string()),
            error: Some("cat: missing: No such file or directory".to_string()),
            new_path: None,
        })]);
        f.run("cat missing").await;

        assert_eq!(
            f.lines()[2..],
            [
                ("partial".to_string(), LineKind::Output),
                (
                    "cat: missing: No such file or directory".to_string(),
                    LineKind::Error
                ),
                prompt("pi@webpi:~$ "),
            ]
        );
        assert_eq!(f.state.session.path(), "~");
    }

    #[tokio::test]
    async fn empty_response_only_adds_a_prompt() {
        let mut f = Fixture::new(vec![Ok(ExecuteCommandResponse::default())]);
        f.run("clear").await;

        assert_eq!(
            f.lines(),
            vec![
                prompt("pi@webpi:~$ "),
                ("pi@webpi:~$ clear".to_string(), LineKind::CommandEcho),
                prompt("pi@webpi:~$ "),
            ]
        );
    }

    #[tokio::test]
    async fn transport_failure_becomes_one_error_line() {
        let mut f = Fixture::new(vec![
            Ok(ExecuteCommandResponse {
                new_path: Some("/home/pi".to_string()),
                ..Default::default()
            }),
            Err(ExecutorError::Transport("connection refused".to_string())),
        ]);
        f.run("cd /home/pi").await;
        f.run("ls").await;

        let lines = f.lines();
        let errors: Vec<_> = lines
            .iter()
            .filter(|(_, kind)| *kind == LineKind::Error)
            .collect();
        assert_eq!(
            errors,
            vec![&(
                "Error connecting to backend: connection refused".to_string(),
                LineKind::Error
            )]
        );
        assert_eq!(lines.last(), Some(&prompt("pi@webpi:/home/pi$ ")));
        assert!(!f.dispatcher.is_pending());
        assert!(f.state.input.is_armed());
    }

    #[tokio::test]
    async fn blank_command_skips_history_echo_and_network() {
        let mut f = Fixture::new(vec![]);
        for blank in ["", "   "] {
            let outcome = f
                .dispatcher
                .submit(blank.to_string(), &mut f.state)
                .expect("submit");
            assert_eq!(outcome, SubmitOutcome::Skipped);
        }

        assert_eq!(
            f.lines(),
            vec![
                prompt("pi@webpi:~$ "),
                prompt("pi@webpi:~$ "),
                prompt("pi@webpi:~$ "),
            ]
        );
        assert!(f.state.history.is_empty());
        assert_eq!(f.executor.calls.load(Ordering::SeqCst), 0);
        assert!(f.state.input.is_armed());
    }

    #[tokio::test]
    async fn second_submission_is_rejected_while_pending() {
        let mut f = Fixture::new(vec![output("one")]);
        let outcome = f
            .dispatcher
            .submit("sleep 1".to_string(), &mut f.state)
            .expect("submit");
        let SubmitOutcome::Dispatched { request_id } = outcome else {
            panic!("expected dispatch, got {outcome:?}");
        };
        assert!(!f.state.input.is_armed());
        assert_eq!(f.dispatcher.pending().map(PendingRequest::command), Some("sleep 1"));

        let err = f
            .dispatcher
            .submit("ls".to_string(), &mut f.state)
            .expect_err("must reject");
        assert_eq!(
            err,
            DispatchError::RequestPending {
                command: "sleep 1".to_string()
            }
        );
        assert_eq!(f.state.history.len(), 1);

        let AppEvent::CommandCompleted(completion) = f.rx.recv().await.expect("completion");
        assert_eq!(completion.request_id, request_id);
        assert!(f.dispatcher.complete(completion, &mut f.state));
        assert_eq!(f.executor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_completion_is_ignored() {
        let mut f = Fixture::new(vec![]);
        let before = f.lines();

        let handled = f.dispatcher.complete(
            CommandCompletion {
                request_id: 42,
                result: output("ghost"),
            },
            &mut f.state,
        );
        assert!(!handled);
        assert_eq!(f.lines(), before);
    }

    #[tokio::test]
    async fn history_tracks_every_non_empty_submission() {
        let mut f = Fixture::new(vec![]);
        for command in ["ls", "", "pwd", "ls", "  "] {
            f.run(command).await;
        }

        assert_eq!(f.state.history.len(), 3);
        assert_eq!(f.state.history.back(), Some("ls".to_string()));
        assert_eq!(f.state.history.back(), Some("pwd".to_string()));
        assert_eq!(f.state.history.back(), Some("ls".to_string()));
        assert_eq!(f.state.history.back(), None);
    }
}
