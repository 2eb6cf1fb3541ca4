//! One terminal instance: transcript, history, edit buffer, working directory
//! and the request dispatcher, wired together and driven by key events.

use std::sync::Arc;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;

use crate::ExitReason;
use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::dispatcher::CommandDispatcher;
use crate::dispatcher::CommandExecutor;
use crate::dispatcher::PendingRequest;
use crate::input::CommandHistory;
use crate::input::InputController;
use crate::input::InputOutcome;
use crate::session::SessionState;
use crate::transcript::DEFAULT_PROMPT_LABEL;
use crate::transcript::Transcript;

/// Knobs the embedding binary can set on a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalOptions {
    /// `user@host` part of the prompt.
    pub prompt_label: String,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            prompt_label: DEFAULT_PROMPT_LABEL.to_string(),
        }
    }
}

/// Everything the dispatcher reconciles after a response.
#[derive(Debug)]
pub struct TerminalState {
    pub transcript: Transcript,
    pub history: CommandHistory,
    pub session: SessionState,
    pub input: InputController,
}

impl TerminalState {
    pub fn new(prompt_label: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::new(prompt_label),
            history: CommandHistory::new(),
            session: SessionState::default(),
            input: InputController::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    Exit(ExitReason),
}

pub struct TerminalSession<E> {
    state: TerminalState,
    dispatcher: CommandDispatcher<E>,
    /// Transcript rows visible in the last frame; sizes PageUp/PageDown.
    viewport_rows: u16,
}

impl<E: CommandExecutor> TerminalSession<E> {
    /// Build a session and show the first prompt.
    pub fn new(executor: Arc<E>, options: &TerminalOptions, app_event_tx: AppEventSender) -> Self {
        let mut state = TerminalState::new(options.prompt_label.clone());
        let region = state.transcript.append_prompt(state.session.path());
        state.input.arm(region, &mut state.transcript);
        Self {
            state,
            dispatcher: CommandDispatcher::new(executor, app_event_tx),
            viewport_rows: 0,
        }
    }

    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    pub(crate) fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.state.transcript
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        self.dispatcher.pending()
    }

    pub fn is_pending(&self) -> bool {
        self.dispatcher.is_pending()
    }

    pub(crate) fn set_viewport_rows(&mut self, rows: u16) {
        self.viewport_rows = rows;
    }

    pub fn handle_key(&mut self, key_event: KeyEvent) -> SessionControl {
        if key_event.kind == KeyEventKind::Release {
            return SessionControl::Continue;
        }

        if key_event.modifiers.contains(KeyModifiers::CONTROL) {
            match key_event.code {
                KeyCode::Char('c') => return SessionControl::Exit(ExitReason::UserRequested),
                KeyCode::Char('d') if self.state.input.buffer().is_empty() => {
                    return SessionControl::Exit(ExitReason::UserRequested);
                }
                KeyCode::Char('l') => {
                    self.clear_screen();
                    return SessionControl::Continue;
                }
                _ => {}
            }
        }

        match key_event.code {
            KeyCode::PageUp => {
                self.state.transcript.scroll_up(self.page_rows());
                return SessionControl::Continue;
            }
            KeyCode::PageDown => {
                self.state.transcript.scroll_down(self.page_rows());
                return SessionControl::Continue;
            }
            _ => {}
        }

        let state = &mut self.state;
        let outcome = state
            .input
            .handle_key(key_event, &mut state.history, &mut state.transcript);
        if let InputOutcome::Submit(command) = outcome
            && let Err(err) = self.dispatcher.submit(command, &mut self.state)
        {
            tracing::debug!("submission rejected: {err}");
        }
        SessionControl::Continue
    }

    pub fn handle_paste(&mut self, pasted: &str) {
        let state = &mut self.state;
        state.input.handle_paste(pasted, &mut state.transcript);
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::CommandCompleted(completion) => {
                self.dispatcher.complete(completion, &mut self.state);
            }
        }
    }

    /// Wipe the transcript and start over with a prompt at the current path,
    /// keeping whatever is in the edit buffer. Not available while a request
    /// is pending, since its response still has lines to add.
    fn clear_screen(&mut self) {
        if self.is_pending() {
            return;
        }
        let state = &mut self.state;
        state.transcript.clear();
        let region = state.transcript.append_prompt(state.session.path());
        state.input.arm(region, &mut state.transcript);
    }

    fn page_rows(&self) -> usize {
        usize::from(self.viewport_rows.saturating_sub(1).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;
    use webpi_protocol::ExecuteCommandRequest;
    use webpi_protocol::ExecuteCommandResponse;
    use webpi_protocol::LineKind;

    use crate::dispatcher::ExecutorError;

    /// Pretends to be the remote shell for a handful of commands.
    struct FakeShell;

    impl CommandExecutor for FakeShell {
        async fn execute(
            &self,
            request: ExecuteCommandRequest,
        ) -> Result<ExecuteCommandResponse, ExecutorError> {
            let (cmd, args) = request
                .command
                .split_once(' ')
                .unwrap_or((request.command.as_str(), ""));
            match cmd {
                "ls" => Ok(ExecuteCommandResponse {
                    output: Some("file.txt".to_string()),
                    ..Default::default()
                }),
                "cd" => Ok(ExecuteCommandResponse {
                    new_path: Some(args.to_string()),
                    ..Default::default()
                }),
                "down" => Err(ExecutorError::Transport("connection refused".to_string())),
                other => Ok(ExecuteCommandResponse {
                    error: Some(format!("{other}: command not found")),
                    ..Default::default()
                }),
            }
        }
    }

    fn session() -> (TerminalSession<FakeShell>, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = unbounded_channel();
        let session = TerminalSession::new(
            Arc::new(FakeShell),
            &TerminalOptions::default(),
            AppEventSender::new(tx),
        );
        (session, rx)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_line(session: &mut TerminalSession<FakeShell>, text: &str) {
        for ch in text.chars() {
            session.handle_key(key(KeyCode::Char(ch)));
        }
        session.handle_key(key(KeyCode::Enter));
    }

    async fn settle(session: &mut TerminalSession<FakeShell>, rx: &mut UnboundedReceiver<AppEvent>) {
        while session.is_pending() {
            let event = rx.recv().await.expect("completion");
            session.handle_app_event(event);
        }
    }

    fn lines(session: &TerminalSession<FakeShell>) -> Vec<String> {
        session
            .state()
            .transcript
            .snapshot()
            .iter()
            .map(|line| line.text().to_string())
            .collect()
    }

    #[tokio::test]
    async fn full_round_trip_through_keys() {
        let (mut session, mut rx) = session();
        type_line(&mut session, "ls");
        settle(&mut session, &mut rx).await;
        type_line(&mut session, "cd /tmp");
        settle(&mut session, &mut rx).await;
        type_line(&mut session, "nope");
        settle(&mut session, &mut rx).await;

        assert_eq!(
            lines(&session),
            vec![
                "pi@webpi:~$ ",
                "pi@webpi:~$ ls",
                "file.txt",
                "pi@webpi:~$ ",
                "pi@webpi:~$ cd /tmp",
                "pi@webpi:/tmp$ ",
                "pi@webpi:/tmp$ nope",
                "nope: command not found",
                "pi@webpi:/tmp$ ",
            ]
        );
    }

    #[tokio::test]
    async fn keys_are_dropped_while_request_is_pending() {
        let (mut session, mut rx) = session();
        type_line(&mut session, "ls");
        assert!(session.is_pending());

        // Typing and Enter during the request go nowhere.
        type_line(&mut session, "pwd");
        assert_eq!(session.state().history.len(), 1);
        assert_eq!(session.state().input.buffer(), "");

        settle(&mut session, &mut rx).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(lines(&session).last().map(String::as_str), Some("pi@webpi:~$ "));
    }

    #[tokio::test]
    async fn failure_recovers_to_prompt_at_previous_path() {
        let (mut session, mut rx) = session();
        type_line(&mut session, "cd /srv");
        settle(&mut session, &mut rx).await;
        type_line(&mut session, "down");
        settle(&mut session, &mut rx).await;

        let snapshot = session.state().transcript.snapshot();
        let errors: Vec<_> = snapshot
            .iter()
            .filter(|line| line.kind() == LineKind::Error)
            .map(|line| line.text().to_string())
            .collect();
        assert_eq!(
            errors,
            vec!["Error connecting to backend: connection refused".to_string()]
        );
        assert_eq!(
            snapshot.last().map(|line| line.text().to_string()),
            Some("pi@webpi:/srv$ ".to_string())
        );
        assert!(session.state().input.is_armed());
    }

    #[tokio::test]
    async fn empty_enter_only_adds_a_prompt() {
        let (mut session, _rx) = session();
        session.handle_key(key(KeyCode::Enter));
        type_line(&mut session, "   ");

        assert!(!session.is_pending());
        assert_eq!(
            lines(&session),
            vec!["pi@webpi:~$ ", "pi@webpi:~$ ", "pi@webpi:~$ "]
        );
        assert!(session.state().history.is_empty());
    }

    #[tokio::test]
    async fn history_recall_after_submissions() {
        let (mut session, mut rx) = session();
        type_line(&mut session, "ls");
        settle(&mut session, &mut rx).await;
        type_line(&mut session, "cd /tmp");
        settle(&mut session, &mut rx).await;

        session.handle_key(key(KeyCode::Up));
        assert_eq!(session.state().input.buffer(), "cd /tmp");
        session.handle_key(key(KeyCode::Up));
        session.handle_key(key(KeyCode::Up));
        assert_eq!(session.state().input.buffer(), "ls");
        assert_eq!(
            lines(&session).last().map(String::as_str),
            Some("pi@webpi:/tmp$ ls")
        );
    }

    #[tokio::test]
    async fn control_keys() {
        let (mut session, mut rx) = session();
        type_line(&mut session, "ls");
        settle(&mut session, &mut rx).await;

        session.handle_key(key(KeyCode::Char('x')));
        assert_eq!(session.handle_key(ctrl('d')), SessionControl::Continue);

        session.handle_key(ctrl('l'));
        assert_eq!(lines(&session), vec!["pi@webpi:~$ x"]);

        session.handle_key(key(KeyCode::Backspace));
        assert_eq!(
            session.handle_key(ctrl('d')),
            SessionControl::Exit(ExitReason::UserRequested)
        );
        assert_eq!(
            session.handle_key(ctrl('c')),
            SessionControl::Exit(ExitReason::UserRequested)
        );
    }

    #[tokio::test]
    async fn clear_screen_waits_for_pending_request() {
        let (mut session, mut rx) = session();
        type_line(&mut session, "ls");
        session.handle_key(ctrl('l'));
        assert_eq!(lines(&session).len(), 2);

        settle(&mut session, &mut rx).await;
        assert_eq!(lines(&session).len(), 4);
    }

    #[tokio::test]
    async fn page_keys_scroll_the_transcript() {
        let (mut session, _rx) = session();
        session.set_viewport_rows(10);

        session.handle_key(key(KeyCode::PageUp));
        assert_eq!(session.state().transcript.scroll_offset(), 9);
        session.handle_key(key(KeyCode::PageDown));
        assert_eq!(session.state().transcript.scroll_offset(), 0);
    }
}
