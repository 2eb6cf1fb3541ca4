use std::sync::Arc;

use tokio::sync::mpsc::unbounded_channel;

use crate::AppExitInfo;
use crate::app::run_app;
use crate::app_event_sender::AppEventSender;
use crate::dispatcher::CommandExecutor;
use crate::render::draw_session;
use crate::terminal_session::TerminalOptions;
use crate::terminal_session::TerminalSession;
use crate::tui;
use crate::tui::Tui;

/// Full-screen terminal bound to the real tty.
///
/// Restores the terminal on Drop, so an early return or `?` in the caller
/// still leaves the shell usable.
pub struct WebPiTui {
    tui: Tui,
}

impl WebPiTui {
    /// Enter raw mode and the alternate screen, and clear it.
    pub fn new() -> anyhow::Result<Self> {
        let mut terminal = tui::init()?;
        terminal.clear()?;
        Ok(Self {
            tui: Tui::new(terminal),
        })
    }

    /// Run one terminal session against `executor` until the user leaves.
    pub async fn run<E: CommandExecutor>(
        &mut self,
        executor: Arc<E>,
        options: TerminalOptions,
    ) -> anyhow::Result<AppExitInfo> {
        let (app_event_tx, mut app_event_rx) = unbounded_channel();
        let mut session =
            TerminalSession::new(executor, &options, AppEventSender::new(app_event_tx));

        let events = self.tui.event_stream();
        let terminal = &mut self.tui.terminal;
        let exit_reason = run_app(&mut session, events, &mut app_event_rx, |session| {
            terminal.draw(|frame| draw_session(frame, session))?;
            Ok(())
        })
        .await?;

        let state = session.state();
        Ok(AppExitInfo {
            commands_submitted: state.history.len(),
            final_path: state.session.path().to_string(),
            exit_reason,
        })
    }
}

impl Drop for WebPiTui {
    fn drop(&mut self) {
        let _ = self.tui.terminal.show_cursor();
        let _ = tui::restore();
    }
}
