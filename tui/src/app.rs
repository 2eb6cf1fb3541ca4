//! The event loop: terminal input, executor completions and the repaint tick.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;
use tokio_stream::Stream;
use tokio_stream::StreamExt;

use crate::ExitReason;
use crate::app_event::AppEvent;
use crate::dispatcher::CommandExecutor;
use crate::terminal_session::SessionControl;
use crate::terminal_session::TerminalSession;
use crate::tui::TuiEvent;

/// Repaint cadence while a request is outstanding, so the footer's elapsed
/// time keeps moving.
const PENDING_TICK: Duration = Duration::from_millis(250);

/// Drive `session` until the user exits or the input stream ends.
///
/// `draw` is called once up front and after every handled event.
pub(crate) async fn run_app<E, S, D>(
    session: &mut TerminalSession<E>,
    mut events: S,
    app_event_rx: &mut UnboundedReceiver<AppEvent>,
    mut draw: D,
) -> anyhow::Result<ExitReason>
where
    E: CommandExecutor,
    S: Stream<Item = TuiEvent> + Unpin,
    D: FnMut(&mut TerminalSession<E>) -> anyhow::Result<()>,
{
    let mut tick = tokio::time::interval(PENDING_TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    draw(&mut *session)?;
    loop {
        tokio::select! {
            maybe_event = events.next() => {
                let Some(event) = maybe_event else {
                    tracing::info!("terminal input closed");
                    return Ok(ExitReason::InputClosed);
                };
                match event {
                    TuiEvent::Key(key_event) => {
                        if let SessionControl::Exit(reason) = session.handle_key(key_event) {
                            return Ok(reason);
                        }
                    }
                    TuiEvent::Paste(pasted) => session.handle_paste(&pasted),
                    TuiEvent::Draw => {}
                }
            }
            Some(app_event) = app_event_rx.recv() => {
                session.handle_app_event(app_event);
            }
            _ = tick.tick(), if session.is_pending() => {}
        }
        draw(&mut *session)?;
    }
}
