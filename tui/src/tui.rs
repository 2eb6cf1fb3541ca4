//! Terminal setup, teardown and the input event stream.

use std::io;
use std::io::Stdout;
use std::panic;
use std::pin::Pin;

use anyhow::Context;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyEvent;
use crossterm::execute;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio_stream::Stream;
use tokio_stream::StreamExt;

pub type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Enter raw mode and the alternate screen with bracketed paste enabled.
///
/// Installs a panic hook first so a panic never leaves the shell in raw mode.
pub fn init() -> anyhow::Result<CrosstermTerminal> {
    install_panic_hook();
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("create terminal")
}

/// Undo [`init`]. Safe to call more than once.
pub fn restore() -> anyhow::Result<()> {
    let _ = execute!(io::stdout(), DisableBracketedPaste);
    execute!(io::stdout(), LeaveAlternateScreen).context("leave alternate screen")?;
    disable_raw_mode().context("disable raw mode")?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    Key(KeyEvent),
    Paste(String),
    /// The screen needs repainting (resize, focus regained).
    Draw,
}

pub struct Tui {
    pub terminal: CrosstermTerminal,
}

impl Tui {
    pub fn new(terminal: CrosstermTerminal) -> Self {
        Self { terminal }
    }

    /// Terminal input mapped to [`TuiEvent`]s. Read errors end the stream.
    pub fn event_stream(&self) -> Pin<Box<dyn Stream<Item = TuiEvent> + Send + 'static>> {
        let events = EventStream::new()
            .map_while(|event| match event {
                Ok(event) => Some(event),
                Err(err) => {
                    tracing::error!("terminal input failed: {err}");
                    None
                }
            })
            .filter_map(map_crossterm_event);
        Box::pin(events)
    }
}

fn map_crossterm_event(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key_event) => Some(TuiEvent::Key(key_event)),
        Event::Paste(pasted) => Some(TuiEvent::Paste(pasted)),
        Event::Resize(_, _) | Event::FocusGained => Some(TuiEvent::Draw),
        Event::FocusLost | Event::Mouse(_) => None,
    }
}
