// Forbid accidental stdout/stderr writes in the library portion of the TUI.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod exit;

mod app;
mod app_event;
mod app_event_sender;
pub mod dispatcher;
mod input;
mod render;
mod session;
mod style;
mod terminal_session;
pub mod transcript;
mod tui;
mod version;
mod webpi_tui;

pub use app_event::AppEvent;
pub use app_event_sender::AppEventSender;
pub use dispatcher::CommandExecutor;
pub use dispatcher::ExecutorError;
pub use exit::AppExitInfo;
pub use exit::ExitReason;
pub use input::CommandHistory;
pub use input::InputController;
pub use input::InputOutcome;
pub use session::SessionState;
pub use terminal_session::SessionControl;
pub use terminal_session::TerminalOptions;
pub use terminal_session::TerminalSession;
pub use terminal_session::TerminalState;
pub use version::WEBPI_VERSION;
pub use webpi_tui::WebPiTui;
