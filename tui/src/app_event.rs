//! Application-level events delivered to the terminal event loop.

use crate::dispatcher::CommandCompletion;

#[derive(Debug)]
pub enum AppEvent {
    /// The single outstanding executor call finished, successfully or not.
    CommandCompleted(CommandCompletion),
}
