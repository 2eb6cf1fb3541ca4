//! Wire types shared between the WebPi terminal and its remote command executor.

pub mod execute;
pub mod transcript;

pub use execute::ExecuteCommandRequest;
pub use execute::ExecuteCommandResponse;
pub use transcript::LineKind;
