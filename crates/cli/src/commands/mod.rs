//! CLI command handlers.

mod ask;

pub use ask::AskCommand;
