mod default;
mod history;
mod prompt;
mod strategy;
mod templates;

pub use default::DefaultContextStrategy;
pub use history::HistoryWindow;
pub use prompt::PromptBuilder;
pub use strategy::{ContextStrategy, ContextWindow};
pub use templates::DEFAULT_ASSISTANT_TEMPLATE;
