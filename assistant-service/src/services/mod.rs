pub mod context;
pub mod prompt;
pub mod providers;

pub use context::{render_context, render_context_now};
pub use prompt::{build_system_prompt, DIAGNOSTIC_PROMPT};
