pub mod console;
pub mod cursor;
pub mod keywords;
pub mod matcher;
pub mod session;
mod stepper;

pub use console::Console;
pub use cursor::ScriptCursor;
pub use matcher::{BlockMatcher, FunctionEntry};
pub use session::{ScriptSession, SessionOptions};

#[cfg(test)]
mod tests;
