use ms_core::MatScriptError;

/// Interaction surface for the runner: debug stepper prompts, `pause`
/// acknowledgments, `input(...)` requests and statement output all go
/// through this capability so the engine never touches stdio directly.
pub trait Console {
    /// Prints the prompt and blocks for one line of user input.
    fn prompt(&mut self, prompt: &str) -> Result<String, MatScriptError>;

    fn print(&mut self, text: &str);
}
