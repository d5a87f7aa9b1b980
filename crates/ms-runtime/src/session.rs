use ms_core::{Evaluator, MatScriptError, MsValue, Position};
use regex::Regex;

use crate::console::Console;
use crate::cursor::ScriptCursor;
use crate::keywords::{
    first_token, is_terminator, strip_keyword, COMMENT_MARKER, KW_CASE, KW_ELSE, KW_ELSEIF,
    KW_END, KW_FOR, KW_FUNCTION, KW_IF, KW_OTHERWISE, KW_SWITCH, KW_WHILE,
};
use crate::matcher::BlockMatcher;
use crate::stepper::{debug_prompt_loop, StepSignal};

const DEBUG_MARKER: &str = "dbg";

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Master switch for `dbg` breakpoints and the debug stepper.
    pub debug_mode: bool,
    /// When false, `pause` markers run their statement but never block.
    pub interactive: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debug_mode: false,
            interactive: true,
        }
    }
}

/// Live state for one script run: the cursor over the open script, the
/// terminator cache and function registry, and the debug flags. Dropping
/// the session discards the caches; nothing survives a run.
pub struct ScriptSession<'a> {
    cursor: ScriptCursor,
    matcher: BlockMatcher,
    evaluator: &'a mut dyn Evaluator,
    console: &'a mut dyn Console,
    debug_mode: bool,
    debug_paused: bool,
    interactive: bool,
}

impl<'a> ScriptSession<'a> {
    pub fn new(
        script: impl Into<String>,
        evaluator: &'a mut dyn Evaluator,
        console: &'a mut dyn Console,
        options: SessionOptions,
    ) -> Self {
        Self {
            cursor: ScriptCursor::new(script),
            matcher: BlockMatcher::new(),
            evaluator,
            console,
            debug_mode: options.debug_mode,
            debug_paused: false,
            interactive: options.interactive,
        }
    }

    pub fn run(&mut self) -> Result<(), MatScriptError> {
        self.run_sequential()
    }

    pub fn cursor(&self) -> &ScriptCursor {
        &self.cursor
    }

    pub fn matcher(&self) -> &BlockMatcher {
        &self.matcher
    }

    pub fn debug_paused(&self) -> bool {
        self.debug_paused
    }

    /// Statement dispatcher. Reads lines until input is exhausted or a
    /// terminator keyword is reached; the terminator line is left unread
    /// (the caller repositions past its block's `end`).
    fn run_sequential(&mut self) -> Result<(), MatScriptError> {
        loop {
            let line_start = self.cursor.current_position();
            let Some(raw) = self.cursor.next_line() else {
                return Ok(());
            };
            let line = raw.trim();
            if line.is_empty() || line.starts_with(COMMENT_MARKER) {
                continue;
            }
            let line_no = line_start.line();

            if self.debug_mode && self.debug_paused {
                self.console
                    .print(&format!("Stop at line {}:\n    {}", line_no, line));
                match debug_prompt_loop(&mut *self.console, &mut *self.evaluator)? {
                    StepSignal::Abort => {
                        return Err(MatScriptError::new(
                            "RUN_DEBUG_EXIT",
                            "debug session aborted by `exit`",
                        )
                        .at_source(line_no, line));
                    }
                    StepSignal::Continue => self.debug_paused = false,
                    StepSignal::Step => {}
                }
            }

            let Some(first) = first_token(line) else {
                continue;
            };

            if is_terminator(first) {
                self.cursor.seek(line_start)?;
                return Ok(());
            }

            match first {
                KW_IF => {
                    let condition = strip_keyword(line, KW_IF).to_string();
                    self.run_if_block(&condition, line_no)
                        .map_err(|error| error.at_source(line_no, line))?;
                }
                KW_WHILE => {
                    self.run_while_block(line_start)
                        .map_err(|error| error.at_source(line_no, line))?;
                }
                KW_FOR => {
                    let header = strip_keyword(line, KW_FOR).to_string();
                    self.run_for_block(&header, line_no)
                        .map_err(|error| error.at_source(line_no, line))?;
                }
                KW_SWITCH => {
                    let expr = strip_keyword(line, KW_SWITCH).to_string();
                    self.run_switch_block(&expr, line_no)
                        .map_err(|error| error.at_source(line_no, line))?;
                }
                KW_FUNCTION => {
                    self.skip_function_block(line, line_no)
                        .map_err(|error| error.at_source(line_no, line))?;
                }
                _ => {
                    if is_debug_toggle(line) {
                        self.debug_paused = self.debug_mode;
                        continue;
                    }
                    if line.contains("input(") {
                        self.handle_input(line, line_no)
                            .map_err(|error| error.at_source(line_no, line))?;
                    } else if line.contains("pause") {
                        self.handle_pause(line, line_no)
                            .map_err(|error| error.at_source(line_no, line))?;
                    } else {
                        let output = self
                            .evaluator
                            .run_statement(line)
                            .map_err(|error| error.at_source(line_no, line))?;
                        if !output.is_empty() {
                            self.console.print(&output);
                        }
                    }
                }
            }
        }
    }

    /// `if`: run the first body whose condition holds, else the `else`
    /// branch when present; an `elseif` branch restarts the whole handler
    /// with the chained condition.
    fn run_if_block(&mut self, condition: &str, header_line: usize) -> Result<(), MatScriptError> {
        let pos_end = self.find_block_end(KW_IF, header_line)?;

        if self.eval_condition(condition, header_line)? {
            self.run_sequential()?;
            return self.skip_past(pos_end);
        }

        match self
            .matcher
            .find_keyword(&mut self.cursor, KW_ELSE, Some(pos_end))?
        {
            None => self.skip_past(pos_end),
            Some(pos_else) => {
                self.cursor.seek(pos_else)?;
                let branch_line = self.cursor.next_line().unwrap_or_default();
                let branch = branch_line.trim();
                if branch.starts_with(KW_ELSEIF) {
                    let chained = strip_keyword(branch, KW_ELSEIF).to_string();
                    self.run_if_block(&chained, pos_else.line())
                } else {
                    self.run_sequential()?;
                    self.skip_past(pos_end)
                }
            }
        }
    }

    /// `while`: the header line is re-read from its recorded Position before
    /// every evaluation, so the condition text always comes from the script.
    fn run_while_block(&mut self, header_start: Position) -> Result<(), MatScriptError> {
        let header_line_no = header_start.line();
        let pos_end = self.find_block_end(KW_WHILE, header_line_no)?;

        loop {
            self.cursor.seek(header_start)?;
            let Some(header) = self.cursor.next_line() else {
                break;
            };
            let condition = strip_keyword(&header, KW_WHILE).to_string();
            if !self.eval_condition(&condition, header_line_no)? {
                break;
            }
            self.run_sequential()?;
        }
        self.skip_past(pos_end)
    }

    /// `for`: the range expression is evaluated exactly once; each value is
    /// bound to the loop name before the body runs from its recorded start.
    fn run_for_block(&mut self, header: &str, header_line: usize) -> Result<(), MatScriptError> {
        let Some((name, range_expr)) = header.split_once('=') else {
            return Err(MatScriptError::with_line(
                "SYNTAX_HEADER_FOR",
                "for header must be `name = range`",
                header_line,
            ));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(MatScriptError::with_line(
                "SYNTAX_HEADER_FOR",
                "for header is missing the loop variable name",
                header_line,
            ));
        }

        let values = self
            .evaluator
            .eval_range(range_expr.trim())
            .map_err(|error| error.at_line(header_line))?;
        let body_start = self.cursor.current_position();
        let pos_end = self.find_block_end(KW_FOR, header_line)?;

        for value in values {
            self.evaluator
                .bind_variable(name, value)
                .map_err(|error| error.at_line(header_line))?;
            self.run_sequential()?;
            self.cursor.seek(body_start)?;
        }
        self.skip_past(pos_end)
    }

    /// `switch`: cases are visited in document order; the first whose
    /// expression equals the switch expression runs, else `otherwise`.
    fn run_switch_block(
        &mut self,
        switch_expr: &str,
        header_line: usize,
    ) -> Result<(), MatScriptError> {
        let pos_end = self.find_block_end(KW_SWITCH, header_line)?;
        let pos_otherwise =
            self.matcher
                .find_keyword(&mut self.cursor, KW_OTHERWISE, Some(pos_end))?;
        let mut pos_case = self
            .matcher
            .find_keyword(&mut self.cursor, KW_CASE, Some(pos_end))?;
        if pos_case.is_none() {
            return Err(MatScriptError::with_line(
                "SYNTAX_SWITCH_NO_CASE",
                "switch block has no case",
                header_line,
            ));
        }

        let mut matched = false;
        while let Some(case_pos) = pos_case {
            self.cursor.seek(case_pos)?;
            let case_line = self.cursor.next_line().unwrap_or_default();
            let case_expr = strip_keyword(&case_line, KW_CASE).to_string();
            let comparison = format!("{} == {}", switch_expr, case_expr);
            if self.eval_condition(&comparison, case_pos.line())? {
                self.run_sequential()?;
                matched = true;
                break;
            }
            // The scan for the next case resumes right after this case's
            // header line, not after its body. A body line whose first token
            // begins with "case" is therefore picked up as a case header.
            pos_case = self
                .matcher
                .find_keyword(&mut self.cursor, KW_CASE, Some(pos_end))?;
        }

        if !matched {
            if let Some(pos) = pos_otherwise {
                self.cursor.seek(pos)?;
                self.cursor.next_line();
                self.run_sequential()?;
            }
        }
        self.skip_past(pos_end)
    }

    /// Function bodies are never executed inline; the block is skipped and
    /// its signature recorded in the registry.
    fn skip_function_block(&mut self, header: &str, line_no: usize) -> Result<(), MatScriptError> {
        let end = self.find_block_end(KW_FUNCTION, line_no)?;
        let body_start = self.cursor.current_position();
        self.matcher.register_function(header, body_start, end);
        self.skip_past(end)
    }

    fn handle_input(&mut self, line: &str, line_no: usize) -> Result<(), MatScriptError> {
        let (target, call) = match line.split_once('=') {
            Some((lhs, rhs)) => (Some(lhs.trim()), rhs),
            None => (None, line),
        };

        let args_regex = Regex::new(r"\((.*)\)").expect("input args regex must compile");
        let Some(captures) = args_regex.captures(call) else {
            return Err(MatScriptError::with_line(
                "RUN_INPUT_MALFORMED",
                "input call is missing its argument list",
                line_no,
            ));
        };
        let inner = captures.get(1).map(|group| group.as_str()).unwrap_or("");
        if inner.trim().is_empty() {
            return Err(MatScriptError::with_line(
                "RUN_INPUT_MALFORMED",
                "not enough arguments for the input command",
                line_no,
            ));
        }

        let args: Vec<&str> = inner.split(',').map(str::trim).collect();
        let prompt = unquote(args[0]);
        let reply = self.console.prompt(&prompt)?;

        if let Some(name) = target {
            if args.len() > 1 {
                if args[1].contains('s') {
                    self.evaluator
                        .bind_variable(name, MsValue::String(reply))
                        .map_err(|error| error.at_line(line_no))?;
                } else {
                    return Err(MatScriptError::with_line(
                        "RUN_INPUT_MALFORMED",
                        format!("unrecognized input argument {}", args[1]),
                        line_no,
                    ));
                }
            } else {
                self.evaluator
                    .run_statement(&format!("{} = {}", name, reply))
                    .map_err(|error| error.at_line(line_no))?;
            }
        }
        Ok(())
    }

    fn handle_pause(&mut self, line: &str, line_no: usize) -> Result<(), MatScriptError> {
        let rest = line.replace("pause", "");
        let statement = rest.trim();
        if !statement.is_empty() {
            let output = self
                .evaluator
                .run_statement(statement)
                .map_err(|error| error.at_line(line_no))?;
            if !output.is_empty() {
                self.console.print(&output);
            }
        }
        if self.interactive {
            self.console.prompt("")?;
        }
        Ok(())
    }

    fn find_block_end(
        &mut self,
        kind: &str,
        header_line: usize,
    ) -> Result<Position, MatScriptError> {
        match self.matcher.find_keyword(&mut self.cursor, KW_END, None) {
            Ok(Some(position)) => Ok(position),
            Ok(None) => Err(end_missing(kind, header_line)),
            Err(error) if error.code == "SYNTAX_END_MISSING" => {
                Err(end_missing(kind, header_line))
            }
            Err(error) => Err(error),
        }
    }

    fn eval_condition(&mut self, expr: &str, line_no: usize) -> Result<bool, MatScriptError> {
        self.evaluator
            .eval_condition(expr)
            .map_err(|error| error.at_line(line_no))
    }

    fn skip_past(&mut self, position: Position) -> Result<(), MatScriptError> {
        self.cursor.seek(position)?;
        self.cursor.next_line();
        Ok(())
    }
}

fn end_missing(kind: &str, header_line: usize) -> MatScriptError {
    MatScriptError::with_line(
        "SYNTAX_END_MISSING",
        format!("the end of the {} block is missing", kind),
        header_line,
    )
}

fn is_debug_toggle(line: &str) -> bool {
    match line.strip_suffix(DEBUG_MARKER) {
        Some(rest) => rest.is_empty() || rest.ends_with(char::is_whitespace),
        None => false,
    }
}

fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    for quote in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}
