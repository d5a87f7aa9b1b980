use std::collections::VecDeque;

use ms_core::error::EVAL_BACKEND_TERMINATED;
use ms_core::{Evaluator, MatScriptError, MsValue};

use crate::console::Console;
use crate::cursor::ScriptCursor;
use crate::keywords::first_token;
use crate::matcher::BlockMatcher;
use crate::session::{ScriptSession, SessionOptions};

#[derive(Default)]
struct StubEvaluator {
    conditions: VecDeque<bool>,
    condition_exprs: Vec<String>,
    range: Vec<MsValue>,
    statements: Vec<String>,
    bindings: Vec<(String, MsValue)>,
    variables: Vec<(String, MsValue)>,
    statement_error: Option<MatScriptError>,
}

impl StubEvaluator {
    fn with_conditions(conditions: &[bool]) -> Self {
        Self {
            conditions: conditions.iter().copied().collect(),
            ..Self::default()
        }
    }
}

impl Evaluator for StubEvaluator {
    fn eval_condition(&mut self, expr: &str) -> Result<bool, MatScriptError> {
        self.condition_exprs.push(expr.to_string());
        Ok(self.conditions.pop_front().unwrap_or(false))
    }

    fn eval_range(&mut self, _expr: &str) -> Result<Vec<MsValue>, MatScriptError> {
        Ok(self.range.clone())
    }

    fn run_statement(&mut self, line: &str) -> Result<String, MatScriptError> {
        if let Some(error) = &self.statement_error {
            return Err(error.clone());
        }
        self.statements.push(line.to_string());
        Ok(String::new())
    }

    fn bind_variable(&mut self, name: &str, value: MsValue) -> Result<(), MatScriptError> {
        self.bindings.push((name.to_string(), value));
        Ok(())
    }

    fn variable_names(&mut self) -> Result<Vec<String>, MatScriptError> {
        Ok(self.variables.iter().map(|(name, _)| name.clone()).collect())
    }

    fn variable_value(&mut self, name: &str) -> Result<Option<MsValue>, MatScriptError> {
        Ok(self
            .variables
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| value.clone()))
    }
}

#[derive(Default)]
struct ScriptedConsole {
    replies: VecDeque<String>,
    printed: Vec<String>,
}

impl ScriptedConsole {
    fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|reply| reply.to_string()).collect(),
            printed: Vec::new(),
        }
    }
}

impl Console for ScriptedConsole {
    fn prompt(&mut self, _prompt: &str) -> Result<String, MatScriptError> {
        Ok(self.replies.pop_front().unwrap_or_default())
    }

    fn print(&mut self, text: &str) {
        self.printed.push(text.to_string());
    }
}

fn run_session(
    script: &str,
    evaluator: &mut StubEvaluator,
    console: &mut ScriptedConsole,
    options: SessionOptions,
) -> Result<(), MatScriptError> {
    let mut session = ScriptSession::new(script, evaluator, console, options);
    session.run()
}

fn run_plain(script: &str, evaluator: &mut StubEvaluator) -> Result<(), MatScriptError> {
    let mut console = ScriptedConsole::default();
    run_session(script, evaluator, &mut console, SessionOptions::default())
}

mod matcher {
    use super::*;

    #[test]
    fn find_end_round_trips_to_the_end_line() {
        let mut cursor = ScriptCursor::new("if x > 1\n  y = 2;\nend\nz = 3;\n");
        let mut matcher = BlockMatcher::new();
        cursor.next_line();

        let found = matcher
            .find_keyword(&mut cursor, "end", None)
            .expect("scan should pass")
            .expect("end should be found");
        cursor.seek(found).expect("seek to found position");
        let line = cursor.next_line().expect("end line should read");
        assert_eq!(first_token(&line), Some("end"));
    }

    #[test]
    fn nested_block_resolves_the_outer_end() {
        let script = "if a\nfor i = 1:3\nx = i;\nend\nend\n";
        let mut cursor = ScriptCursor::new(script);
        let mut matcher = BlockMatcher::new();
        cursor.next_line();

        let found = matcher
            .find_keyword(&mut cursor, "end", None)
            .expect("scan should pass")
            .expect("outer end should be found");
        assert_eq!(found.line(), 5);
    }

    #[test]
    fn repeated_end_scan_is_a_cache_hit() {
        let script = "while x\nif y\na;\nend\nb;\nend\n";
        let mut cursor = ScriptCursor::new(script);
        let mut matcher = BlockMatcher::new();
        cursor.next_line();

        let first = matcher
            .find_keyword(&mut cursor, "end", None)
            .expect("scan should pass")
            .expect("end should be found");
        let reads_after_first = cursor.lines_read();

        let second = matcher
            .find_keyword(&mut cursor, "end", None)
            .expect("cached scan should pass")
            .expect("cached end should be found");
        assert_eq!(second, first);
        assert_eq!(cursor.lines_read(), reads_after_first);
    }

    #[test]
    fn boundary_stops_an_optional_scan_without_error() {
        let script = "a = 1;\nb = 2;\nelse\n";
        let mut cursor = ScriptCursor::new(script);
        let mut matcher = BlockMatcher::new();

        let pos_else = matcher
            .find_keyword(&mut cursor, "else", None)
            .expect("unbounded scan should pass")
            .expect("else exists");

        let bounded = matcher
            .find_keyword(&mut cursor, "else", Some(pos_else))
            .expect("bounded scan should pass");
        assert_eq!(bounded, None);
    }

    #[test]
    fn elseif_satisfies_an_else_scan_by_prefix() {
        let script = "x = 1;\nelseif y\nend\n";
        let mut cursor = ScriptCursor::new(script);
        let mut matcher = BlockMatcher::new();

        let found = matcher
            .find_keyword(&mut cursor, "else", None)
            .expect("scan should pass")
            .expect("elseif should satisfy else");
        assert_eq!(found.line(), 2);
    }

    #[test]
    fn missing_end_is_fatal_and_restores_the_cursor() {
        let mut cursor = ScriptCursor::new("if x\ny = 1;\n");
        let mut matcher = BlockMatcher::new();
        cursor.next_line();
        let start = cursor.current_position();

        let error = matcher
            .find_keyword(&mut cursor, "end", None)
            .expect_err("unmatched end scan must fail");
        assert_eq!(error.code, "SYNTAX_END_MISSING");
        assert_eq!(cursor.current_position(), start);
    }

    #[test]
    fn skipped_function_blocks_are_registered() {
        let script = "function out = helper(a)\nout = a;\nend\nend\n";
        let mut cursor = ScriptCursor::new(script);
        let mut matcher = BlockMatcher::new();

        let found = matcher
            .find_keyword(&mut cursor, "end", None)
            .expect("scan should pass")
            .expect("outer end should be found");
        assert_eq!(found.line(), 4);

        let entry = matcher
            .function_entry("helper")
            .expect("helper should be registered");
        assert_eq!(entry.signature, "out = helper(a)");
        assert_eq!(entry.end.line(), 3);
    }
}

mod executor {
    use super::*;

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let mut evaluator = StubEvaluator::default();
        run_plain("% header comment\n\n  \nx = 1;\n", &mut evaluator).expect("run should pass");
        assert_eq!(evaluator.statements, vec!["x = 1;"]);
    }

    #[test]
    fn stray_terminator_stops_without_consuming_the_line() {
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::default();
        let mut session = ScriptSession::new(
            "end\nx = 1;\n",
            &mut evaluator,
            &mut console,
            SessionOptions::default(),
        );
        session.run().expect("run should pass");
        assert_eq!(session.cursor().current_position().line(), 1);
        drop(session);
        assert!(evaluator.statements.is_empty());
    }

    #[test]
    fn function_bodies_are_skipped_and_registered() {
        let script = "function y = f(a)\ny = a;\nend\nx = 1;\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::default();
        let mut session = ScriptSession::new(
            script,
            &mut evaluator,
            &mut console,
            SessionOptions::default(),
        );
        session.run().expect("run should pass");
        assert!(session.matcher().function_entry("f").is_some());
        drop(session);
        assert_eq!(evaluator.statements, vec!["x = 1;"]);
    }

    #[test]
    fn statement_failure_carries_the_line_number() {
        let mut evaluator = StubEvaluator {
            statement_error: Some(MatScriptError::new("EVAL_EXPRESSION", "bad expression")),
            ..StubEvaluator::default()
        };
        let error = run_plain("% intro\nboom;\n", &mut evaluator).expect_err("run must fail");
        assert_eq!(error.code, "EVAL_EXPRESSION");
        assert_eq!(error.line, Some(2));
        assert_eq!(error.line_text.as_deref(), Some("boom;"));
    }

    #[test]
    fn failures_inside_a_block_keep_the_offending_line_text() {
        let script = "if flag\nboom;\nend\n";
        let mut evaluator = StubEvaluator {
            conditions: VecDeque::from([true]),
            statement_error: Some(MatScriptError::new("EVAL_EXPRESSION", "bad expression")),
            ..StubEvaluator::default()
        };
        let error = run_plain(script, &mut evaluator).expect_err("run must fail");
        assert_eq!(error.line, Some(2));
        assert_eq!(error.line_text.as_deref(), Some("boom;"));
    }

    #[test]
    fn backend_termination_propagates_unchanged() {
        let mut evaluator = StubEvaluator {
            statement_error: Some(MatScriptError::new(EVAL_BACKEND_TERMINATED, "engine exited")),
            ..StubEvaluator::default()
        };
        let error = run_plain("x = 1;\n", &mut evaluator).expect_err("run must fail");
        assert!(error.is_backend_terminated());
        assert_eq!(error.line, Some(1));
    }
}

mod blocks {
    use super::*;

    #[test]
    fn if_chain_runs_only_the_first_true_branch() {
        let script = "if a\nx = 1;\nelseif b\nx = 2;\nelse\nx = 3;\nend\nafter;\n";

        let mut evaluator = StubEvaluator::with_conditions(&[false, false]);
        run_plain(script, &mut evaluator).expect("run should pass");
        assert_eq!(evaluator.statements, vec!["x = 3;", "after;"]);

        let mut evaluator = StubEvaluator::with_conditions(&[false, true]);
        run_plain(script, &mut evaluator).expect("run should pass");
        assert_eq!(evaluator.statements, vec!["x = 2;", "after;"]);

        let mut evaluator = StubEvaluator::with_conditions(&[true]);
        run_plain(script, &mut evaluator).expect("run should pass");
        assert_eq!(evaluator.statements, vec!["x = 1;", "after;"]);
    }

    #[test]
    fn if_without_else_skips_straight_past_end() {
        let script = "if a\nx = 1;\nend\nafter;\n";
        let mut evaluator = StubEvaluator::with_conditions(&[false]);
        run_plain(script, &mut evaluator).expect("run should pass");
        assert_eq!(evaluator.statements, vec!["after;"]);
    }

    #[test]
    fn while_re_reads_the_header_each_iteration() {
        let script = "while flag\ntick;\nend\ndone;\n";
        let mut evaluator = StubEvaluator::with_conditions(&[true, true, false]);
        run_plain(script, &mut evaluator).expect("run should pass");
        assert_eq!(evaluator.statements, vec!["tick;", "tick;", "done;"]);
        assert_eq!(evaluator.condition_exprs, vec!["flag", "flag", "flag"]);
    }

    #[test]
    fn for_binds_each_range_value_in_order() {
        let script = "for i = 1:3\nbody;\nend\nafter;\n";
        let mut evaluator = StubEvaluator {
            range: vec![
                MsValue::Number(1.0),
                MsValue::Number(2.0),
                MsValue::Number(3.0),
            ],
            ..StubEvaluator::default()
        };
        run_plain(script, &mut evaluator).expect("run should pass");
        assert_eq!(evaluator.statements, vec!["body;", "body;", "body;", "after;"]);
        let bound: Vec<_> = evaluator
            .bindings
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_number().unwrap_or(f64::NAN)))
            .collect();
        assert_eq!(bound, vec![("i", 1.0), ("i", 2.0), ("i", 3.0)]);
    }

    #[test]
    fn for_header_without_equals_is_malformed() {
        let script = "for i 1:3\nend\n";
        let mut evaluator = StubEvaluator::default();
        let error = run_plain(script, &mut evaluator).expect_err("run must fail");
        assert_eq!(error.code, "SYNTAX_HEADER_FOR");
        assert_eq!(error.line, Some(1));
    }

    #[test]
    fn switch_falls_through_to_otherwise() {
        let script = "switch x\ncase 1\na;\ncase 2\nb;\notherwise\nc;\nend\nafter;\n";
        let mut evaluator = StubEvaluator::with_conditions(&[false, false]);
        run_plain(script, &mut evaluator).expect("run should pass");
        assert_eq!(evaluator.statements, vec!["c;", "after;"]);
        assert_eq!(evaluator.condition_exprs, vec!["x == 1", "x == 2"]);
    }

    #[test]
    fn switch_stops_at_the_first_matching_case() {
        let script = "switch x\ncase 1\na;\ncase 2\nb;\nend\n";
        let mut evaluator = StubEvaluator::with_conditions(&[true]);
        run_plain(script, &mut evaluator).expect("run should pass");
        assert_eq!(evaluator.statements, vec!["a;"]);
        assert_eq!(evaluator.condition_exprs, vec!["x == 1"]);
    }

    #[test]
    fn switch_without_case_is_a_syntax_error() {
        let script = "switch x\notherwise\nc;\nend\n";
        let mut evaluator = StubEvaluator::default();
        let error = run_plain(script, &mut evaluator).expect_err("run must fail");
        assert_eq!(error.code, "SYNTAX_SWITCH_NO_CASE");
    }

    // The case scan resumes from just after the previous case's header, so
    // a body line whose first token begins with "case" is read as a case
    // header. Deliberately preserved behavior.
    #[test]
    fn switch_case_scan_resumes_inside_the_previous_body() {
        let script = "switch x\ncase 1\ncasefile = 2;\ncase 2\nb;\nend\n";
        let mut evaluator = StubEvaluator::with_conditions(&[false, false, false]);
        run_plain(script, &mut evaluator).expect("run should pass");
        assert!(evaluator.statements.is_empty());
        assert_eq!(
            evaluator.condition_exprs,
            vec!["x == 1", "x == file = 2;", "x == 2"]
        );
    }

    #[test]
    fn missing_end_names_the_construct_and_its_line() {
        let script = "if x\ny = 1;\n";
        let mut evaluator = StubEvaluator::default();
        let error = run_plain(script, &mut evaluator).expect_err("run must fail");
        assert_eq!(error.code, "SYNTAX_END_MISSING");
        assert!(error.message.contains("if"));
        assert_eq!(error.line, Some(1));
        assert_eq!(error.line_text.as_deref(), Some("if x"));
    }

    #[test]
    fn nested_blocks_compose() {
        let script = "while flag\nif inner\nx;\nend\nend\n";
        let mut evaluator = StubEvaluator::with_conditions(&[true, true, false]);
        run_plain(script, &mut evaluator).expect("run should pass");
        assert_eq!(evaluator.statements, vec!["x;"]);
        assert_eq!(evaluator.condition_exprs, vec!["flag", "inner", "flag"]);
    }
}

mod interaction {
    use super::*;

    fn debug_options() -> SessionOptions {
        SessionOptions {
            debug_mode: true,
            interactive: true,
        }
    }

    #[test]
    fn dbg_suffix_suspends_before_the_next_line() {
        let script = "x = 1; dbg\na;\nb;\nc;\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::with_replies(&["step", "continue"]);
        run_session(script, &mut evaluator, &mut console, debug_options())
            .expect("run should pass");

        // The toggle line itself never executes; `step` runs exactly one
        // line before re-pausing, `continue` runs the rest unattended.
        assert_eq!(evaluator.statements, vec!["a;", "b;", "c;"]);
        let stops: Vec<_> = console
            .printed
            .iter()
            .filter(|text| text.starts_with("Stop at line"))
            .collect();
        assert_eq!(stops.len(), 2);
        assert!(stops[0].contains("Stop at line 2"));
        assert!(stops[1].contains("Stop at line 3"));
        assert!(console.replies.is_empty());
    }

    #[test]
    fn dbg_suffix_is_inert_without_debug_mode() {
        let script = "x = 1; dbg\na;\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::default();
        run_session(
            script,
            &mut evaluator,
            &mut console,
            SessionOptions::default(),
        )
        .expect("run should pass");
        assert_eq!(evaluator.statements, vec!["a;"]);
        assert!(console.printed.is_empty());
    }

    #[test]
    fn identifiers_ending_in_the_marker_are_not_toggles() {
        let script = "x = ydbg\na;\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::default();
        run_session(script, &mut evaluator, &mut console, debug_options())
            .expect("run should pass");
        assert_eq!(evaluator.statements, vec!["x = ydbg", "a;"]);
        assert!(console.printed.is_empty());
    }

    #[test]
    fn continue_runs_until_the_next_breakpoint_toggle() {
        let script = "dbg\na;\ndbg\nb;\nc;\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::with_replies(&["continue", "continue"]);
        run_session(script, &mut evaluator, &mut console, debug_options())
            .expect("run should pass");

        // The first `continue` clears the pause, the second marker re-arms
        // it, so the run suspends again at `b;` and nowhere else.
        assert_eq!(evaluator.statements, vec!["a;", "b;", "c;"]);
        let stops: Vec<_> = console
            .printed
            .iter()
            .filter(|text| text.starts_with("Stop at line"))
            .collect();
        assert_eq!(stops.len(), 2);
        assert!(stops[0].contains("Stop at line 2"));
        assert!(stops[1].contains("Stop at line 4"));
    }

    #[test]
    fn exit_aborts_the_whole_run() {
        let script = "dbg\na;\nb;\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::with_replies(&["exit"]);
        let error = run_session(script, &mut evaluator, &mut console, debug_options())
            .expect_err("exit must abort");
        assert_eq!(error.code, "RUN_DEBUG_EXIT");
        assert_eq!(error.line_text.as_deref(), Some("a;"));
        assert!(evaluator.statements.is_empty());
    }

    #[test]
    fn unknown_debug_commands_are_silently_ignored() {
        let script = "dbg\na;\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::with_replies(&["bogus", "", "continue"]);
        run_session(script, &mut evaluator, &mut console, debug_options())
            .expect("run should pass");
        assert_eq!(evaluator.statements, vec!["a;"]);
    }

    #[test]
    fn watch_lists_live_variables() {
        let script = "dbg\na;\n";
        let mut evaluator = StubEvaluator {
            variables: vec![
                ("x".to_string(), MsValue::Number(3.0)),
                ("msg".to_string(), MsValue::String("hi".to_string())),
            ],
            ..StubEvaluator::default()
        };
        let mut console = ScriptedConsole::with_replies(&["watch", "continue"]);
        run_session(script, &mut evaluator, &mut console, debug_options())
            .expect("run should pass");
        assert!(console.printed.iter().any(|text| text == "x = 3"));
        assert!(console.printed.iter().any(|text| text == "msg = hi"));
    }

    #[test]
    fn watch_reports_an_undefined_name() {
        let script = "dbg\na;\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::with_replies(&["watch y", "continue"]);
        run_session(script, &mut evaluator, &mut console, debug_options())
            .expect("run should pass");
        assert!(console
            .printed
            .iter()
            .any(|text| text == "Undefined variable: y"));
    }

    #[test]
    fn input_with_string_flag_binds_the_raw_reply() {
        let script = "name = input('Who? ', 's');\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::with_replies(&["Ada"]);
        run_session(
            script,
            &mut evaluator,
            &mut console,
            SessionOptions::default(),
        )
        .expect("run should pass");
        assert_eq!(
            evaluator.bindings,
            vec![("name".to_string(), MsValue::String("Ada".to_string()))]
        );
    }

    #[test]
    fn input_without_flag_assigns_through_the_evaluator() {
        let script = "x = input('n: ');\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::with_replies(&["42"]);
        run_session(
            script,
            &mut evaluator,
            &mut console,
            SessionOptions::default(),
        )
        .expect("run should pass");
        assert_eq!(evaluator.statements, vec!["x = 42"]);
    }

    #[test]
    fn input_without_arguments_is_malformed() {
        let script = "x = input();\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::default();
        let error = run_session(
            script,
            &mut evaluator,
            &mut console,
            SessionOptions::default(),
        )
        .expect_err("run must fail");
        assert_eq!(error.code, "RUN_INPUT_MALFORMED");
        assert_eq!(error.line, Some(1));
    }

    #[test]
    fn input_with_unknown_flag_is_malformed() {
        let script = "x = input('n: ', 'q');\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::with_replies(&["42"]);
        let error = run_session(
            script,
            &mut evaluator,
            &mut console,
            SessionOptions::default(),
        )
        .expect_err("run must fail");
        assert_eq!(error.code, "RUN_INPUT_MALFORMED");
    }

    #[test]
    fn pause_runs_its_statement_then_blocks_once() {
        let script = "x = 1;\npause\ny = 2;\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::with_replies(&[""]);
        run_session(
            script,
            &mut evaluator,
            &mut console,
            SessionOptions::default(),
        )
        .expect("run should pass");
        assert_eq!(evaluator.statements, vec!["x = 1;", "y = 2;"]);
        assert!(console.replies.is_empty());
    }

    #[test]
    fn pause_never_blocks_in_a_non_interactive_run() {
        let script = "pause disp(1)\n";
        let mut evaluator = StubEvaluator::default();
        let mut console = ScriptedConsole::default();
        run_session(
            script,
            &mut evaluator,
            &mut console,
            SessionOptions {
                debug_mode: false,
                interactive: false,
            },
        )
        .expect("run should pass");
        assert_eq!(evaluator.statements, vec!["disp(1)"]);
    }
}
