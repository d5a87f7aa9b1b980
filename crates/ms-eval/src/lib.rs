//! rhai-backed `Evaluator`: a persistent engine plus one workspace scope
//! that lives for the whole interactive session.

mod bridge;

use ms_core::{Evaluator, MatScriptError, MsValue};
use rhai::{Dynamic, Engine, Scope};

use crate::bridge::{
    colon_range, disp_argument, dynamic_to_value, rewrite_operators, split_assignment,
    split_colon_parts, value_to_dynamic,
};

pub struct RhaiEvaluator {
    engine: Engine,
    scope: Scope<'static>,
}

impl RhaiEvaluator {
    pub fn new() -> Self {
        Self {
            engine: Engine::new(),
            scope: Scope::new(),
        }
    }

    fn eval_dynamic(&mut self, expr: &str) -> Result<Dynamic, MatScriptError> {
        let rewritten = rewrite_operators(expr);
        self.engine
            .eval_expression_with_scope::<Dynamic>(&mut self.scope, &rewritten)
            .map_err(|error| MatScriptError::new("EVAL_EXPRESSION", error.to_string()))
    }

    fn eval_number(&mut self, expr: &str) -> Result<f64, MatScriptError> {
        let value = self.eval_dynamic(expr)?;
        match dynamic_to_value(&value)? {
            MsValue::Number(number) => Ok(number),
            other => Err(MatScriptError::new(
                "EVAL_RANGE",
                format!("range bound must be a number, got {}", other.type_name()),
            )),
        }
    }

    fn store(&mut self, name: &str, value: Dynamic) {
        if self.scope.contains(name) {
            if let Some(slot) = self.scope.get_mut(name) {
                *slot = value;
            }
        } else {
            self.scope.push_dynamic(name.to_string(), value);
        }
    }
}

impl Default for RhaiEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for RhaiEvaluator {
    fn eval_condition(&mut self, expr: &str) -> Result<bool, MatScriptError> {
        let value = self.eval_dynamic(expr)?;
        match dynamic_to_value(&value)? {
            MsValue::Bool(flag) => Ok(flag),
            MsValue::Number(number) => Ok(number != 0.0),
            other => Err(MatScriptError::new(
                "EVAL_CONDITION",
                format!(
                    "condition must be logical or numeric, got {}",
                    other.type_name()
                ),
            )),
        }
    }

    fn eval_range(&mut self, expr: &str) -> Result<Vec<MsValue>, MatScriptError> {
        let parts = split_colon_parts(expr);
        match parts.as_slice() {
            [single] => {
                let value = self.eval_dynamic(single)?;
                match dynamic_to_value(&value)? {
                    MsValue::Array(items) => Ok(items),
                    scalar => Ok(vec![scalar]),
                }
            }
            [start, stop] => {
                let start = self.eval_number(start)?;
                let stop = self.eval_number(stop)?;
                Ok(colon_range(start, 1.0, stop))
            }
            [start, step, stop] => {
                let start = self.eval_number(start)?;
                let step = self.eval_number(step)?;
                let stop = self.eval_number(stop)?;
                if step == 0.0 {
                    return Err(MatScriptError::new(
                        "EVAL_RANGE",
                        "range step must be nonzero",
                    ));
                }
                Ok(colon_range(start, step, stop))
            }
            _ => Err(MatScriptError::new(
                "EVAL_RANGE",
                format!("range has too many colon segments: {}", expr),
            )),
        }
    }

    fn run_statement(&mut self, line: &str) -> Result<String, MatScriptError> {
        let trimmed = line.trim();
        let (code, suppressed) = match trimmed.strip_suffix(';') {
            Some(rest) => (rest.trim(), true),
            None => (trimmed, false),
        };
        if code.is_empty() {
            return Ok(String::new());
        }

        if let Some(argument) = disp_argument(code) {
            let value = self.eval_dynamic(argument)?;
            return Ok(dynamic_to_value(&value)?.to_display_text());
        }

        if let Some((name, expr)) = split_assignment(code) {
            let name = name.to_string();
            let value = self.eval_dynamic(expr)?;
            let rendered = dynamic_to_value(&value)?;
            self.store(&name, value);
            if suppressed {
                return Ok(String::new());
            }
            return Ok(format!("{} = {}", name, rendered.to_display_text()));
        }

        let value = self.eval_dynamic(code)?;
        if value.is::<()>() {
            return Ok(String::new());
        }
        let rendered = dynamic_to_value(&value)?;
        self.store("ans", value);
        if suppressed {
            Ok(String::new())
        } else {
            Ok(format!("ans = {}", rendered.to_display_text()))
        }
    }

    fn bind_variable(&mut self, name: &str, value: MsValue) -> Result<(), MatScriptError> {
        self.store(name, value_to_dynamic(&value));
        Ok(())
    }

    fn variable_names(&mut self) -> Result<Vec<String>, MatScriptError> {
        Ok(self
            .scope
            .iter()
            .map(|(name, _, _)| name.to_string())
            .collect())
    }

    fn variable_value(&mut self, name: &str) -> Result<Option<MsValue>, MatScriptError> {
        match self.scope.get(name) {
            Some(value) => Ok(Some(dynamic_to_value(value)?)),
            None => Ok(None),
        }
    }
}
