//! Text bridging between workspace-style statements and rhai expressions,
//! plus value conversion at the engine boundary.

use ms_core::{MatScriptError, MsValue};
use rhai::Dynamic;

/// Rewrites workspace operator spellings into rhai's: single-quoted text
/// becomes a double-quoted string literal, and `~` becomes `!` (which maps
/// `~=` onto `!=` as well). Text inside double quotes is left untouched.
pub(crate) fn rewrite_operators(expr: &str) -> String {
    let mut rewritten = String::with_capacity(expr.len());
    let mut chars = expr.chars();
    let mut in_double = false;
    while let Some(ch) = chars.next() {
        if in_double {
            rewritten.push(ch);
            if ch == '"' {
                in_double = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_double = true;
                rewritten.push(ch);
            }
            '\'' => {
                rewritten.push('"');
                for inner in chars.by_ref() {
                    if inner == '\'' {
                        rewritten.push('"');
                        break;
                    }
                    if inner == '"' {
                        rewritten.push('\\');
                    }
                    rewritten.push(inner);
                }
            }
            '~' => rewritten.push('!'),
            _ => rewritten.push(ch),
        }
    }
    rewritten
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    }
}

/// Splits `name = expr` at the first top-level assignment `=`, ignoring
/// comparison operators and anything inside quotes or brackets. Returns
/// None when the line is not an assignment to a plain identifier.
pub(crate) fn split_assignment(code: &str) -> Option<(&str, &str)> {
    let bytes = code.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (index, &byte) in bytes.iter().enumerate() {
        if let Some(active) = quote {
            if byte == active {
                quote = None;
            }
            continue;
        }
        match byte {
            b'\'' | b'"' => quote = Some(byte),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                let prev = index.checked_sub(1).map(|i| bytes[i]);
                let next = bytes.get(index + 1).copied();
                if matches!(prev, Some(b'=' | b'<' | b'>' | b'!' | b'~')) || next == Some(b'=') {
                    continue;
                }
                let name = code[..index].trim();
                if !is_identifier(name) {
                    return None;
                }
                return Some((name, code[index + 1..].trim()));
            }
            _ => {}
        }
    }
    None
}

/// Argument of a whole-line `disp(...)` call, or None.
pub(crate) fn disp_argument(code: &str) -> Option<&str> {
    code.strip_prefix("disp(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim)
}

/// Splits a range expression at top-level colons, so `start:stop` and
/// `start:step:stop` headers can be distinguished from a plain expression.
pub(crate) fn split_colon_parts(expr: &str) -> Vec<&str> {
    let bytes = expr.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut segment_start = 0usize;
    for (index, &byte) in bytes.iter().enumerate() {
        if let Some(active) = quote {
            if byte == active {
                quote = None;
            }
            continue;
        }
        match byte {
            b'\'' | b'"' => quote = Some(byte),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => {
                parts.push(expr[segment_start..index].trim());
                segment_start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(expr[segment_start..].trim());
    parts
}

/// Inclusive arithmetic progression from `start` towards `stop`. The upper
/// bound is widened by a small tolerance so fractional steps still reach a
/// stop value they land on up to rounding.
pub(crate) fn colon_range(start: f64, step: f64, stop: f64) -> Vec<MsValue> {
    let tolerance = 1e-9 * step.abs().max(1.0);
    let mut values = Vec::new();
    let mut current = start;
    if step > 0.0 {
        while current <= stop + tolerance {
            values.push(MsValue::Number(current));
            current += step;
        }
    } else {
        while current >= stop - tolerance {
            values.push(MsValue::Number(current));
            current += step;
        }
    }
    values
}

pub(crate) fn dynamic_to_value(value: &Dynamic) -> Result<MsValue, MatScriptError> {
    if let Some(flag) = value.clone().try_cast::<bool>() {
        return Ok(MsValue::Bool(flag));
    }
    if let Some(int) = value.clone().try_cast::<rhai::INT>() {
        return Ok(MsValue::Number(int as f64));
    }
    if let Some(float) = value.clone().try_cast::<rhai::FLOAT>() {
        return Ok(MsValue::Number(float));
    }
    if let Some(text) = value.clone().try_cast::<rhai::ImmutableString>() {
        return Ok(MsValue::String(text.to_string()));
    }
    if let Some(items) = value.clone().try_cast::<rhai::Array>() {
        let converted = items
            .iter()
            .map(dynamic_to_value)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(MsValue::Array(converted));
    }
    Err(MatScriptError::new(
        "EVAL_VALUE_UNSUPPORTED",
        format!("value of type {} has no workspace form", value.type_name()),
    ))
}

pub(crate) fn value_to_dynamic(value: &MsValue) -> Dynamic {
    match value {
        MsValue::Bool(flag) => Dynamic::from(*flag),
        MsValue::Number(number) => {
            if number.fract().abs() < f64::EPSILON {
                Dynamic::from(*number as rhai::INT)
            } else {
                Dynamic::from(*number)
            }
        }
        MsValue::String(text) => Dynamic::from(text.clone()),
        MsValue::Array(items) => {
            let converted: rhai::Array = items.iter().map(value_to_dynamic).collect();
            Dynamic::from(converted)
        }
    }
}
