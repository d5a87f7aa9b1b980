//! Block keyword vocabulary shared by the matcher and the executor.

pub const KW_IF: &str = "if";
pub const KW_WHILE: &str = "while";
pub const KW_FOR: &str = "for";
pub const KW_SWITCH: &str = "switch";
pub const KW_FUNCTION: &str = "function";

pub const KW_END: &str = "end";
pub const KW_ELSE: &str = "else";
pub const KW_ELSEIF: &str = "elseif";
pub const KW_CASE: &str = "case";
pub const KW_OTHERWISE: &str = "otherwise";

pub const COMMENT_MARKER: char = '%';

const INITIATORS: [&str; 5] = [KW_IF, KW_WHILE, KW_FOR, KW_SWITCH, KW_FUNCTION];
const TERMINATORS: [&str; 5] = [KW_ELSE, KW_ELSEIF, KW_END, KW_CASE, KW_OTHERWISE];

pub fn is_initiator(token: &str) -> bool {
    INITIATORS.contains(&token)
}

pub fn is_terminator(token: &str) -> bool {
    TERMINATORS.contains(&token)
}

pub fn first_token(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

/// Text of a header line after its leading keyword.
pub fn strip_keyword<'a>(line: &'a str, keyword: &str) -> &'a str {
    let trimmed = line.trim();
    trimmed.strip_prefix(keyword).unwrap_or(trimmed).trim()
}
