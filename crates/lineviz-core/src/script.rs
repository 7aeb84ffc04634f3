//! Splitting a SQL script into statements

use crate::config::DialectConfig;

/// Default statement delimiter
pub const DEFAULT_DELIMITER: char = ';';

/// Lexical rules used to find statement boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOptions {
    pub delimiter: char,

    /// `\'` inside a quoted run escapes the next character
    pub backslash_escapes: bool,

    /// `$$ ... $$` and `$tag$ ... $tag$` bodies are opaque
    pub dollar_quotes: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            backslash_escapes: false,
            dollar_quotes: false,
        }
    }
}

impl SplitOptions {
    /// Quoting rules of `dialect`
    pub fn for_dialect(dialect: DialectConfig, delimiter: char) -> Self {
        let (backslash_escapes, dollar_quotes) = match dialect {
            DialectConfig::MySql | DialectConfig::Hive | DialectConfig::BigQuery => (true, false),
            DialectConfig::Snowflake => (true, true),
            DialectConfig::Postgres => (false, true),
            DialectConfig::Ansi => (false, false),
        };
        Self {
            delimiter,
            backslash_escapes,
            // A `$` delimiter wins over dollar quoting
            dollar_quotes: dollar_quotes && delimiter != '$',
        }
    }
}

/// Length of the dollar-quote opener (`$$` or `$tag$`) at the start of `rest`
fn dollar_opener(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix('$')?;
    let tag_len = body
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    let tag = &body[..tag_len];

    // `$1` is a positional parameter, not a tag
    if tag.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    body[tag_len..].starts_with('$').then_some(tag_len + 2)
}

/// Lexical state while scanning a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Split a script into non-empty, trimmed statements using ANSI quoting.
///
/// The delimiter is ignored inside quoted strings and identifiers
/// (`'...'`, `"..."`, `` `...` ``) and inside `--` and `/* */` comments.
/// A doubled quote inside a quoted run is treated as an escaped quote.
pub fn split_statements(script: &str, delimiter: char) -> Vec<String> {
    split_script(
        script,
        SplitOptions {
            delimiter,
            ..SplitOptions::default()
        },
    )
}

/// Split a script into non-empty, trimmed statements under `options`
pub fn split_script(script: &str, options: SplitOptions) -> Vec<String> {
    let delimiter = options.delimiter;
    let mut statements = Vec::new();
    let mut start = 0;
    let mut state = ScanState::Code;
    let mut chars = script.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match state {
            ScanState::Code => {
                if ch == delimiter {
                    push_trimmed(&mut statements, &script[start..idx]);
                    start = idx + ch.len_utf8();
                } else if ch == '\'' || ch == '"' || ch == '`' {
                    state = ScanState::Quoted(ch);
                } else if ch == '-' && matches!(chars.peek(), Some((_, '-'))) {
                    chars.next();
                    state = ScanState::LineComment;
                } else if ch == '/' && matches!(chars.peek(), Some((_, '*'))) {
                    chars.next();
                    state = ScanState::BlockComment;
                } else if ch == '$' && options.dollar_quotes {
                    if let Some(len) = dollar_opener(&script[idx..]) {
                        let opener = &script[idx..idx + len];
                        let body_start = idx + len;
                        // Unterminated bodies run to the end of the script
                        let end = script[body_start..]
                            .find(opener)
                            .map_or(script.len(), |pos| body_start + pos + len);
                        while matches!(chars.peek(), Some((i, _)) if *i < end) {
                            chars.next();
                        }
                    }
                }
            }
            ScanState::Quoted(quote) => {
                if ch == '\\' && options.backslash_escapes && quote != '`' {
                    chars.next();
                } else if ch == quote {
                    if matches!(chars.peek(), Some((_, next)) if *next == quote) {
                        chars.next();
                    } else {
                        state = ScanState::Code;
                    }
                }
            }
            ScanState::LineComment => {
                if ch == '\n' {
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => {
                if ch == '*' && matches!(chars.peek(), Some((_, '/'))) {
                    chars.next();
                    state = ScanState::Code;
                }
            }
        }
    }

    push_trimmed(&mut statements, &script[start..]);
    statements
}

fn push_trimmed(statements: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}
