//! Argument list parsing for `Action: name(args)` calls.
//!
//! Arguments are comma separated. A field may be wrapped in double quotes, in
//! which case commas inside it are literal and `""` stands for one quote.
//! Whitespace around fields is ignored.
//!
//! Models do not always quote consistently. When the quoting is malformed
//! (an unterminated quote, a quote in the middle of a bare field, text after a
//! closing quote) the whole list falls back to a naive comma split with one
//! layer of surrounding quotes removed from each field.

/// Parse the text between the parentheses of an action call.
pub fn parse_arguments(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match parse_quoted(raw) {
        Some(fields) => fields,
        None => {
            tracing::debug!(raw, "Malformed argument quoting, falling back to comma split");
            naive_split(raw)
        }
    }
}

/// Remove exactly one pair of surrounding double quotes, if present.
pub fn strip_one_quote_layer(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before any non-space character of a field
    FieldStart,
    /// Inside a field that did not start with a quote
    Bare,
    /// Inside a quoted field
    Quoted,
    /// Just saw a quote inside a quoted field: either `""` or the closing quote
    QuoteInQuoted,
    /// After the closing quote; only whitespace or a comma may follow
    AfterQuoted,
}

fn parse_quoted(raw: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut state = State::FieldStart;

    for ch in raw.chars() {
        state = match (state, ch) {
            (State::FieldStart, c) if c.is_whitespace() => State::FieldStart,
            (State::FieldStart, '"') => State::Quoted,
            (State::FieldStart, ',') => {
                fields.push(String::new());
                State::FieldStart
            }
            (State::FieldStart, c) => {
                current.push(c);
                State::Bare
            }

            (State::Bare, ',') => {
                fields.push(current.trim_end().to_string());
                current.clear();
                State::FieldStart
            }
            (State::Bare, '"') => return None,
            (State::Bare, c) => {
                current.push(c);
                State::Bare
            }

            (State::Quoted, '"') => State::QuoteInQuoted,
            (State::Quoted, c) => {
                current.push(c);
                State::Quoted
            }

            (State::QuoteInQuoted, '"') => {
                current.push('"');
                State::Quoted
            }
            (State::QuoteInQuoted, ',') | (State::AfterQuoted, ',') => {
                fields.push(std::mem::take(&mut current));
                State::FieldStart
            }
            (State::QuoteInQuoted, c) | (State::AfterQuoted, c) if c.is_whitespace() => {
                State::AfterQuoted
            }
            (State::QuoteInQuoted, _) | (State::AfterQuoted, _) => return None,
        };
    }

    match state {
        State::Quoted => return None,
        State::Bare => fields.push(current.trim_end().to_string()),
        State::QuoteInQuoted | State::AfterQuoted => fields.push(current),
        // Trailing comma: `a,` has an empty last field
        State::FieldStart => fields.push(String::new()),
    }
    Some(fields)
}

fn naive_split(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|field| strip_one_quote_layer(field.trim()).to_string())
        .collect()
}
