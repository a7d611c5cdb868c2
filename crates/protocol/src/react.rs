//! Reasoning-action reply parser.
//!
//! Model replies are free text that is supposed to follow this shape:
//!
//! ```text
//! Thought: <reasoning>
//! Action: <name>(<args>)
//! ```
//!
//! or
//!
//! ```text
//! Thought: <reasoning>
//! Final Answer: <answer>
//! ```
//!
//! Models drift from the format, so classification goes through tiers and
//! always produces *something*:
//!
//! 1. [`extract_final_marker`]: `Final Answer:` anywhere, with content after it
//! 2. [`extract_action`]: an `Action: name(args)` line
//! 3. [`extract_final_lines`]: a line starting with `Final Answer:`, even
//!    with nothing after it (an empty answer)
//! 4. [`recover_degraded`]: line filter over the raw text
//!
//! Parsing never fails.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::args::{parse_arguments, strip_one_quote_layer};

/// Marker that introduces the final answer. Matched case-sensitively.
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

const RESERVED_PREFIXES: [&str; 4] = ["Thought:", "Action:", "Observation:", "Final Answer:"];

/// Which lines survive degraded recovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedFilter {
    /// Keep path-like lines and any line that is not a protocol line
    #[default]
    Permissive,
    /// Keep only path-like lines
    PathsOnly,
}

/// Which tier produced a final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalTier {
    Marker,
    LineScan,
}

/// An `Action: name(args)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAction {
    pub name: String,
    /// Text inside the parentheses with one layer of surrounding quotes removed
    pub raw_arguments: String,
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Final { answer: String, tier: FinalTier },
    Action(ParsedAction),
    /// No protocol marker at all; `recovered` is false when the filter kept
    /// nothing and `text` is the whole reply.
    Degraded { text: String, recovered: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub thought: Option<String>,
    pub directive: Directive,
}

/// Classify one model reply.
pub fn parse_reply(text: &str, filter: DegradedFilter) -> ParsedReply {
    let thought = extract_thought(text);

    let directive = if let Some(answer) = extract_final_marker(text) {
        Directive::Final { answer, tier: FinalTier::Marker }
    } else if let Some(action) = extract_action(text) {
        Directive::Action(action)
    } else if let Some(answer) = extract_final_lines(text) {
        Directive::Final { answer, tier: FinalTier::LineScan }
    } else {
        let (text, recovered) = recover_degraded(text, filter);
        Directive::Degraded { text, recovered }
    };

    ParsedReply { thought, directive }
}

/// Only the final-answer tiers (1 then 3). Used when the loop runs out of turns.
pub fn extract_final_answer(text: &str) -> Option<String> {
    extract_final_marker(text).or_else(|| extract_final_lines(text))
}

/// Tier 1: everything after the first `Final Answer:`, if non-blank.
pub fn extract_final_marker(text: &str) -> Option<String> {
    let idx = text.find(FINAL_ANSWER_MARKER)?;
    let answer = text[idx + FINAL_ANSWER_MARKER.len()..].trim();
    (!answer.is_empty()).then(|| answer.to_string())
}

/// Tier 2: the first line holding a well-formed `Action: name(args)` call.
///
/// The word `Action` is matched case-insensitively. The argument text runs to
/// the last `)` on the line, so parentheses inside arguments survive.
pub fn extract_action(text: &str) -> Option<ParsedAction> {
    text.lines().find_map(action_on_line)
}

fn action_on_line(line: &str) -> Option<ParsedAction> {
    // ASCII lowercasing keeps byte offsets aligned with `line`.
    let lower = line.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(found) = lower[search_from..].find("action:") {
        let start = search_from + found + "action:".len();
        if let Some(action) = action_call(&line[start..]) {
            return Some(action);
        }
        search_from = start;
    }
    None
}

fn action_call(rest: &str) -> Option<ParsedAction> {
    let rest = rest.trim_start();
    let name_len = rest
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map_or(rest.len(), |(i, _)| i);
    if name_len == 0 {
        return None;
    }
    let name = &rest[..name_len];

    let after_name = rest[name_len..].trim_start();
    let inside = after_name.strip_prefix('(')?;
    let close = inside.rfind(')')?;
    let inner = inside[..close].trim();

    Some(ParsedAction {
        name: name.to_string(),
        raw_arguments: strip_one_quote_layer(inner).to_string(),
        arguments: parse_arguments(inner),
    })
}

/// Tier 3: a line starting with `Final Answer:` plus every line after it.
///
/// A bare marker line is still a final answer; the answer is then empty.
pub fn extract_final_lines(text: &str) -> Option<String> {
    let mut lines = text.lines();
    let first = lines.by_ref().find_map(|line| line.trim_start().strip_prefix(FINAL_ANSWER_MARKER))?;

    let mut answer = first.trim().to_string();
    for line in lines {
        answer.push('\n');
        answer.push_str(line);
    }
    Some(answer.trim().to_string())
}

/// Tier 4: keep the lines the filter accepts.
///
/// Returns the kept lines joined by newlines and `true`, or the whole reply
/// trimmed and `false` when nothing was kept. Logs a warning either way.
pub fn recover_degraded(text: &str, filter: DegradedFilter) -> (String, bool) {
    let kept: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && keep_line(line, filter))
        .collect();

    if kept.is_empty() {
        warn!(
            chars = text.len(),
            "Model reply follows no protocol marker and no line was recoverable; passing it through"
        );
        (text.trim().to_string(), false)
    } else {
        warn!(
            kept = kept.len(),
            ?filter,
            "Model reply follows no protocol marker; recovered lines heuristically"
        );
        (kept.join("\n"), true)
    }
}

fn keep_line(line: &str, filter: DegradedFilter) -> bool {
    let path_like = line.contains('.') && (line.contains('/') || line.contains('\\'));
    match filter {
        DegradedFilter::PathsOnly => path_like,
        DegradedFilter::Permissive => {
            path_like || !RESERVED_PREFIXES.iter().any(|p| line.starts_with(p))
        }
    }
}

/// The `Thought:` segment, for logging only.
pub fn extract_thought(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let start = lower.find("thought:")? + "thought:".len();

    let tail = &lower[start..];
    let end = ["\naction:", "\nfinal answer:"]
        .iter()
        .filter_map(|m| tail.find(m))
        .min()
        .map_or(text.len(), |i| start + i);

    let thought = text[start..end].trim();
    (!thought.is_empty()).then(|| thought.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParsedReply {
        parse_reply(text, DegradedFilter::Permissive)
    }

    #[test]
    fn final_answer_marker() {
        let reply = parse("Final Answer: Done.");
        assert_eq!(
            reply.directive,
            Directive::Final { answer: "Done.".into(), tier: FinalTier::Marker }
        );
    }

    #[test]
    fn final_answer_spans_lines() {
        let reply = parse("Thought: all set\nFinal Answer: src/App.jsx\nsrc/index.js\n");
        assert_eq!(
            reply.directive,
            Directive::Final { answer: "src/App.jsx\nsrc/index.js".into(), tier: FinalTier::Marker }
        );
        assert_eq!(reply.thought.as_deref(), Some("all set"));
    }

    #[test]
    fn final_answer_wins_over_action() {
        let reply = parse("Action: analyze_project()\nFinal Answer: nothing to do");
        assert!(matches!(reply.directive, Directive::Final { .. }));
    }

    #[test]
    fn read_file_action_with_quoted_path() {
        let reply = parse("Thought: look at the entry\nAction: read_file(\"src/App.jsx\")");
        let Directive::Action(action) = reply.directive else {
            panic!("expected an action");
        };
        assert_eq!(action.name, "read_file");
        assert_eq!(action.arguments, vec!["src/App.jsx"]);
        assert_eq!(action.raw_arguments, "src/App.jsx");
        assert_eq!(reply.thought.as_deref(), Some("look at the entry"));
    }

    #[test]
    fn action_keyword_is_case_insensitive_and_spacing_tolerant() {
        let action = extract_action("ACTION:   analyze_project ( )").unwrap();
        assert_eq!(action.name, "analyze_project");
        assert!(action.arguments.is_empty());
        assert_eq!(action.raw_arguments, "");
    }

    #[test]
    fn action_arguments_keep_inner_parentheses() {
        let action =
            extract_action(r#"Action: write_file("src/a.js", "export default () => 1")"#).unwrap();
        assert_eq!(action.arguments, vec!["src/a.js", "export default () => 1"]);
    }

    #[test]
    fn action_requires_parentheses() {
        assert!(extract_action("Action: analyze_project").is_none());
        assert!(extract_action("Action: (\"x\")").is_none());
    }

    #[test]
    fn line_scan_catches_indented_marker_with_empty_first_line() {
        let text = "  Final Answer:\n  first\nsecond";
        assert_eq!(extract_final_lines(text).as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn bare_marker_line_is_an_empty_final_answer() {
        let reply = parse("Thought: no files need changing\nFinal Answer:   ");
        assert_eq!(
            reply.directive,
            Directive::Final { answer: String::new(), tier: FinalTier::LineScan }
        );
    }

    #[test]
    fn bare_marker_mid_line_is_still_degraded() {
        let reply = parse("Here you go. Final Answer:");
        assert!(matches!(reply.directive, Directive::Degraded { .. }));
    }

    #[test]
    fn action_beats_bare_marker_line() {
        let reply = parse("Action: analyze_project()\nFinal Answer:");
        assert!(matches!(reply.directive, Directive::Action(_)));
    }

    #[test]
    fn degraded_permissive_keeps_prose_and_paths() {
        let text = "src/App.jsx\nHello there\nsrc/index.js";
        let (out, recovered) = recover_degraded(text, DegradedFilter::Permissive);
        assert!(recovered);
        assert_eq!(out, "src/App.jsx\nHello there\nsrc/index.js");
    }

    #[test]
    fn degraded_paths_only_keeps_paths() {
        let text = "src/App.jsx\nHello there\nsrc/index.js";
        let (out, recovered) = recover_degraded(text, DegradedFilter::PathsOnly);
        assert!(recovered);
        assert_eq!(out, "src/App.jsx\nsrc/index.js");
    }

    #[test]
    fn degraded_permissive_drops_protocol_lines_without_paths() {
        let text = "Thought: thinking\nObservation: nothing\nwindows\\path\\file.vue";
        let (out, _) = recover_degraded(text, DegradedFilter::Permissive);
        assert_eq!(out, "windows\\path\\file.vue");
    }

    #[test]
    fn degraded_with_nothing_kept_returns_whole_text() {
        let text = "  Thought: only thinking  \nObservation: and observing";
        let (out, recovered) = recover_degraded(text, DegradedFilter::PathsOnly);
        assert!(!recovered);
        assert_eq!(out, text.trim());
    }

    #[test]
    fn thought_stops_at_action_line() {
        let thought = extract_thought("thought: read it first\nwith detail\naction: read_file(a)");
        assert_eq!(thought.as_deref(), Some("read it first\nwith detail"));
        assert!(extract_thought("no thought here").is_none());
    }

    #[test]
    fn exhausted_rescan_uses_final_tiers_only() {
        assert_eq!(extract_final_answer("Final Answer: ok").as_deref(), Some("ok"));
        assert!(extract_final_answer("Action: read_file(a)").is_none());
        assert_eq!(extract_final_answer("Action: read_file(a)\nFinal Answer:").as_deref(), Some(""));
    }
}
