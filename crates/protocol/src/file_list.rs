//! Newline-separated file lists returned by the first phase of a change request.

/// One candidate path per non-blank line, trimmed, in order, without duplicates.
///
/// Markdown code fences are dropped since models like to wrap lists in them.
pub fn parse_file_list(text: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with("```") {
            continue;
        }
        if !paths.iter().any(|p| p == line) {
            paths.push(line.to_string());
        }
    }
    paths
}
