//! `dedent` and `indent` with the semantics of Python's `textwrap` helpers.

/// Removes the whitespace margin common to every non-blank line.
///
/// Whitespace-only lines are emptied before the margin is computed, as CPython does.
pub(crate) fn dedent(text: &str) -> String {
    let is_blank = |line: &str| line.bytes().all(|b| b == b' ' || b == b'\t');
    let leading = |line: &str| line.len() - line.trim_start_matches([' ', '\t']).len();

    let margin = text
        .split('\n')
        .filter(|line| !is_blank(*line))
        .map(|line| &line[..leading(line)])
        .reduce(|common, indent| {
            let shared = common.bytes().zip(indent.bytes()).take_while(|(a, b)| a == b).count();
            &common[..shared]
        })
        .unwrap_or_default();

    text.split('\n')
        .map(|line| if is_blank(line) { "" } else { line.strip_prefix(margin).unwrap_or(line) })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefixes every line that is not whitespace-only with `prefix`.
pub(crate) fn indent(text: &str, prefix: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            output.push_str(prefix);
        }
        output.push_str(line);
    }
    output
}
