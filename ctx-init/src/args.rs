//! Shell-like splitting of `--pre` / `--post` command lines.

/// Split a command line into arguments.
///
/// - unquoted spaces separate arguments
/// - a `"..."` span is part of a single argument (quotes are removed)
/// - `\` copies the next character verbatim, including `"`, `\` and space
///
/// No variable expansion, globbing or single-quote handling. An unterminated
/// quote runs to the end of the input. A trailing lone `\` is kept as is.
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    // Distinguishes an explicit empty argument (`""`) from no argument.
    let mut in_token = false;
    let mut in_quotes = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => current.push('\\'),
                }
                in_token = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            ' ' if !in_quotes => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            other => {
                current.push(other);
                in_token = true;
            }
        }
    }

    if in_token {
        args.push(current);
    }
    args
}
