//! Mapping interpreter errors back to original source positions through
//! the `--LINE:<n>` markers embedded in generated programs.

/// Prefix of every line marker the emitter writes.
pub const LINE_MARKER: &str = "--LINE:";

/// Parse the first `luajit: <path>:<line>: <message>` line of interpreter
/// stderr. Returns the line in the generated program and the message.
pub fn parse_interpreter_error(stderr: &str) -> Option<(u32, String)> {
    let first = stderr.lines().next()?;
    let rest = first.strip_prefix("luajit: ")?;
    // The path itself carries no `:<digits>:` sequence; scan for the
    // first colon followed by digits and another colon.
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' {
            let digit_start = i + 1;
            let mut j = digit_start;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > digit_start && bytes.get(j) == Some(&b':') {
                let line: u32 = rest[digit_start..j].parse().ok()?;
                let message = rest[j + 1..].trim().to_string();
                return Some((line, message));
            }
        }
        i += 1;
    }
    None
}

/// Walk the generated program backwards from `line` (1-based) to the
/// nearest line marker and return the original source line it names.
pub fn nearest_marker(program: &str, line: u32) -> Option<u32> {
    let lines: Vec<&str> = program.lines().collect();
    let upto = (line as usize).min(lines.len());
    for text in lines[..upto].iter().rev() {
        if let Some(rest) = text.strip_prefix(LINE_MARKER) {
            return rest.trim().parse().ok();
        }
    }
    None
}
