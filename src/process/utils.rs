/// Trim whitespace, drop at most one leading and one trailing `"`, trim again.
///
/// The two quotes are stripped independently, so a cell that only opens a
/// quote (`"Muscat`) still comes out clean.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.trim().to_string()
}

/// Split one CSV line on commas that sit outside a double-quoted span.
///
/// A comma separates fields only when the rest of the line after it holds an
/// even number of `"` characters. Quotes are kept in the returned cells;
/// `clean_str` removes the outer pair afterwards.
pub fn split_line(line: &str) -> Vec<&str> {
    let mut quotes_after = line.bytes().filter(|&b| b == b'"').count();
    let mut cells = Vec::new();
    let mut start = 0;

    for (i, b) in line.bytes().enumerate() {
        match b {
            b'"' => quotes_after -= 1,
            b',' if quotes_after % 2 == 0 => {
                cells.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    cells.push(&line[start..]);
    cells
}

/// Coerce a raw cell into a number.
///
/// Everything except ASCII digits, `.` and `-` is discarded before parsing, so
/// thousands separators and unit symbols fall away. Whatever cannot be parsed
/// afterwards (empty, `1-2`, `1.2.3`) is 0.
pub fn coerce_number(raw: &str) -> f64 {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    match kept.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
