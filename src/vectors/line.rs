// line.rs — Field splitting for `word v1 v2 ... vN` lines.
//
// Fields are separated by one or more ASCII spaces. Errors are plain messages;
// the loader attaches the file path and line number.

use crate::config;

fn fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(' ').filter(|f| !f.is_empty())
}

/// Parse a `vocabSize dimension` header line.
pub fn parse_header(line: &str) -> Option<(usize, usize)> {
    let parts: Vec<&str> = fields(line).collect();
    if parts.len() != config::vectors::HEADER_FIELD_COUNT {
        return None;
    }
    let vocab = parts[0].parse().ok()?;
    let dimension = parts[1].parse().ok()?;
    Some((vocab, dimension))
}

/// Return the word of a data line after checking it carries `dimension` components.
///
/// Components are not parsed; the first load pass only needs the word.
pub fn parse_word(line: &str, dimension: usize) -> Result<&str, String> {
    let mut fields = fields(line);
    let word = fields.next().ok_or("empty line")?;
    let found = fields.take(dimension).count();
    if found < dimension {
        return Err(format!(
            "expected {dimension} vector components after {word:?}, found {found}"
        ));
    }
    Ok(word)
}

/// Parse a data line, writing its components into `row`.
///
/// `row.len()` is the table dimension. Fields past the last component are ignored.
pub fn parse_row<'a>(line: &'a str, row: &mut [f64]) -> Result<&'a str, String> {
    let mut fields = fields(line);
    let word = fields.next().ok_or("empty line")?;
    let dimension = row.len();
    for (i, slot) in row.iter_mut().enumerate() {
        let field = fields.next().ok_or_else(|| {
            format!("expected {dimension} vector components after {word:?}, found {i}")
        })?;
        *slot = field
            .parse()
            .map_err(|_| format!("component {} of {word:?} is not a number: {field:?}", i + 1))?;
    }
    Ok(word)
}
