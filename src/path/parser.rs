//! Path text to [`Path`].

use super::{Path, PathComponent, PathError};

/// Parses a dotted path.
///
/// The empty string parses to the empty path.
///
/// # Errors
///
/// Returns [`PathError::UnbalancedParens`] if the parentheses do not nest,
/// and [`PathError::MalformedComponent`] for any component that does not fit
/// the grammar, including empty components (`a..b`, `.a`, `a.`).
pub fn parse_path(text: &str) -> Result<Path, PathError> {
    if text.is_empty() {
        return Ok(Path::default());
    }
    split_components(text)?
        .into_iter()
        .enumerate()
        .map(|(position, part)| parse_component(part, position))
        .collect::<Result<Vec<_>, _>>()
        .map(Path::new)
}

/// Splits on `.` at parenthesis depth 0.
fn split_components(text: &str) -> Result<Vec<&str>, PathError> {
    let unbalanced = |position| PathError::UnbalancedParens {
        path: text.to_string(),
        position,
    };

    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.checked_sub(1).ok_or_else(|| unbalanced(i))?,
            b'.' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(unbalanced(text.len()));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

fn parse_component(text: &str, position: usize) -> Result<PathComponent, PathError> {
    let malformed = || PathError::MalformedComponent {
        component: text.to_string(),
        position,
    };

    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
        i += 1;
    }
    let tag = (i > 0).then(|| text[..i].to_string());

    let mut auto_number = false;
    let mut index = None;
    if tag.is_some() {
        if bytes.get(i) == Some(&b'#') {
            auto_number = true;
            i += 1;
        }
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i > digits_start {
            index = Some(text[digits_start..i].parse::<u32>().map_err(|_| malformed())?);
        }
    }

    let identifier = if i == bytes.len() {
        None
    } else {
        let inner = text[i..]
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .filter(|inner| !inner.is_empty() && parens_nest(inner))
            .ok_or_else(malformed)?;
        Some(inner.to_string())
    };

    if tag.is_none() && identifier.is_none() {
        return Err(malformed());
    }

    Ok(PathComponent {
        tag,
        index,
        identifier,
        auto_number,
    })
}

fn parens_nest(text: &str) -> bool {
    let mut depth = 0usize;
    for b in text.bytes() {
        match b {
            b'(' => depth += 1,
            b')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}
