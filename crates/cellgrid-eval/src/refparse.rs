//! Textual reference parsing.
//!
//! Splits a reference expression into its workbook prefix, sheet part, and
//! A1 tail. The grammar covers the shapes that reach the adapter:
//!
//! ```text
//! A1              B2:C9
//! Sheet1!A1       Sheet1:Sheet3!A1:A9
//! 'Jan Sales'!C3
//! [Book2.xlsx]Sheet1!A1
//! '[Book two.xlsx]Jan Sales'!A1
//! [3]Sheet1!A1
//! ```
//!
//! Quoted prefixes escape an apostrophe by doubling it; bracketed book
//! segments escape a closing bracket the same way (`]]`).

use cellgrid_model::Range;

use crate::error::EvalError;

/// A reference expression split into its qualifying parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedRef {
    /// Workbook qualifier, brackets stripped and unescaped. `None` for
    /// same-workbook references.
    pub book: Option<String>,
    /// First (or only) sheet name. `None` when the reference carries no
    /// sheet part at all.
    pub sheet: Option<String>,
    /// Second sheet name of a `First:Last!` span.
    pub last_sheet: Option<String>,
    pub range: Range,
    /// Whether the tail was written as an area (`A1:B2`) rather than a
    /// single cell.
    pub is_area: bool,
}

/// The workbook qualifier of a reference, after bracket stripping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookToken {
    /// `[3]` style: a direct 1-based link table position.
    Numeric(usize),
    /// `[Book2.xlsx]` style: a link target to look up or synthesize.
    Named(String),
}

/// Classify a workbook qualifier. Accepts the bracketed and bare forms.
pub fn parse_book_token(raw: &str) -> Result<BookToken, EvalError> {
    let inner = match raw.strip_prefix('[') {
        Some(rest) => {
            let (name, after) = scan_bracket_body(rest)
                .ok_or_else(|| EvalError::InvalidBookReference(raw.to_string()))?;
            if !after.is_empty() {
                return Err(EvalError::InvalidBookReference(raw.to_string()));
            }
            name
        }
        None => raw.to_string(),
    };
    if inner.is_empty() {
        return Err(EvalError::InvalidBookReference(raw.to_string()));
    }
    if inner.bytes().all(|b| b.is_ascii_digit()) {
        let n: usize = inner
            .parse()
            .map_err(|_| EvalError::InvalidBookReference(raw.to_string()))?;
        Ok(BookToken::Numeric(n))
    } else {
        Ok(BookToken::Named(inner))
    }
}

/// Parse one full reference expression.
pub fn parse_reference(text: &str) -> Result<ParsedRef, EvalError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(EvalError::Generic("empty reference".into()));
    }

    let (prefix, tail) = split_prefix(text)?;
    let (book, sheet, last_sheet) = match prefix {
        Some(p) => parse_prefix(&p)?,
        None => (None, None, None),
    };

    let is_area = tail.contains(':');
    let range = Range::from_a1(tail)
        .map_err(|e| EvalError::Generic(format!("bad cell reference '{tail}': {e}")))?;

    Ok(ParsedRef {
        book,
        sheet,
        last_sheet,
        range,
        is_area,
    })
}

/// Split off the part before `!`, honoring a quoted prefix. Returns the
/// unquoted prefix (if any) and the A1 tail.
fn split_prefix(text: &str) -> Result<(Option<String>, &str), EvalError> {
    if let Some(rest) = text.strip_prefix('\'') {
        let (prefix, after) = scan_quote_body(rest)
            .ok_or_else(|| EvalError::Generic(format!("unterminated quote in '{text}'")))?;
        let tail = after
            .strip_prefix('!')
            .ok_or_else(|| EvalError::Generic(format!("expected '!' after quoted prefix in '{text}'")))?;
        return Ok((Some(prefix), tail));
    }
    match text.split_once('!') {
        Some((prefix, tail)) => Ok((Some(prefix.to_string()), tail)),
        None => Ok((None, text)),
    }
}

/// Decompose an unquoted prefix into book / first sheet / last sheet.
fn parse_prefix(prefix: &str) -> Result<(Option<String>, Option<String>, Option<String>), EvalError> {
    let (book, sheets) = match prefix.strip_prefix('[') {
        Some(rest) => {
            let (name, after) = scan_bracket_body(rest)
                .ok_or_else(|| EvalError::InvalidBookReference(prefix.to_string()))?;
            (Some(name), after)
        }
        None => (None, prefix),
    };

    if sheets.is_empty() {
        return Ok((book, None, None));
    }
    match sheets.split_once(':') {
        Some((first, last)) => Ok((
            book,
            Some(first.to_string()),
            Some(last.to_string()),
        )),
        None => Ok((book, Some(sheets.to_string()), None)),
    }
}

/// Consume a bracketed book name starting just after `[`. A doubled `]]`
/// stands for a literal bracket. Returns the unescaped name and the rest.
fn scan_bracket_body(rest: &str) -> Option<(String, &str)> {
    let mut name = String::new();
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b']' {
            if bytes.get(i + 1) == Some(&b']') {
                name.push(']');
                i += 2;
            } else {
                return Some((name, &rest[i + 1..]));
            }
        } else {
            let ch = rest[i..].chars().next()?;
            name.push(ch);
            i += ch.len_utf8();
        }
    }
    None
}

/// Consume a quoted prefix starting just after the opening `'`. A doubled
/// `''` stands for a literal apostrophe.
fn scan_quote_body(rest: &str) -> Option<(String, &str)> {
    let mut body = String::new();
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                body.push('\'');
                i += 2;
            } else {
                return Some((body, &rest[i + 1..]));
            }
        } else {
            let ch = rest[i..].chars().next()?;
            body.push(ch);
            i += ch.len_utf8();
        }
    }
    None
}

/// Pull the candidate reference terms out of a formula body.
///
/// This is a coarse scan, not a grammar: it keeps runs of reference-shaped
/// characters together (including quoted and bracketed segments), skips
/// double-quoted string literals wholesale, and drops operators and
/// punctuation. Callers decide what each term actually is.
pub fn extract_ref_terms(formula: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < formula.len() {
        let ch = match formula[i..].chars().next() {
            Some(c) => c,
            None => break,
        };
        match ch {
            '"' => {
                // A string literal; its content (apostrophes included) is
                // not reference text. A doubled `""` is an escaped quote.
                if !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
                let mut j = i + 1;
                loop {
                    match formula[j..].find('"') {
                        Some(k) => {
                            let close = j + k + 1;
                            if formula[close..].starts_with('"') {
                                j = close + 1;
                            } else {
                                j = close;
                                break;
                            }
                        }
                        None => {
                            j = formula.len();
                            break;
                        }
                    }
                }
                i = j;
            }
            '\'' => {
                // Carry the whole quoted segment, quotes included, so the
                // term still parses as a quoted prefix.
                match scan_quote_body(&formula[i + 1..]) {
                    Some((body, after)) => {
                        current.push('\'');
                        // Re-escape to keep the term parseable on its own.
                        current.push_str(&body.replace('\'', "''"));
                        current.push('\'');
                        i = formula.len() - after.len();
                    }
                    None => break, // unterminated quote, stop scanning
                }
            }
            '[' => match scan_bracket_body(&formula[i + 1..]) {
                Some((body, after)) => {
                    current.push('[');
                    current.push_str(&body.replace(']', "]]"));
                    current.push(']');
                    i = formula.len() - after.len();
                }
                None => break,
            },
            c if c.is_alphanumeric() || matches!(c, '$' | '!' | ':' | '.' | '_') => {
                current.push(c);
                i += c.len_utf8();
            }
            c => {
                if !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
                i += c.len_utf8();
            }
        }
    }
    if !current.is_empty() {
        terms.push(current);
    }
    terms
}

#[cfg(test)]
mod tests {
    use cellgrid_model::CellRef;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn bare_cell_and_area() {
        let r = parse_reference("B2").unwrap();
        assert_eq!(r.book, None);
        assert_eq!(r.sheet, None);
        assert!(!r.is_area);
        assert_eq!(r.range.start, CellRef::new(1, 1));

        let r = parse_reference("A1:C3").unwrap();
        assert!(r.is_area);
        assert_eq!(r.range.end, CellRef::new(2, 2));
    }

    #[test]
    fn sheet_and_span_prefixes() {
        let r = parse_reference("Sheet1!A1").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Sheet1"));
        assert_eq!(r.last_sheet, None);

        let r = parse_reference("Sheet1:Sheet3!A1:A9").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Sheet1"));
        assert_eq!(r.last_sheet.as_deref(), Some("Sheet3"));
        assert!(r.is_area);
    }

    #[test]
    fn quoted_prefix_with_escaped_apostrophe() {
        let r = parse_reference("'Bob''s Data'!C3").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Bob's Data"));
    }

    #[test]
    fn bracketed_book_prefixes() {
        let r = parse_reference("[Book2.xlsx]Sheet1!A1").unwrap();
        assert_eq!(r.book.as_deref(), Some("Book2.xlsx"));
        assert_eq!(r.sheet.as_deref(), Some("Sheet1"));

        let r = parse_reference("'[Book two.xlsx]Jan Sales'!A1").unwrap();
        assert_eq!(r.book.as_deref(), Some("Book two.xlsx"));
        assert_eq!(r.sheet.as_deref(), Some("Jan Sales"));

        let r = parse_reference("[Odd]]Name.xlsx]Sheet1!A1").unwrap();
        assert_eq!(r.book.as_deref(), Some("Odd]Name.xlsx"));
    }

    #[test]
    fn book_tokens() {
        assert_eq!(parse_book_token("[3]").unwrap(), BookToken::Numeric(3));
        assert_eq!(parse_book_token("7").unwrap(), BookToken::Numeric(7));
        assert_eq!(
            parse_book_token("[Book1.xlsx]").unwrap(),
            BookToken::Named("Book1.xlsx".into())
        );
        assert_eq!(
            parse_book_token("Book1.xlsx").unwrap(),
            BookToken::Named("Book1.xlsx".into())
        );
        assert!(matches!(
            parse_book_token("[").unwrap_err(),
            EvalError::InvalidBookReference(_)
        ));
    }

    #[test]
    fn term_extraction_keeps_references_whole() {
        assert_eq!(
            extract_ref_terms("SUM(A1:B2)+Sheet2!C3*2"),
            vec!["SUM", "A1:B2", "Sheet2!C3", "2"]
        );
        assert_eq!(
            extract_ref_terms("'Jan Sales'!A1&\" units\""),
            vec!["'Jan Sales'!A1"]
        );
        assert_eq!(
            extract_ref_terms("[Book2.xlsx]Sheet1!A1-TaxRate"),
            vec!["[Book2.xlsx]Sheet1!A1", "TaxRate"]
        );
    }

    #[test]
    fn string_literals_do_not_swallow_following_operands() {
        // An apostrophe inside a literal is text, not a sheet-name quote.
        assert_eq!(
            extract_ref_terms("IF(A1=\"it's\",B1,C1)"),
            vec!["IF", "A1", "B1", "C1"]
        );
        // Escaped quotes stay inside the literal.
        assert_eq!(extract_ref_terms("\"say \"\"hi\"\"\"&A1"), vec!["A1"]);
        // An unterminated literal consumes the rest, nothing more.
        assert_eq!(extract_ref_terms("A1&\"oops"), vec!["A1"]);
    }
}
