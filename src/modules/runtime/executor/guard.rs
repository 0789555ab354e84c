//! Local detection of write clauses in Cypher text
//!
//! A small lexer skips string literals, quoted identifiers and comments, then
//! looks for clause keywords that mutate data or schema. Property accesses
//! (`n.set`), parameters (`$create`), labels (`:Delete`) and map keys
//! (`{merge: 1}`) are not clauses and are ignored.

const WRITE_KEYWORDS: &[&str] = &[
    "CREATE", "MERGE", "DELETE", "DETACH", "SET", "REMOVE", "DROP", "ALTER", "GRANT", "DENY",
    "REVOKE", "RENAME",
];

/// Returns the first write keyword found in `query`, if any
pub fn find_write_clause(query: &str) -> Option<&'static str> {
    let chars: Vec<char> = query.chars().collect();
    let mut i = 0;
    // Last character that was not whitespace, comment or literal content
    let mut previous: Option<char> = None;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                i = skip_string(&chars, i);
                previous = Some(c);
            }
            '`' => {
                i = skip_quoted_identifier(&chars, i);
                previous = Some('`');
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();

                let is_reference = matches!(previous, Some('.') | Some('$'))
                    && !preceded_by_space(&chars, start, previous);
                let is_label = previous == Some(':');
                let is_map_key = next_significant(&chars, i) == Some(':');

                if !(is_reference || is_label || is_map_key) {
                    if let Some(keyword) = WRITE_KEYWORDS
                        .iter()
                        .copied()
                        .find(|k| k.eq_ignore_ascii_case(&word))
                    {
                        return Some(keyword);
                    }
                }
                previous = chars.get(i - 1).copied();
            }
            c if c.is_whitespace() => i += 1,
            _ => {
                previous = Some(c);
                i += 1;
            }
        }
    }

    None
}

/// `.`/`$` only bind to a directly following word
fn preceded_by_space(chars: &[char], start: usize, previous: Option<char>) -> bool {
    match previous {
        Some('.') | Some('$') => start > 0 && chars[start - 1].is_whitespace(),
        _ => false,
    }
}

fn next_significant(chars: &[char], mut i: usize) -> Option<char> {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    chars.get(i).copied()
}

/// Returns the index just past the closing quote
fn skip_string(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

/// Returns the index just past the closing backtick; doubled backticks escape
fn skip_quoted_identifier(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == '`' {
            if chars.get(i + 1) == Some(&'`') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}
