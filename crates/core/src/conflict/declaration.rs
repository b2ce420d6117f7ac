//! Parsers for declaration statements inside replacement text.
//!
//! The semantic conflict checks need the *names* declared by an edit, not
//! its position: two edits that both declare `helper()` collide even when
//! their line ranges are disjoint. Parsing is line-based and hand-rolled,
//! handling the `import X` and `from X import Y` statement forms plus
//! `def name(...)` / `async def name(...)` definitions.

/// One import statement extracted from replacement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// The leading module name (`os` for both `import os.path` and
    /// `from os import path`).
    pub module: String,
    /// The trimmed statement text as written.
    pub raw: String,
}

/// Parse a single line as an import statement, if it is one.
pub fn parse_import_line(line: &str) -> Option<ImportStatement> {
    let trimmed = leading_statement(line);
    let mut tokens = trimmed.split_whitespace();

    match tokens.next()? {
        "import" => {
            let module = leading_identifier(tokens.next()?)?;
            Some(ImportStatement {
                module,
                raw: trimmed.to_string(),
            })
        }
        "from" => {
            let module = leading_identifier(tokens.next()?)?;
            // A bare `from X` without the import keyword is not a statement.
            if tokens.next()? != "import" {
                return None;
            }
            Some(ImportStatement {
                module,
                raw: trimmed.to_string(),
            })
        }
        _ => None,
    }
}

/// Whether a line is an import statement.
pub fn is_import_line(line: &str) -> bool {
    parse_import_line(line).is_some()
}

/// All import statements found in a block of text, in line order.
pub fn imports_in(text: &str) -> Vec<ImportStatement> {
    text.lines().filter_map(parse_import_line).collect()
}

/// All function names declared in a block of text, in declaration order,
/// without duplicates.
pub fn function_names_in(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in text.lines() {
        let mut stmt = leading_statement(line);
        if let Some(rest) = stmt.strip_prefix("async ") {
            stmt = rest.trim_start();
        }
        let Some(rest) = stmt.strip_prefix("def ") else {
            continue;
        };
        if let Some(name) = leading_identifier(rest.trim_start()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Trim indentation and any trailing comment from a line.
fn leading_statement(line: &str) -> &str {
    let trimmed = line.trim();
    match trimmed.find('#') {
        Some(pos) => trimmed[..pos].trim_end(),
        None => trimmed,
    }
}

/// The leading identifier (`[A-Za-z_][A-Za-z0-9_]*`) of a token, if any.
fn leading_identifier(token: &str) -> Option<String> {
    let end = token
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphanumeric() && *c != '_')
        .map_or(token.len(), |(i, _)| i);
    if end == 0 || token.as_bytes()[0].is_ascii_digit() {
        return None;
    }
    Some(token[..end].to_string())
}
