//! Pluggable structural validation of unified output.
//!
//! The engine is decoupled from any specific grammar: callers inject an
//! [`ArtifactValidator`] appropriate to their artifact's language, and the
//! applier reports a warning (never an error) when it rejects the result.

/// Capability for checking that unified text is structurally well-formed.
pub trait ArtifactValidator: Send + Sync {
    /// Whether `text` passes the structural check.
    fn is_well_formed(&self, text: &str) -> bool;
}

impl<F> ArtifactValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_well_formed(&self, text: &str) -> bool {
        self(text)
    }
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidation;

impl ArtifactValidator for NoValidation {
    fn is_well_formed(&self, _text: &str) -> bool {
        true
    }
}

/// Grammar-agnostic smoke test: brackets, braces, and parentheses must
/// balance outside of quoted strings and `#` comments.
///
/// Quotes are treated as single-line; a real grammar check belongs in a
/// caller-supplied validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalancedDelimiters;

impl ArtifactValidator for BalancedDelimiters {
    fn is_well_formed(&self, text: &str) -> bool {
        let mut stack = Vec::new();
        let mut quote: Option<char> = None;
        let mut in_comment = false;
        let mut escaped = false;

        for c in text.chars() {
            if c == '\n' {
                quote = None;
                in_comment = false;
                escaped = false;
                continue;
            }
            if in_comment {
                continue;
            }
            if escaped {
                escaped = false;
                continue;
            }
            match quote {
                Some(q) => match c {
                    '\\' => escaped = true,
                    _ if c == q => quote = None,
                    _ => {}
                },
                None => match c {
                    '\'' | '"' => quote = Some(c),
                    '#' => in_comment = true,
                    '(' | '[' | '{' => stack.push(c),
                    ')' => {
                        if stack.pop() != Some('(') {
                            return false;
                        }
                    }
                    ']' => {
                        if stack.pop() != Some('[') {
                            return false;
                        }
                    }
                    '}' => {
                        if stack.pop() != Some('{') {
                            return false;
                        }
                    }
                    _ => {}
                },
            }
        }

        stack.is_empty()
    }
}
