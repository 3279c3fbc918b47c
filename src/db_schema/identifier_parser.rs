//! Scanner for dotted, optionally delimited SQL names such as
//! `"Foo"."Bar".baz`.
//!
//! The scanner walks the input one character at a time. End of input is
//! handled like a `.` separator, so the last segment closes the same way
//! every other segment does.

use super::{
    errors::{IdentifierParseError, ViolationType},
    identifier::Identifier,
};

/// Character classes and extra validation for one SQL dialect.
///
/// The defaults follow SQL-92: `"` delimits, a name starts with a letter and
/// continues with letters, digits, combining marks and `_`.
pub trait IdentifierRules: Send + Sync {
    fn is_opening_delimiter(&self, c: char) -> bool {
        c == '"'
    }

    fn is_closing_delimiter(&self, c: char) -> bool {
        c == '"'
    }

    fn is_identifier_start(&self, c: char) -> bool {
        c.is_alphabetic()
    }

    fn is_identifier_body(&self, c: char) -> bool {
        c.is_alphanumeric() || c == '_' || is_joiner_or_mark(c)
    }

    /// Checked once per finished segment.
    fn is_valid_identifier(&self, _name: &str, _delimited: bool) -> bool {
        true
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Sql92IdentifierRules;

impl IdentifierRules for Sql92IdentifierRules {}

fn is_joiner_or_mark(c: char) -> bool {
    matches!(c, '\u{200C}' | '\u{200D}' | '\u{00AD}')
        || ('\u{0300}'..='\u{036F}').contains(&c)
        || ('\u{1AB0}'..='\u{1AFF}').contains(&c)
        || ('\u{20D0}'..='\u{20FF}').contains(&c)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Start,
    InUndelimited,
    InDelimited,
    DelimitedEnd,
}

pub struct IdentifierParser<'r> {
    rules: &'r dyn IdentifierRules,
    min_parts: usize,
    max_parts: usize,
}

impl<'r> IdentifierParser<'r> {
    pub fn new(rules: &'r dyn IdentifierRules, min_parts: usize, max_parts: usize) -> Self {
        IdentifierParser {
            rules,
            min_parts,
            max_parts,
        }
    }

    pub fn parse(&self, text: &str) -> Result<Vec<Identifier>, IdentifierParseError> {
        let chars: Vec<char> = text.chars().collect();
        let mut parts: Vec<Identifier> = Vec::new();
        let mut buffer = String::new();
        let mut state = ScanState::Start;

        for position in 0..=chars.len() {
            let current = chars.get(position).copied();
            state = match (state, current) {
                (ScanState::Start, None) => {
                    return Err(IdentifierParseError::new(
                        ViolationType::UnexpectedEnd,
                        position,
                        "Unexpected end; expected a SQL identifier",
                    ));
                }
                (ScanState::Start, Some(c)) if self.rules.is_opening_delimiter(c) => {
                    ScanState::InDelimited
                }
                (ScanState::Start, Some(c)) if self.rules.is_identifier_start(c) => {
                    buffer.push(c);
                    ScanState::InUndelimited
                }
                (ScanState::InDelimited, None) => {
                    return Err(IdentifierParseError::new(
                        ViolationType::UnexpectedEnd,
                        position,
                        "Unexpected end; expected closing delimiter",
                    ));
                }
                (ScanState::InDelimited, Some(c)) if self.rules.is_closing_delimiter(c) => {
                    ScanState::DelimitedEnd
                }
                (ScanState::InDelimited, Some(c)) => {
                    buffer.push(c);
                    ScanState::InDelimited
                }
                // A second closing delimiter is an escaped one
                (ScanState::DelimitedEnd, Some(c)) if self.rules.is_closing_delimiter(c) => {
                    buffer.push(c);
                    ScanState::InDelimited
                }
                (ScanState::DelimitedEnd, None) | (ScanState::DelimitedEnd, Some('.')) => {
                    if buffer.is_empty() {
                        return Err(IdentifierParseError::new(
                            ViolationType::EmptyDelimitedIdentifier,
                            position,
                            "Empty delimited identifier",
                        ));
                    }
                    self.finish_identifier(&mut parts, &mut buffer, true, position)?;
                    ScanState::Start
                }
                (ScanState::InUndelimited, None) | (ScanState::InUndelimited, Some('.')) => {
                    self.finish_identifier(&mut parts, &mut buffer, false, position)?;
                    ScanState::Start
                }
                (ScanState::InUndelimited, Some(c)) if self.rules.is_identifier_body(c) => {
                    buffer.push(c);
                    ScanState::InUndelimited
                }
                (_, Some(c)) => {
                    return Err(IdentifierParseError::new(
                        ViolationType::UnexpectedCharacter,
                        position,
                        format!(
                            "Unexpected character '{}' at {} in SQL identifier",
                            c,
                            position + 1
                        ),
                    ));
                }
            };
        }

        if parts.len() < self.min_parts {
            return Err(IdentifierParseError::new(
                ViolationType::UnexpectedEnd,
                chars.len(),
                format!(
                    "Unexpected end; expected at least {} identifiers",
                    self.min_parts
                ),
            ));
        }
        Ok(parts)
    }

    fn finish_identifier(
        &self,
        parts: &mut Vec<Identifier>,
        buffer: &mut String,
        delimited: bool,
        position: usize,
    ) -> Result<(), IdentifierParseError> {
        if parts.len() >= self.max_parts {
            let message = if self.max_parts == 1 {
                "Expected unqualified identifier".to_string()
            } else {
                format!("Too many identifiers; expected at most {}", self.max_parts)
            };
            return Err(IdentifierParseError::new(
                ViolationType::TooManyIdentifiers,
                position,
                message,
            ));
        }
        let name = std::mem::take(buffer);
        if !self.rules.is_valid_identifier(&name, delimited) {
            return Err(IdentifierParseError::new(
                ViolationType::VendorRuleViolated,
                position,
                "Failed database-specific identifier validation rule",
            ));
        }
        parts.push(Identifier::new(name, delimited));
        Ok(())
    }
}

/// Parses with the SQL-92 rules.
pub fn parse_identifiers(
    text: &str,
    min_parts: usize,
    max_parts: usize,
) -> Result<Vec<Identifier>, IdentifierParseError> {
    IdentifierParser::new(&Sql92IdentifierRules, min_parts, max_parts).parse(text)
}
