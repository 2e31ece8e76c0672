//! KeyValues text tokenizer and parser.

use thiserror::Error;

use super::tree::{KvSection, KvValue};

/// Errors that can occur while parsing KeyValues text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KvError {
    /// A quoted string reached end of input before its closing quote.
    #[error("Unterminated string starting on line {line}")]
    UnterminatedString { line: usize },

    /// A `}` appeared with no open section.
    #[error("Unexpected '}}' on line {line}")]
    UnexpectedClose { line: usize },

    /// A `{` appeared where a key was expected.
    #[error("Unexpected '{{' on line {line}")]
    UnexpectedOpen { line: usize },

    /// Input ended inside a section or after a key without a value.
    #[error("Unexpected end of input on line {line}")]
    UnexpectedEof { line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Str(String),
    Open,
    Close,
    Conditional,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, KvError> {
        loop {
            let Some(&c) = self.chars.peek() else {
                return Ok(None);
            };
            match c {
                c if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                '/' => {
                    self.bump();
                    if self.chars.peek() == Some(&'/') {
                        self.skip_line();
                    } else {
                        let mut word = String::from("/");
                        word.push_str(&self.unquoted());
                        return Ok(Some(Token::Str(word)));
                    }
                }
                '#' => {
                    // #base / #include directives
                    self.skip_line();
                }
                '{' => {
                    self.bump();
                    return Ok(Some(Token::Open));
                }
                '}' => {
                    self.bump();
                    return Ok(Some(Token::Close));
                }
                '[' => {
                    while let Some(c) = self.bump() {
                        if c == ']' || c == '\n' {
                            break;
                        }
                    }
                    return Ok(Some(Token::Conditional));
                }
                '"' => {
                    self.bump();
                    return self.quoted().map(|s| Some(Token::Str(s)));
                }
                _ => return Ok(Some(Token::Str(self.unquoted()))),
            }
        }
    }

    fn quoted(&mut self) -> Result<String, KvError> {
        let start = self.line;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(KvError::UnterminatedString { line: start }),
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err(KvError::UnterminatedString { line: start }),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn unquoted(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }
}

/// Parse KeyValues text into its root section.
///
/// The root may hold several top-level pairs. Platform conditionals such as
/// `[$WIN32]` are accepted and ignored, as are `#base`/`#include` lines.
///
/// # Example
///
/// ```
/// use vpkfs::keyvalues::parse;
///
/// let root = parse(r#""AppState" { "appid" "620" "installdir" "Portal 2" }"#).unwrap();
/// let app = root.section("appstate").unwrap();
/// assert_eq!(app.get("InstallDir"), Some("Portal 2"));
/// ```
pub fn parse(text: &str) -> Result<KvSection, KvError> {
    let mut lexer = Lexer::new(text);
    let root = parse_section(&mut lexer, false)?;
    Ok(root)
}

fn parse_section(lexer: &mut Lexer<'_>, nested: bool) -> Result<KvSection, KvError> {
    let mut section = KvSection::new();
    loop {
        let key = match lexer.next_token()? {
            None if nested => return Err(KvError::UnexpectedEof { line: lexer.line }),
            None => return Ok(section),
            Some(Token::Close) if nested => return Ok(section),
            Some(Token::Close) => return Err(KvError::UnexpectedClose { line: lexer.line }),
            Some(Token::Open) => return Err(KvError::UnexpectedOpen { line: lexer.line }),
            Some(Token::Conditional) => continue,
            Some(Token::Str(key)) => key,
        };

        let value = loop {
            match lexer.next_token()? {
                None => return Err(KvError::UnexpectedEof { line: lexer.line }),
                Some(Token::Conditional) => continue,
                Some(Token::Open) => break KvValue::Section(parse_section(lexer, true)?),
                Some(Token::Str(value)) => break KvValue::Leaf(value),
                Some(Token::Close) => return Err(KvError::UnexpectedClose { line: lexer.line }),
            }
        };
        section.push(key, value);
    }
}
