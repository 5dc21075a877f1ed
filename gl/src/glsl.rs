//! just enough of a glsl front end to make the headless driver behave like a real one: it
//! catches the mistakes that are commonly made in hand-written shaders (missing `#version`,
//! unbalanced delimiters, a statement without a trailing `;`) and extracts the stage interface
//! (`in`/`out`/`uniform` declarations) that linking needs.
//!
//! diagnostics are formatted the way mesa formats them: `0:LINE(COLUMN): error: MESSAGE`.

use std::collections::HashMap;
use std::fmt;

const SUPPORTED_VERSIONS: &[u32] = &[
    110, 120, 130, 140, 150, 330, 400, 410, 420, 430, 440, 450, 460,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub position: Position,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0:{line}({column}): error: {message}",
            line = self.position.line,
            column = self.position.column,
            message = self.message,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageQualifier {
    In,
    Out,
    Uniform,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub qualifier: StorageQualifier,
    pub ty: String,
    pub name: String,
}

/// interface of a successfully checked stage.
#[derive(Debug, Clone, Default)]
pub struct Unit {
    pub version: u32,
    pub declarations: Vec<Declaration>,
    pub has_main: bool,
    /// how many times each identifier occurs in the source (declarations included).
    pub identifier_counts: HashMap<String, usize>,
}

impl Unit {
    pub fn iter_declarations(
        &self,
        qualifier: StorageQualifier,
    ) -> impl Iterator<Item = &Declaration> {
        self.declarations
            .iter()
            .filter(move |decl| decl.qualifier == qualifier)
    }

    /// a uniform that is declared but never referenced gets optimized out by real drivers and is
    /// thus not active.
    pub fn is_referenced(&self, name: &str) -> bool {
        self.identifier_counts.get(name).is_some_and(|count| *count > 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Number,
    Punct(char),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: Position,
}

impl Token {
    fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punct(ch)
    }

    fn ident(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Ident(ref ident) => Some(ident.as_str()),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self.kind {
            TokenKind::Ident(ref ident) => format!("IDENTIFIER `{ident}'"),
            TokenKind::Number => "number".to_string(),
            TokenKind::Punct(ch) => format!("'{ch}'"),
        }
    }
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: Position,
    at_line_start: bool,
}

enum Lexed {
    Token(Token),
    Directive { line: String, position: Position },
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            position: Position { line: 1, column: 1 },
            at_line_start: true,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.position.line += 1;
            self.position.column = 1;
            self.at_line_start = true;
        } else {
            self.position.column += 1;
        }
        Some(ch)
    }

    fn skip_trivia(&mut self) -> Result<(), Diagnostic> {
        loop {
            match self.chars.peek().copied() {
                // NOTE: sources embedded as c strings tend to carry a terminating nul.
                Some(ch) if ch.is_whitespace() || ch == '\0' => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.next() {
                        Some('/') => {
                            while self.chars.peek().is_some_and(|ch| *ch != '\n') {
                                self.bump();
                            }
                        }
                        Some('*') => {
                            let start = self.position;
                            self.bump();
                            self.bump();
                            let mut prev = '\0';
                            loop {
                                match self.bump() {
                                    Some('/') if prev == '*' => break,
                                    Some(ch) => prev = ch,
                                    None => {
                                        return Err(Diagnostic {
                                            position: start,
                                            message: "unterminated comment".to_string(),
                                        });
                                    }
                                }
                            }
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next(&mut self) -> Result<Option<Lexed>, Diagnostic> {
        self.skip_trivia()?;
        let Some(ch) = self.chars.peek().copied() else {
            return Ok(None);
        };
        let position = self.position;
        // NOTE: only a newline resets this, so a `#` that follows a token on the same line is not
        // a directive.
        let at_line_start = self.at_line_start;
        self.at_line_start = false;

        if ch == '#' {
            if !at_line_start {
                return Err(Diagnostic {
                    position,
                    message: "syntax error, unexpected '#'".to_string(),
                });
            }
            let mut line = String::new();
            while let Some(ch) = self.chars.peek().copied() {
                if ch == '\n' {
                    break;
                }
                line.push(ch);
                self.bump();
            }
            return Ok(Some(Lexed::Directive { line, position }));
        }

        let kind = if ch.is_ascii_alphabetic() || ch == '_' {
            let mut ident = String::new();
            while let Some(ch) = self
                .chars
                .peek()
                .copied()
                .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            {
                ident.push(ch);
                self.bump();
            }
            TokenKind::Ident(ident)
        } else if ch.is_ascii_digit()
            || ch == '.' && self.peek_second().is_some_and(|ch| ch.is_ascii_digit())
        {
            let mut prev = ch;
            self.bump();
            while let Some(ch) = self.chars.peek().copied() {
                let exponent_sign = (ch == '+' || ch == '-') && matches!(prev, 'e' | 'E');
                if !(ch.is_ascii_alphanumeric() || ch == '.' || exponent_sign) {
                    break;
                }
                prev = ch;
                self.bump();
            }
            TokenKind::Number
        } else if "{}()[];,.=+-*/%<>!&|^~?:".contains(ch) {
            self.bump();
            TokenKind::Punct(ch)
        } else {
            return Err(Diagnostic {
                position,
                message: format!("syntax error, unexpected character '{ch}'"),
            });
        };

        Ok(Some(Lexed::Token(Token { kind, position })))
    }

    fn peek_second(&self) -> Option<char> {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        lookahead.next()
    }
}

fn parse_version(line: &str, position: Position) -> Result<u32, Diagnostic> {
    let mut words = line.trim_start_matches('#').split_whitespace();
    let version_position = Position {
        line: position.line,
        column: position.column + 9,
    };
    let version = words
        .nth(1)
        .and_then(|word| word.parse::<u32>().ok())
        .ok_or_else(|| Diagnostic {
            position: version_position,
            message: "invalid #version directive".to_string(),
        })?;
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(Diagnostic {
            position: version_position,
            message: format!(
                "GLSL {major}.{minor:02} is not supported",
                major = version / 100,
                minor = version % 100,
            ),
        });
    }
    match words.next() {
        None | Some("core") | Some("compatibility") => {}
        Some(profile) => {
            return Err(Diagnostic {
                position: version_position,
                message: format!("invalid profile `{profile}'"),
            });
        }
    }
    Ok(version)
}

fn tokenize(source: &str) -> Result<(u32, Vec<Token>), Diagnostic> {
    let mut lexer = Lexer::new(source);
    let mut version: Option<u32> = None;
    let mut tokens = Vec::new();

    while let Some(lexed) = lexer.next()? {
        match lexed {
            Lexed::Directive { line, position } => {
                let is_version = line
                    .trim_start_matches('#')
                    .trim_start()
                    .starts_with("version");
                if is_version {
                    if version.is_some() || !tokens.is_empty() {
                        return Err(Diagnostic {
                            position,
                            message: "#version must appear on the first line".to_string(),
                        });
                    }
                    version = Some(parse_version(&line, position)?);
                }
                // NOTE: other directives (#define, #extension, ...) are accepted as is.
            }
            Lexed::Token(token) => {
                if version.is_none() {
                    return Err(Diagnostic {
                        position: Position { line: 1, column: 1 },
                        message: "#version directive is missing".to_string(),
                    });
                }
                tokens.push(token);
            }
        }
    }

    let version = version.ok_or_else(|| Diagnostic {
        position: lexer.position,
        message: "syntax error, unexpected end of file".to_string(),
    })?;
    Ok((version, tokens))
}

fn check_delimiters(tokens: &[Token], eof: Position) -> Result<(), Diagnostic> {
    let mut stack: Vec<&Token> = Vec::new();
    let mut prev: Option<&Token> = None;

    for token in tokens {
        let TokenKind::Punct(ch) = token.kind else {
            prev = Some(token);
            continue;
        };
        match ch {
            '(' | '[' | '{' => stack.push(token),
            ')' | ']' | '}' => {
                let expected_open = match ch {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if !stack.pop().is_some_and(|open| open.is_punct(expected_open)) {
                    return Err(Diagnostic {
                        position: token.position,
                        message: format!("syntax error, unexpected '{ch}'"),
                    });
                }
                // a block may only close after a complete statement.
                if ch == '}' {
                    let terminated = prev.is_some_and(|prev| {
                        prev.is_punct(';') || prev.is_punct('{') || prev.is_punct('}')
                    });
                    if !terminated {
                        return Err(Diagnostic {
                            position: token.position,
                            message: "syntax error, unexpected '}', expecting ',' or ';'"
                                .to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
        prev = Some(token);
    }

    match stack.last() {
        Some(_) => Err(Diagnostic {
            position: eof,
            message: "syntax error, unexpected end of file".to_string(),
        }),
        None => Ok(()),
    }
}

const IGNORED_QUALIFIERS: &[&str] = &[
    "flat",
    "smooth",
    "noperspective",
    "centroid",
    "invariant",
    "highp",
    "mediump",
    "lowp",
];

fn parse_declaration(statement: &[Token]) -> Option<Declaration> {
    let mut rest = statement;

    // layout(...)
    if rest.first().and_then(Token::ident) == Some("layout") {
        let close = rest.iter().position(|token| token.is_punct(')'))?;
        rest = &rest[close + 1..];
    }
    while rest
        .first()
        .and_then(Token::ident)
        .is_some_and(|ident| IGNORED_QUALIFIERS.contains(&ident))
    {
        rest = &rest[1..];
    }

    let qualifier = match rest.first().and_then(Token::ident)? {
        "in" => StorageQualifier::In,
        "out" => StorageQualifier::Out,
        "uniform" => StorageQualifier::Uniform,
        _ => return None,
    };
    let ty = rest.get(1).and_then(Token::ident)?;
    let name = rest.get(2).and_then(Token::ident)?;
    Some(Declaration {
        qualifier,
        ty: ty.to_string(),
        name: name.to_string(),
    })
}

pub fn check(source: &str) -> Result<Unit, Diagnostic> {
    let (version, tokens) = tokenize(source)?;
    let eof = {
        let lines = source.lines().count().max(1) as u32;
        Position {
            line: lines,
            column: source.lines().last().map_or(1, |line| line.len() as u32 + 1),
        }
    };
    check_delimiters(&tokens, eof)?;

    let mut unit = Unit {
        version,
        ..Default::default()
    };

    for token in tokens.iter() {
        if let Some(ident) = token.ident() {
            *unit.identifier_counts.entry(ident.to_string()).or_default() += 1;
        }
    }

    // NOTE: walk top level statements. a statement ends either with `;` at depth 0 or when a
    // function body closes.
    let mut depth = 0_usize;
    let mut statement_start = 0_usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Punct('{') => {
                if depth == 0 {
                    let head = &tokens[statement_start..i];
                    let is_main = head.len() >= 4
                        && head[0].ident() == Some("void")
                        && head[1].ident() == Some("main")
                        && head[2].is_punct('(');
                    unit.has_main |= is_main;
                }
                depth += 1;
            }
            TokenKind::Punct('}') => {
                depth -= 1;
                if depth == 0 {
                    statement_start = i + 1;
                }
            }
            TokenKind::Punct(';') if depth == 0 => {
                let statement = &tokens[statement_start..i];
                if statement.is_empty() {
                    statement_start = i + 1;
                    continue;
                }
                if let Some(decl) = parse_declaration(statement) {
                    if unit.declarations.iter().any(|prev| prev.name == decl.name) {
                        return Err(Diagnostic {
                            position: statement[0].position,
                            message: format!("`{}' redeclared", decl.name),
                        });
                    }
                    unit.declarations.push(decl);
                } else if statement.len() == 1 {
                    return Err(Diagnostic {
                        position: token.position,
                        message: format!(
                            "syntax error, unexpected ';' after {}",
                            statement[0].describe()
                        ),
                    });
                }
                statement_start = i + 1;
            }
            _ => {}
        }
    }

    if let Some(dangling) = tokens.get(statement_start) {
        return Err(Diagnostic {
            position: eof,
            message: format!(
                "syntax error, unexpected end of file after {}",
                dangling.describe()
            ),
        });
    }

    Ok(unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERT: &str = "#version 330 core\n\
        layout (location = 0) in vec3 aPos;\n\
        out vec3 vertexColor;\n\
        uniform vec4 unused;\n\
        void main()\n\
        {\n\
            gl_Position = vec4(aPos, 1.0);\n\
            vertexColor = vec3(0.5, 0.0, 0.0);\n\
        }\n";

    #[test]
    fn extracts_interface() {
        let unit = check(VERT).unwrap();
        assert_eq!(unit.version, 330);
        assert!(unit.has_main);

        let ins: Vec<_> = unit.iter_declarations(StorageQualifier::In).collect();
        assert_eq!(ins.len(), 1);
        assert_eq!(ins[0].ty, "vec3");
        assert_eq!(ins[0].name, "aPos");

        let outs: Vec<_> = unit.iter_declarations(StorageQualifier::Out).collect();
        assert_eq!(outs[0].name, "vertexColor");

        assert!(unit.is_referenced("aPos"));
        assert!(!unit.is_referenced("unused"));
    }

    #[test]
    fn missing_version() {
        let err = check("void main() {}\n").unwrap_err();
        assert_eq!(err.position, Position { line: 1, column: 1 });
        assert!(err.message.contains("#version"));
    }

    #[test]
    fn unsupported_version() {
        let err = check("#version 331 core\nvoid main() {}\n").unwrap_err();
        assert!(err.to_string().starts_with("0:1(10): error: GLSL 3.31"));
    }

    #[test]
    fn missing_semicolon_before_closing_brace() {
        let src = "#version 330 core\nvoid main()\n{\n    gl_Position = vec4(0.0)\n}\n";
        let err = check(src).unwrap_err();
        assert_eq!(err.position, Position { line: 5, column: 1 });
        assert!(err.message.starts_with("syntax error, unexpected '}'"));
    }

    #[test]
    fn unbalanced_parens() {
        let src = "#version 330 core\nvoid main()\n{\n    gl_Position = vec4(0.0;\n}\n";
        assert!(check(src).is_err());
    }

    #[test]
    fn unclosed_block() {
        let src = "#version 330 core\nvoid main()\n{\n";
        let err = check(src).unwrap_err();
        assert!(err.message.contains("end of file"));
    }

    #[test]
    fn comments_and_trailing_nul() {
        let src = "#version 330 core\n// a comment\n/* block\n comment */\nvoid main() { }\0";
        assert!(check(src).unwrap().has_main);
    }

    #[test]
    fn invalid_character() {
        let src = "#version 330 core\nvoid main() { float a = $; }\n";
        let err = check(src).unwrap_err();
        assert_eq!(err.position, Position { line: 2, column: 25 });
    }
}
