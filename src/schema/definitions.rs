//! RFC 4512 schema descriptions
//!
//! Parses and renders the textual `( oid NAME ... )` descriptions used to
//! register attribute types and object classes and to publish the schema
//! through the subschema subentry.

use std::fmt;

use crate::error::SchemaError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Dollar,
    Quoted(String),
    Word(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, SchemaError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '$' => {
                chars.next();
                tokens.push(Token::Dollar);
            }
            '\'' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => s.push(c),
                        None => {
                            return Err(SchemaError::InvalidDefinition(format!(
                                "unterminated quoted string in '{}'",
                                input
                            )))
                        }
                    }
                }
                tokens.push(Token::Quoted(s));
            }
            _ => {
                let mut s = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ' ' || c == '\t' || c == '(' || c == ')' || c == '$' {
                        break;
                    }
                    s.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(s));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self, SchemaError> {
        Ok(Parser {
            tokens: tokenize(input)?,
            pos: 0,
        })
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn expect_lparen(&mut self) -> Result<(), SchemaError> {
        match self.next() {
            Some(Token::LParen) => Ok(()),
            t => Err(SchemaError::InvalidDefinition(format!(
                "expected '(', found {:?}",
                t
            ))),
        }
    }

    fn word(&mut self) -> Result<String, SchemaError> {
        match self.next() {
            Some(Token::Word(w)) => Ok(w),
            t => Err(SchemaError::InvalidDefinition(format!(
                "expected word, found {:?}",
                t
            ))),
        }
    }

    fn quoted(&mut self) -> Result<String, SchemaError> {
        match self.next() {
            Some(Token::Quoted(s)) => Ok(s),
            t => Err(SchemaError::InvalidDefinition(format!(
                "expected quoted string, found {:?}",
                t
            ))),
        }
    }

    // NAME 'single' or NAME ( 'one' 'two' )
    fn names(&mut self) -> Result<Vec<String>, SchemaError> {
        match self.next() {
            Some(Token::Quoted(s)) => Ok(vec![s]),
            Some(Token::LParen) => {
                let mut names = Vec::new();
                loop {
                    match self.next() {
                        Some(Token::Quoted(s)) => names.push(s),
                        Some(Token::RParen) => break,
                        t => {
                            return Err(SchemaError::InvalidDefinition(format!(
                                "unexpected token in NAME list: {:?}",
                                t
                            )))
                        }
                    }
                }
                Ok(names)
            }
            t => Err(SchemaError::InvalidDefinition(format!(
                "expected NAME value, found {:?}",
                t
            ))),
        }
    }

    // word or ( word $ word $ ... )
    fn oid_list(&mut self) -> Result<Vec<String>, SchemaError> {
        match self.next() {
            Some(Token::Word(w)) => Ok(vec![w]),
            Some(Token::LParen) => {
                let mut oids = Vec::new();
                loop {
                    match self.next() {
                        Some(Token::Word(w)) => oids.push(w),
                        Some(Token::Dollar) => {}
                        Some(Token::RParen) => break,
                        t => {
                            return Err(SchemaError::InvalidDefinition(format!(
                                "unexpected token in oid list: {:?}",
                                t
                            )))
                        }
                    }
                }
                Ok(oids)
            }
            t => Err(SchemaError::InvalidDefinition(format!(
                "expected oid list, found {:?}",
                t
            ))),
        }
    }
}

fn quote_list(f: &mut fmt::Formatter<'_>, keyword: &str, items: &[String]) -> fmt::Result {
    match items {
        [] => Ok(()),
        [single] => write!(f, "{} '{}' ", keyword, single),
        items => {
            write!(f, "{} ( ", keyword)?;
            for item in items {
                write!(f, "'{}' ", item)?;
            }
            write!(f, ") ")
        }
    }
}

fn oid_list_out(f: &mut fmt::Formatter<'_>, keyword: &str, items: &[String]) -> fmt::Result {
    match items {
        [] => Ok(()),
        [single] => write!(f, "{} {} ", keyword, single),
        items => {
            write!(f, "{} ( {} ) ", keyword, items.join(" $ "))
        }
    }
}

/// Parsed AttributeTypeDescription (RFC 4512 section 4.1.2).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeTypeDescription {
    pub oid: String,
    pub names: Vec<String>,
    pub desc: Option<String>,
    pub obsolete: bool,
    pub sup: Option<String>,
    pub equality: Option<String>,
    pub ordering: Option<String>,
    pub substr: Option<String>,
    /// Numeric syntax OID; any `{len}` bound is dropped on parse.
    pub syntax: Option<String>,
    pub single_value: bool,
    pub collective: bool,
    pub no_user_modification: bool,
    pub usage: Option<String>,
}

impl AttributeTypeDescription {
    pub fn parse(input: &str) -> Result<Self, SchemaError> {
        let mut p = Parser::new(input)?;
        p.expect_lparen()?;
        let mut desc = AttributeTypeDescription {
            oid: p.word()?,
            ..Default::default()
        };
        loop {
            match p.next() {
                Some(Token::RParen) => break,
                Some(Token::Word(kw)) => match kw.to_ascii_uppercase().as_str() {
                    "NAME" => desc.names = p.names()?,
                    "DESC" => desc.desc = Some(p.quoted()?),
                    "OBSOLETE" => desc.obsolete = true,
                    "SUP" => desc.sup = Some(p.word()?),
                    "EQUALITY" => desc.equality = Some(p.word()?),
                    "ORDERING" => desc.ordering = Some(p.word()?),
                    "SUBSTR" => desc.substr = Some(p.word()?),
                    "SYNTAX" => {
                        let w = p.word()?;
                        let oid = w.split('{').next().unwrap_or(&w).to_string();
                        desc.syntax = Some(oid);
                    }
                    "SINGLE-VALUE" => desc.single_value = true,
                    "COLLECTIVE" => desc.collective = true,
                    "NO-USER-MODIFICATION" => desc.no_user_modification = true,
                    "USAGE" => desc.usage = Some(p.word()?),
                    other => {
                        return Err(SchemaError::InvalidDefinition(format!(
                            "unknown keyword '{}' in '{}'",
                            other, input
                        )))
                    }
                },
                t => {
                    return Err(SchemaError::InvalidDefinition(format!(
                        "unexpected token {:?} in '{}'",
                        t, input
                    )))
                }
            }
        }
        if p.peek().is_some() {
            return Err(SchemaError::InvalidDefinition(format!(
                "trailing tokens in '{}'",
                input
            )));
        }
        Ok(desc)
    }
}

impl fmt::Display for AttributeTypeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {} ", self.oid)?;
        quote_list(f, "NAME", &self.names)?;
        if let Some(desc) = &self.desc {
            write!(f, "DESC '{}' ", desc)?;
        }
        if self.obsolete {
            write!(f, "OBSOLETE ")?;
        }
        if let Some(sup) = &self.sup {
            write!(f, "SUP {} ", sup)?;
        }
        if let Some(equality) = &self.equality {
            write!(f, "EQUALITY {} ", equality)?;
        }
        if let Some(ordering) = &self.ordering {
            write!(f, "ORDERING {} ", ordering)?;
        }
        if let Some(substr) = &self.substr {
            write!(f, "SUBSTR {} ", substr)?;
        }
        if let Some(syntax) = &self.syntax {
            write!(f, "SYNTAX {} ", syntax)?;
        }
        if self.single_value {
            write!(f, "SINGLE-VALUE ")?;
        }
        if self.collective {
            write!(f, "COLLECTIVE ")?;
        }
        if self.no_user_modification {
            write!(f, "NO-USER-MODIFICATION ")?;
        }
        if let Some(usage) = &self.usage {
            write!(f, "USAGE {} ", usage)?;
        }
        write!(f, ")")
    }
}

/// Structural kind of an object class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClassKind {
    Abstract,
    Structural,
    Auxiliary,
}

impl Default for ObjectClassKind {
    fn default() -> Self {
        ObjectClassKind::Structural
    }
}

/// Parsed ObjectClassDescription (RFC 4512 section 4.1.1).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectClassDescription {
    pub oid: String,
    pub names: Vec<String>,
    pub desc: Option<String>,
    pub obsolete: bool,
    pub sup: Vec<String>,
    pub kind: ObjectClassKind,
    pub must: Vec<String>,
    pub may: Vec<String>,
}

impl ObjectClassDescription {
    pub fn parse(input: &str) -> Result<Self, SchemaError> {
        let mut p = Parser::new(input)?;
        p.expect_lparen()?;
        let mut desc = ObjectClassDescription {
            oid: p.word()?,
            ..Default::default()
        };
        loop {
            match p.next() {
                Some(Token::RParen) => break,
                Some(Token::Word(kw)) => match kw.to_ascii_uppercase().as_str() {
                    "NAME" => desc.names = p.names()?,
                    "DESC" => desc.desc = Some(p.quoted()?),
                    "OBSOLETE" => desc.obsolete = true,
                    "SUP" => desc.sup = p.oid_list()?,
                    "ABSTRACT" => desc.kind = ObjectClassKind::Abstract,
                    "STRUCTURAL" => desc.kind = ObjectClassKind::Structural,
                    "AUXILIARY" => desc.kind = ObjectClassKind::Auxiliary,
                    "MUST" => desc.must = p.oid_list()?,
                    "MAY" => desc.may = p.oid_list()?,
                    other => {
                        return Err(SchemaError::InvalidDefinition(format!(
                            "unknown keyword '{}' in '{}'",
                            other, input
                        )))
                    }
                },
                t => {
                    return Err(SchemaError::InvalidDefinition(format!(
                        "unexpected token {:?} in '{}'",
                        t, input
                    )))
                }
            }
        }
        if p.peek().is_some() {
            return Err(SchemaError::InvalidDefinition(format!(
                "trailing tokens in '{}'",
                input
            )));
        }
        Ok(desc)
    }
}

impl fmt::Display for ObjectClassDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {} ", self.oid)?;
        quote_list(f, "NAME", &self.names)?;
        if let Some(desc) = &self.desc {
            write!(f, "DESC '{}' ", desc)?;
        }
        if self.obsolete {
            write!(f, "OBSOLETE ")?;
        }
        oid_list_out(f, "SUP", &self.sup)?;
        match self.kind {
            ObjectClassKind::Abstract => write!(f, "ABSTRACT ")?,
            ObjectClassKind::Structural => write!(f, "STRUCTURAL ")?,
            ObjectClassKind::Auxiliary => write!(f, "AUXILIARY ")?,
        }
        oid_list_out(f, "MUST", &self.must)?;
        oid_list_out(f, "MAY", &self.may)?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attribute_type() {
        let def = AttributeTypeDescription::parse(
            "( 2.5.4.41 NAME 'name' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15{32768} )",
        )
        .unwrap();
        assert_eq!(def.oid, "2.5.4.41");
        assert_eq!(def.names, vec!["name"]);
        assert_eq!(def.equality.as_deref(), Some("caseIgnoreMatch"));
        assert_eq!(def.substr.as_deref(), Some("caseIgnoreSubstringsMatch"));
        assert_eq!(def.syntax.as_deref(), Some("1.3.6.1.4.1.1466.115.121.1.15"));
        assert!(!def.single_value);
    }

    #[test]
    fn test_parse_attribute_type_multiple_names() {
        let def = AttributeTypeDescription::parse("( 2.5.4.3 NAME ( 'cn' 'commonName' ) SUP name )")
            .unwrap();
        assert_eq!(def.names, vec!["cn", "commonName"]);
        assert_eq!(def.sup.as_deref(), Some("name"));
        assert_eq!(
            def.to_string(),
            "( 2.5.4.3 NAME ( 'cn' 'commonName' ) SUP name )"
        );
    }

    #[test]
    fn test_render_operational_attribute_type() {
        let text = "( 2.5.21.6 NAME 'objectClasses' EQUALITY objectIdentifierFirstComponentMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.37 USAGE directoryOperation )";
        let def = AttributeTypeDescription::parse(text).unwrap();
        assert_eq!(def.to_string(), text);
    }

    #[test]
    fn test_parse_object_class() {
        let def = ObjectClassDescription::parse("( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )")
            .unwrap();
        assert_eq!(def.oid, "2.5.6.0");
        assert_eq!(def.kind, ObjectClassKind::Abstract);
        assert_eq!(def.must, vec!["objectClass"]);
        assert_eq!(
            def.to_string(),
            "( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )"
        );
    }

    #[test]
    fn test_parse_object_class_lists() {
        let text = "( 2.5.6.2 NAME 'country' SUP top STRUCTURAL MUST c MAY ( searchGuide $ description ) )";
        let def = ObjectClassDescription::parse(text).unwrap();
        assert_eq!(def.sup, vec!["top"]);
        assert_eq!(def.must, vec!["c"]);
        assert_eq!(def.may, vec!["searchGuide", "description"]);
        assert_eq!(def.to_string(), text);
    }

    #[test]
    fn test_invalid_definitions() {
        assert!(AttributeTypeDescription::parse("2.5.4.3 NAME 'cn'").is_err());
        assert!(AttributeTypeDescription::parse("( 2.5.4.3 BOGUS )").is_err());
        assert!(ObjectClassDescription::parse("( 2.5.6.0 NAME 'top' ").is_err());
    }
}
