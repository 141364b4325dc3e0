//! Matching rules (RFC 4517)
//!
//! Rules compare already-decoded stored values against a decoded assertion
//! value. String families prepare both sides through RFC 4518 first and then
//! compare the prepared forms. A stored value that fails preparation is
//! unmatchable but never aborts matching over the other values; a failing
//! *assertion* raises `invalidAttributeSyntax`.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use crate::error::OperationError;
use crate::schema::syntax::{SubstringPattern, Value};
use crate::schema::Schema;
use crate::stringprep::{prepare, MatchingType, ProhibitedCharacter, SubstringType};

/// The comparison behaviour of a matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingRuleKind {
    /// String equality on RFC 4518 prepared forms.
    StringEquality(MatchingType),
    /// String ordering on prepared forms.
    StringOrdering(MatchingType),
    /// Substring matching on prepared forms.
    StringSubstrings(MatchingType),
    /// Equality over lists of strings (postal addresses).
    ListEquality(MatchingType),
    /// Substring matching over lists of strings.
    ListSubstrings(MatchingType),
    /// Equality on decoded values (integer, boolean, time, octets, DN).
    ValueEquality,
    /// Ordering on decoded values.
    ValueOrdering,
    /// OID equality, resolving descriptor names through the schema.
    OidEquality,
    /// Equality on the first (integer) component of a compound value.
    FirstComponentInteger,
    /// Equality on the first (OID) component of a compound value.
    FirstComponentOid,
}

/// A matching rule: OID, names, published syntax and comparison behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingRule {
    pub oid: Cow<'static, str>,
    pub names: &'static [&'static str],
    /// The assertion syntax published in the rule definition.
    pub syntax: Cow<'static, str>,
    /// Syntaxes this rule can be applied to (extensible matching).
    pub compatible_syntaxes: &'static [&'static str],
    pub kind: MatchingRuleKind,
}

impl MatchingRule {
    pub fn name(&self) -> &str {
        match self.names.first() {
            Some(name) => name,
            None => self.oid.as_ref(),
        }
    }

    pub fn supports_equality(&self) -> bool {
        !matches!(
            self.kind,
            MatchingRuleKind::StringOrdering(_)
                | MatchingRuleKind::ValueOrdering
                | MatchingRuleKind::StringSubstrings(_)
                | MatchingRuleKind::ListSubstrings(_)
        )
    }

    pub fn supports_ordering(&self) -> bool {
        matches!(
            self.kind,
            MatchingRuleKind::StringOrdering(_) | MatchingRuleKind::ValueOrdering
        )
    }

    pub fn supports_substrings(&self) -> bool {
        matches!(
            self.kind,
            MatchingRuleKind::StringSubstrings(_) | MatchingRuleKind::ListSubstrings(_)
        )
    }

    pub fn compatible_with_syntax(&self, syntax_oid: &str) -> bool {
        self.compatible_syntaxes.iter().any(|&s| s == syntax_oid)
    }

    /// Normalize a string through this rule's preparation, for RDN values.
    pub(crate) fn normalize_text(&self, value: &str) -> Result<String, ProhibitedCharacter> {
        match self.kind {
            MatchingRuleKind::StringEquality(t)
            | MatchingRuleKind::StringOrdering(t)
            | MatchingRuleKind::StringSubstrings(t) => prepare(value, t, SubstringType::None),
            _ => Ok(value.to_string()),
        }
    }

    /// `equal(stored[], assertion)`; false for an empty stored list.
    pub fn match_equal(
        &self,
        schema: &Schema,
        stored: &[Value],
        assertion: &Value,
    ) -> Result<bool, OperationError> {
        match self.kind {
            MatchingRuleKind::StringEquality(t) => {
                let needle = prepare_assertion_text(assertion, t)?;
                for value in stored {
                    if let Some(text) = value.as_text() {
                        if let Ok(prepared) = prepare(text, t, SubstringType::None) {
                            if prepared == needle {
                                return Ok(true);
                            }
                        }
                    }
                }
                Ok(false)
            }
            MatchingRuleKind::ListEquality(t) => {
                let needle = match assertion {
                    Value::Lines(lines) => prepare_lines(lines, t)?,
                    _ => return Err(OperationError::InvalidAttributeSyntax),
                };
                for value in stored {
                    if let Value::Lines(lines) = value {
                        if let Ok(prepared) = prepare_lines_lenient(lines, t) {
                            if prepared == needle {
                                return Ok(true);
                            }
                        }
                    }
                }
                Ok(false)
            }
            MatchingRuleKind::ValueEquality => {
                Ok(stored.iter().any(|v| v.eq_value(assertion) == Some(true)))
            }
            MatchingRuleKind::OidEquality => {
                let needle = resolve_oid(schema, assertion)?;
                for value in stored {
                    // unresolvable stored descriptors are unmatchable
                    if let Ok(oid) = resolve_oid(schema, value) {
                        if oid == needle {
                            return Ok(true);
                        }
                    }
                }
                Ok(false)
            }
            MatchingRuleKind::FirstComponentInteger => {
                let needle = match assertion {
                    Value::Int(v) => *v,
                    _ => return Err(OperationError::InvalidAttributeSyntax),
                };
                for value in stored {
                    match first_component_integer(value) {
                        Some(v) if v == needle => return Ok(true),
                        _ => {}
                    }
                }
                Ok(false)
            }
            MatchingRuleKind::FirstComponentOid => {
                let needle = resolve_oid(schema, assertion)?;
                for value in stored {
                    if let Some(first) = first_component_text(value) {
                        if let Ok(oid) = resolve_oid(schema, &Value::Oid(first)) {
                            if oid == needle {
                                return Ok(true);
                            }
                        }
                    }
                }
                Ok(false)
            }
            _ => Err(OperationError::InappropriateMatching),
        }
    }

    /// `less(stored[], assertion)`: true if any stored value orders below the
    /// assertion.
    pub fn match_less(
        &self,
        _schema: &Schema,
        stored: &[Value],
        assertion: &Value,
    ) -> Result<bool, OperationError> {
        self.ordering(stored, assertion, |o| o == Ordering::Less)
    }

    /// `greater_or_equal(stored[], assertion)`.
    pub fn match_greater_or_equal(
        &self,
        _schema: &Schema,
        stored: &[Value],
        assertion: &Value,
    ) -> Result<bool, OperationError> {
        self.ordering(stored, assertion, |o| o != Ordering::Less)
    }

    fn ordering(
        &self,
        stored: &[Value],
        assertion: &Value,
        accept: impl Fn(Ordering) -> bool,
    ) -> Result<bool, OperationError> {
        match self.kind {
            MatchingRuleKind::StringOrdering(t) => {
                let needle = prepare_assertion_text(assertion, t)?;
                for value in stored {
                    if let Some(text) = value.as_text() {
                        if let Ok(prepared) = prepare(text, t, SubstringType::None) {
                            if accept(prepared.cmp(&needle)) {
                                return Ok(true);
                            }
                        }
                    }
                }
                Ok(false)
            }
            MatchingRuleKind::ValueOrdering => {
                for value in stored {
                    if let Some(ordering) = value.cmp_value(assertion) {
                        if accept(ordering) {
                            return Ok(true);
                        }
                    }
                }
                Ok(false)
            }
            _ => Err(OperationError::InappropriateMatching),
        }
    }

    /// Substring matching: the pattern pieces must appear in order, without
    /// overlap, with initial anchored to the start and final to the end.
    pub fn match_substrings(
        &self,
        _schema: &Schema,
        stored: &[Value],
        pattern: &SubstringPattern,
    ) -> Result<bool, OperationError> {
        let t = match self.kind {
            MatchingRuleKind::StringSubstrings(t) => t,
            MatchingRuleKind::ListSubstrings(t) => t,
            _ => return Err(OperationError::InappropriateMatching),
        };
        let prepared_pattern = PreparedPattern::new(pattern, t)?;
        for value in stored {
            let haystack = match self.kind {
                MatchingRuleKind::ListSubstrings(_) => match value {
                    Value::Lines(lines) => match prepare_lines_lenient(lines, t) {
                        Ok(joined) => joined,
                        Err(_) => continue,
                    },
                    _ => continue,
                },
                _ => match value.as_text() {
                    Some(text) => match prepare(text, t, SubstringType::None) {
                        Ok(prepared) => prepared,
                        Err(_) => continue,
                    },
                    None => continue,
                },
            };
            if prepared_pattern.matches(&haystack) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl fmt::Display for MatchingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {} ", self.oid)?;
        match self.names {
            [] => {}
            [single] => write!(f, "NAME '{}' ", single)?,
            names => {
                write!(f, "NAME ( ")?;
                for n in names {
                    write!(f, "'{}' ", n)?;
                }
                write!(f, ") ")?;
            }
        }
        write!(f, "SYNTAX {} )", self.syntax)
    }
}

struct PreparedPattern {
    initial: Option<String>,
    any: Vec<String>,
    final_part: Option<String>,
}

impl PreparedPattern {
    fn new(pattern: &SubstringPattern, t: MatchingType) -> Result<Self, OperationError> {
        let prep = |s: &str, pos: SubstringType| {
            prepare(s, t, pos).map_err(|_| OperationError::InvalidAttributeSyntax)
        };
        Ok(PreparedPattern {
            initial: pattern
                .initial
                .as_deref()
                .map(|s| prep(s, SubstringType::Initial))
                .transpose()?,
            any: pattern
                .any
                .iter()
                .map(|s| prep(s, SubstringType::Any))
                .collect::<Result<_, _>>()?,
            final_part: pattern
                .final_part
                .as_deref()
                .map(|s| prep(s, SubstringType::Final))
                .transpose()?,
        })
    }

    fn matches(&self, haystack: &str) -> bool {
        let mut pos = 0;
        if let Some(initial) = &self.initial {
            if !haystack.starts_with(initial.as_str()) {
                return false;
            }
            pos = initial.len();
        }
        for piece in &self.any {
            match haystack[pos..].find(piece.as_str()) {
                Some(idx) => pos = pos + idx + piece.len(),
                None => return false,
            }
        }
        if let Some(final_part) = &self.final_part {
            let rest = &haystack[pos..];
            if rest.len() < final_part.len() || !rest.ends_with(final_part.as_str()) {
                return false;
            }
        }
        true
    }
}

fn prepare_assertion_text(assertion: &Value, t: MatchingType) -> Result<String, OperationError> {
    let text = assertion
        .as_text()
        .ok_or(OperationError::InvalidAttributeSyntax)?;
    prepare(text, t, SubstringType::None).map_err(|_| OperationError::InvalidAttributeSyntax)
}

// Lists are compared line-wise; LF is the internal separator so an assertion
// containing a literal LF (mapped to SPACE during preparation) can never
// match across lines.
fn prepare_lines(lines: &[String], t: MatchingType) -> Result<String, OperationError> {
    let prepared: Result<Vec<String>, _> = lines
        .iter()
        .map(|l| prepare(l, t, SubstringType::None))
        .collect();
    prepared
        .map(|l| l.join("\n"))
        .map_err(|_| OperationError::InvalidAttributeSyntax)
}

fn prepare_lines_lenient(lines: &[String], t: MatchingType) -> Result<String, ProhibitedCharacter> {
    let prepared: Result<Vec<String>, _> = lines
        .iter()
        .map(|l| prepare(l, t, SubstringType::None))
        .collect();
    prepared.map(|l| l.join("\n"))
}

/// Resolve an OID-syntax value to a numeric OID through the schema.
///
/// Numeric OIDs pass through; descriptor names must name a schema element.
fn resolve_oid(schema: &Schema, value: &Value) -> Result<String, OperationError> {
    let text = value
        .as_text()
        .ok_or(OperationError::InvalidAttributeSyntax)?;
    if text.chars().next().map_or(false, |c| c.is_ascii_digit()) {
        return Ok(text.to_string());
    }
    schema
        .numeric_oid(text)
        .map(str::to_string)
        .ok_or(OperationError::InvalidAttributeSyntax)
}

fn first_component_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Int(v) => Some(*v),
        _ => first_component_text(value)?.parse().ok(),
    }
}

fn first_component_text(value: &Value) -> Option<String> {
    let text = value.as_text()?;
    let inner = text.trim().strip_prefix('(')?;
    inner.split_whitespace().next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use std::sync::Arc;

    fn s() -> Arc<Schema> {
        schema::rfc4519()
    }

    fn rule(schema: &Schema, name: &str) -> MatchingRule {
        schema.matching_rule(name).unwrap().clone()
    }

    fn texts(values: &[&str]) -> Vec<Value> {
        values.iter().map(|&v| Value::from(v)).collect()
    }

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&v| Value::Int(v)).collect()
    }

    #[test]
    fn test_integer_match() {
        let schema = s();
        let rule = rule(&schema, "integerMatch");
        assert!(rule.match_equal(&schema, &ints(&[1234]), &Value::Int(1234)).unwrap());
        assert!(!rule.match_equal(&schema, &ints(&[4321]), &Value::Int(1234)).unwrap());
        assert!(rule.match_equal(&schema, &ints(&[0, 1]), &Value::Int(0)).unwrap());
        assert!(!rule.match_equal(&schema, &ints(&[0, 1]), &Value::Int(-1)).unwrap());
        assert!(!rule.match_equal(&schema, &[], &Value::Int(1)).unwrap());
    }

    #[test]
    fn test_integer_ordering_match() {
        let schema = s();
        let rule = rule(&schema, "integerOrderingMatch");
        assert!(!rule.match_less(&schema, &ints(&[1234]), &Value::Int(1234)).unwrap());
        assert!(rule.match_less(&schema, &ints(&[1234]), &Value::Int(4321)).unwrap());
        assert!(rule.match_less(&schema, &ints(&[0, 1]), &Value::Int(1)).unwrap());
        assert!(!rule.match_less(&schema, &ints(&[0, 1]), &Value::Int(-1)).unwrap());
        assert!(!rule.match_less(&schema, &[], &Value::Int(1)).unwrap());
        assert!(rule
            .match_greater_or_equal(&schema, &ints(&[1234]), &Value::Int(1234))
            .unwrap());
        assert!(rule
            .match_greater_or_equal(&schema, &ints(&[0, 1]), &Value::Int(-1))
            .unwrap());
        assert!(!rule
            .match_greater_or_equal(&schema, &ints(&[0, 1]), &Value::Int(2))
            .unwrap());
        assert!(!rule.match_greater_or_equal(&schema, &[], &Value::Int(1)).unwrap());
    }

    #[test]
    fn test_case_ignore_match() {
        let schema = s();
        let rule = rule(&schema, "caseIgnoreMatch");
        let stored = texts(&["foo", "Bar"]);
        assert!(rule.match_equal(&schema, &stored, &Value::from("foo")).unwrap());
        assert!(!rule.match_equal(&schema, &stored, &Value::from("foobar")).unwrap());
        assert!(!rule.match_equal(&schema, &[], &Value::from("foo")).unwrap());
        assert!(rule.match_equal(&schema, &stored, &Value::from("Foo")).unwrap());
        assert!(rule.match_equal(&schema, &stored, &Value::from("bar")).unwrap());
        assert!(rule
            .match_equal(&schema, &texts(&["fo  o ", " bar"]), &Value::from("   bar   "))
            .unwrap());
        assert!(!rule
            .match_equal(&schema, &texts(&["fo  o ", " b ar"]), &Value::from("   bar   "))
            .unwrap());
        assert!(rule
            .match_equal(&schema, &texts(&["fo\n\ro ", " bar"]), &Value::from(" fo o"))
            .unwrap());
    }

    #[test]
    fn test_case_exact_match() {
        let schema = s();
        let rule = rule(&schema, "caseExactMatch");
        let stored = texts(&["foo", "Bar"]);
        assert!(rule.match_equal(&schema, &stored, &Value::from("foo")).unwrap());
        assert!(rule.match_equal(&schema, &stored, &Value::from("Bar")).unwrap());
        assert!(!rule.match_equal(&schema, &stored, &Value::from("Foo")).unwrap());
        assert!(!rule.match_equal(&schema, &stored, &Value::from("bar")).unwrap());
        // prohibited characters make a stored value unmatchable without
        // aborting the match; a prohibited assertion raises
        let stored = texts(&["foobar\u{FFFD}", "test"]);
        assert_eq!(
            rule.match_equal(&schema, &stored, &Value::from("foobar\u{FFFD}")),
            Err(OperationError::InvalidAttributeSyntax)
        );
        assert!(rule.match_equal(&schema, &stored, &Value::from("test")).unwrap());
    }

    #[test]
    fn test_case_ordering_match() {
        let schema = s();
        let ignore = rule(&schema, "caseIgnoreOrderingMatch");
        assert!(!ignore.match_less(&schema, &texts(&["abc"]), &Value::from("abc")).unwrap());
        assert!(!ignore.match_less(&schema, &[], &Value::from("abc")).unwrap());
        assert!(ignore.match_less(&schema, &texts(&["abc"]), &Value::from("def")).unwrap());
        assert!(ignore
            .match_less(&schema, &texts(&["def", "abc"]), &Value::from("acd"))
            .unwrap());
        assert!(ignore.match_less(&schema, &texts(&["A"]), &Value::from("b")).unwrap());
        assert!(!ignore.match_less(&schema, &texts(&["C"]), &Value::from("a")).unwrap());
        let exact = rule(&schema, "caseExactOrderingMatch");
        assert!(exact.match_less(&schema, &texts(&["C"]), &Value::from("a")).unwrap());
        assert!(!exact.match_less(&schema, &texts(&["a"]), &Value::from("A")).unwrap());
        assert!(exact
            .match_greater_or_equal(&schema, &texts(&["a"]), &Value::from("A"))
            .unwrap());
        assert!(!exact
            .match_greater_or_equal(&schema, &texts(&["A"]), &Value::from("b"))
            .unwrap());
    }

    #[test]
    fn test_substrings_match() {
        let schema = s();
        let rule = rule(&schema, "caseExactSubstringsMatch");
        let stored = texts(&["abcdefghi"]);
        let pat = |i: Option<&str>, any: &[&str], f: Option<&str>| SubstringPattern {
            initial: i.map(str::to_string),
            any: any.iter().map(|s| s.to_string()).collect(),
            final_part: f.map(str::to_string),
        };
        let m = |p: &SubstringPattern| rule.match_substrings(&schema, &stored, p).unwrap();
        assert!(m(&pat(Some("abcdefghi"), &[], None)));
        assert!(m(&pat(None, &["abcdefghi"], None)));
        assert!(m(&pat(None, &[], Some("abcdefghi"))));
        assert!(m(&pat(Some("abc"), &["def"], Some("ghi"))));
        assert!(m(&pat(Some("abc"), &["d", "ef"], Some("ghi"))));
        assert!(!m(&pat(Some("abcd"), &["d", "ef"], Some("ghi"))));
        assert!(!m(&pat(Some("abc"), &["cd", "ef"], Some("ghi"))));
        assert!(!m(&pat(Some("abc"), &["de", "ef"], Some("ghi"))));
        assert!(!m(&pat(Some("abc"), &["d", "def"], Some("ghi"))));
        assert!(!m(&pat(Some("abc"), &["d", "efg"], Some("ghi"))));
        assert!(!m(&pat(Some("abc"), &["d", "ef"], Some("fghi"))));
        assert!(m(&pat(Some("ab"), &["def"], Some("ghi"))));
        assert!(m(&pat(Some("abc"), &["ef"], Some("ghi"))));
        assert!(m(&pat(Some("abc"), &["de"], Some("ghi"))));
        assert!(m(&pat(Some("abc"), &["def"], Some("hi"))));
        let multi = texts(&["foo", "abcdefghi", "bar"]);
        assert!(rule
            .match_substrings(&schema, &multi, &pat(Some("abcdefghi"), &[], None))
            .unwrap());
        // prohibited characters in stored values are skipped, not fatal
        let stored = texts(&["foobar\u{FFFD}", "test"]);
        assert!(!rule
            .match_substrings(&schema, &stored, &pat(Some("foobar"), &[], None))
            .unwrap());
        assert!(rule
            .match_substrings(&schema, &stored, &pat(Some("test"), &[], None))
            .unwrap());
    }

    #[test]
    fn test_list_match() {
        let schema = s();
        let rule = rule(&schema, "caseIgnoreListMatch");
        let lines = |v: &[&str]| Value::Lines(v.iter().map(|s| s.to_string()).collect());
        let assertion = lines(&["foo", "bar"]);
        assert!(!rule.match_equal(&schema, &[], &assertion).unwrap());
        assert!(rule
            .match_equal(&schema, &[lines(&["foo", "bar"])], &assertion)
            .unwrap());
        assert!(rule
            .match_equal(&schema, &[lines(&["Foo", "bar"])], &lines(&["foo", "BAR"]))
            .unwrap());
        assert!(!rule
            .match_equal(&schema, &[lines(&["bar", "foo"])], &assertion)
            .unwrap());
        assert!(!rule
            .match_equal(&schema, &[lines(&["foo", "bar"])], &lines(&["foo"]))
            .unwrap());
        assert!(rule
            .match_equal(
                &schema,
                &[lines(&["first"]), lines(&["foo", "bar"])],
                &assertion
            )
            .unwrap());
    }

    #[test]
    fn test_list_substrings_match() {
        let schema = s();
        let rule = rule(&schema, "caseIgnoreListSubstringsMatch");
        let lines = |v: &[&str]| Value::Lines(v.iter().map(|s| s.to_string()).collect());
        let pat = |i: Option<&str>, any: &[&str], f: Option<&str>| SubstringPattern {
            initial: i.map(str::to_string),
            any: any.iter().map(|s| s.to_string()).collect(),
            final_part: f.map(str::to_string),
        };
        let stored = [lines(&["foo", "bar", "baz"])];
        assert!(!rule
            .match_substrings(&schema, &[], &pat(None, &["foo"], None))
            .unwrap());
        assert!(rule
            .match_substrings(&schema, &stored, &pat(Some("foo"), &["bar"], Some("baz")))
            .unwrap());
        assert!(!rule
            .match_substrings(&schema, &stored, &pat(Some("bar"), &[], None))
            .unwrap());
        assert!(rule
            .match_substrings(&schema, &stored, &pat(Some("FOO"), &[], None))
            .unwrap());
        assert!(rule
            .match_substrings(&schema, &stored, &pat(None, &["bar"], Some("baz")))
            .unwrap());
        assert!(rule
            .match_substrings(&schema, &stored, &pat(None, &["foo", "bar", "baz"], None))
            .unwrap());
        assert!(rule
            .match_substrings(&schema, &stored, &pat(Some("f"), &["b", "r"], Some("z")))
            .unwrap());
        let two = [lines(&["foo", "bar"])];
        assert!(!rule
            .match_substrings(&schema, &two, &pat(None, &["foobar"], None))
            .unwrap());
        assert!(!rule
            .match_substrings(&schema, &two, &pat(None, &["foo bar"], None))
            .unwrap());
        // LF is internally used as a separator
        assert!(!rule
            .match_substrings(&schema, &two, &pat(None, &["foo\nbar"], None))
            .unwrap());
    }

    #[test]
    fn test_first_component_match() {
        let schema = s();
        let rule = rule(&schema, "integerFirstComponentMatch");
        let stored = vec![
            Value::SchemaElement("( 0 NAME 'zero' )".to_string()),
            Value::SchemaElement("( 1 NAME 'one' )".to_string()),
        ];
        assert!(rule.match_equal(&schema, &stored, &Value::Int(0)).unwrap());
        assert!(rule.match_equal(&schema, &stored, &Value::Int(1)).unwrap());
        assert!(!rule.match_equal(&schema, &stored, &Value::Int(3)).unwrap());
        assert!(!rule.match_equal(&schema, &[], &Value::Int(1)).unwrap());
    }

    #[test]
    fn test_oid_match() {
        let schema = s();
        let rule = rule(&schema, "objectIdentifierMatch");
        let stored = vec![Value::Oid("person".to_string()), Value::Oid("2.5.6.2".to_string())];
        assert!(rule.match_equal(&schema, &stored, &Value::Oid("2.5.6.6".to_string())).unwrap());
        assert!(rule.match_equal(&schema, &stored, &Value::Oid("Country".to_string())).unwrap());
        assert!(!rule.match_equal(&schema, &[], &Value::Oid("2.5.6.6".to_string())).unwrap());
        assert!(!rule.match_equal(&schema, &[], &Value::Oid("Country".to_string())).unwrap());
        let with_unknown = vec![
            Value::Oid("person".to_string()),
            Value::Oid("foobar".to_string()),
        ];
        assert!(rule
            .match_equal(&schema, &with_unknown, &Value::Oid("person".to_string()))
            .unwrap());
        assert_eq!(
            rule.match_equal(&schema, &stored[..1].to_vec(), &Value::Oid("foobar".to_string())),
            Err(OperationError::InvalidAttributeSyntax)
        );
        assert!(rule
            .match_equal(
                &schema,
                &[Value::Oid("person".to_string()), Value::Oid("0.1.2.3.4".to_string())],
                &Value::Oid("0.1.2.3.4".to_string())
            )
            .unwrap());
    }
}
