//! Definition for types used in LDAP filters

use crate::ldap::LdapString;
use asn1_rs::ToStatic;
use std::borrow::Cow;

/// A search filter, the recursive CHOICE from RFC4511 section 4.5.1.7.
///
/// Evaluation against directory entries lives in [`crate::entries`]; this
/// module only models the wire shape.
#[derive(Clone, Debug, Eq, PartialEq, ToStatic)]
pub enum Filter<'a> {
    And(Vec<Filter<'a>>),
    Or(Vec<Filter<'a>>),
    Not(Box<Filter<'a>>),
    EqualityMatch(AttributeValueAssertion<'a>),
    Substrings(SubstringFilter<'a>),
    GreaterOrEqual(AttributeValueAssertion<'a>),
    LessOrEqual(AttributeValueAssertion<'a>),
    Present(LdapString<'a>),
    ApproxMatch(AttributeValueAssertion<'a>),
    ExtensibleMatch(MatchingRuleAssertion<'a>),
}

#[derive(Clone, Debug, Eq, PartialEq, ToStatic)]
pub struct PartialAttribute<'a> {
    pub attr_type: LdapString<'a>,
    pub attr_vals: Vec<AttributeValue<'a>>,
}

#[derive(Clone, Debug, Eq, PartialEq, ToStatic)]
pub struct Attribute<'a> {
    pub attr_type: LdapString<'a>,
    pub attr_vals: Vec<AttributeValue<'a>>,
}

#[derive(Clone, Debug, Eq, PartialEq, ToStatic)]
pub struct AttributeValueAssertion<'a> {
    pub attribute_desc: LdapString<'a>,
    pub assertion_value: Cow<'a, [u8]>,
}

#[derive(Clone, Debug, Eq, PartialEq, ToStatic)]
pub struct AttributeDescription<'a>(pub Cow<'a, str>);

#[derive(Clone, Debug, Eq, PartialEq, ToStatic)]
pub struct MatchingRuleAssertion<'a> {
    pub matching_rule: Option<LdapString<'a>>,
    pub rule_type: Option<AttributeDescription<'a>>,
    pub assertion_value: AssertionValue<'a>,
    pub dn_attributes: Option<bool>,
}

#[derive(Clone, Debug, Eq, PartialEq, ToStatic)]
pub struct MatchingRuleId<'a>(pub Cow<'a, str>);

#[derive(Clone, Debug, Eq, PartialEq, ToStatic)]
pub struct SubstringFilter<'a> {
    pub filter_type: LdapString<'a>,
    pub substrings: Vec<Substring<'a>>,
}

impl<'a> SubstringFilter<'a> {
    /// The `initial` piece, if present (it can occur at most once, anchored to
    /// the start of the value).
    pub fn initial(&self) -> Option<&[u8]> {
        self.substrings.iter().find_map(|s| match s {
            Substring::Initial(v) => Some(v.0.as_ref()),
            _ => None,
        })
    }

    /// All `any` pieces, in order.
    pub fn any(&self) -> Vec<&[u8]> {
        self.substrings
            .iter()
            .filter_map(|s| match s {
                Substring::Any(v) => Some(v.0.as_ref()),
                _ => None,
            })
            .collect()
    }

    /// The `final` piece, if present (anchored to the end of the value).
    pub fn final_part(&self) -> Option<&[u8]> {
        self.substrings.iter().find_map(|s| match s {
            Substring::Final(v) => Some(v.0.as_ref()),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq, ToStatic)]
pub enum Substring<'a> {
    Initial(AssertionValue<'a>),
    Any(AssertionValue<'a>),
    Final(AssertionValue<'a>),
}

#[derive(Clone, Debug, Eq, PartialEq, ToStatic)]
pub struct AssertionValue<'a>(pub Cow<'a, [u8]>);

#[derive(Clone, Debug, Eq, PartialEq, ToStatic)]
pub struct AttributeValue<'a>(pub Cow<'a, [u8]>);
