//! Directory entries and filter evaluation
//!
//! The entry family shares a DN and an [`AttributeDict`]: concrete
//! [`ObjectEntry`]s, the [`RootDse`] at the empty DN, the
//! [`SubschemaSubentry`] publishing the schema, and [`EntryTemplate`]
//! patterns that stand for whole families of generated entries.
//!
//! Filter evaluation is three-valued (True/False/Undefined) per RFC 4511;
//! templates add a fourth value Maybe ("would match if realized"). Undefined
//! behaves like False and Maybe like True once a boolean answer is needed,
//! but both compose through And/Or/Not with their own rules. Evaluation never
//! fails: schema and data problems resolve to Undefined.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::dn::{Dn, Rdn};
use crate::error::{DnError, OperationError};
use crate::filter::Filter;
use crate::ldap::{LdapDN, LdapString, SearchScope, SearchResultEntry};
use crate::filter::{AttributeValue, PartialAttribute};
use crate::schema::{oids, AttributeType, MatchingRule, Schema, Value};

/// Result of evaluating a filter against an entry or template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    True,
    False,
    Undefined,
    Maybe,
}

impl MatchResult {
    /// The boolean answer a client observes: Maybe behaves like True,
    /// Undefined like False.
    pub fn as_bool(self) -> bool {
        matches!(self, MatchResult::True | MatchResult::Maybe)
    }

    fn not(self) -> MatchResult {
        match self {
            MatchResult::True => MatchResult::False,
            MatchResult::False => MatchResult::True,
            other => other,
        }
    }

    // severity for AND: False > Undefined > Maybe > True
    fn and_all(results: impl IntoIterator<Item = MatchResult>) -> MatchResult {
        let mut out = MatchResult::True;
        for r in results {
            match r {
                MatchResult::False => return MatchResult::False,
                MatchResult::Undefined => out = MatchResult::Undefined,
                MatchResult::Maybe => {
                    if out == MatchResult::True {
                        out = MatchResult::Maybe;
                    }
                }
                MatchResult::True => {}
            }
        }
        out
    }

    // dominance for OR: True > Maybe > Undefined > False
    fn or_all(results: impl IntoIterator<Item = MatchResult>) -> MatchResult {
        let mut out = MatchResult::False;
        for r in results {
            match r {
                MatchResult::True => return MatchResult::True,
                MatchResult::Maybe => out = MatchResult::Maybe,
                MatchResult::Undefined => {
                    if out == MatchResult::False {
                        out = MatchResult::Undefined;
                    }
                }
                MatchResult::False => {}
            }
        }
        out
    }
}

/// Stored values for one attribute type, including subtype contributions.
struct Stored {
    values: Vec<Value>,
    /// A template wildcard contributes to this attribute.
    wildcard: bool,
}

// The filter evaluator sees entries and templates through this view.
trait FilterEval {
    fn eval_schema(&self) -> &Schema;
    fn stored(&self, at: &AttributeType) -> Stored;
    /// Values contributed by the entry's DN for dnAttributes matching.
    fn dn_values(&self, at: &AttributeType) -> Stored;
    fn attribute_types(&self) -> Vec<(&AttributeType, Stored)>;
}

fn leaf_result(stored: &Stored, outcome: Result<bool, OperationError>) -> MatchResult {
    match outcome {
        Ok(true) => MatchResult::True,
        Ok(false) if stored.wildcard => MatchResult::Maybe,
        Ok(false) => MatchResult::False,
        Err(_) => MatchResult::Undefined,
    }
}

fn eval_filter<T: FilterEval>(target: &T, filter: &Filter<'_>) -> MatchResult {
    let schema = target.eval_schema();
    match filter {
        Filter::And(filters) => {
            MatchResult::and_all(filters.iter().map(|f| eval_filter(target, f)))
        }
        Filter::Or(filters) => {
            MatchResult::or_all(filters.iter().map(|f| eval_filter(target, f)))
        }
        Filter::Not(inner) => eval_filter(target, inner).not(),
        Filter::Present(desc) => match schema.attribute_type(&desc.0) {
            None => MatchResult::Undefined,
            Some(at) => {
                let stored = target.stored(at);
                if !stored.values.is_empty() {
                    MatchResult::True
                } else if stored.wildcard {
                    MatchResult::Maybe
                } else {
                    MatchResult::False
                }
            }
        },
        Filter::EqualityMatch(ava) => match schema.attribute_type(&ava.attribute_desc.0) {
            None => MatchResult::Undefined,
            Some(at) => {
                let stored = target.stored(at);
                leaf_result(
                    &stored,
                    at.match_equal(schema, &stored.values, ava.assertion_value.as_ref()),
                )
            }
        },
        Filter::ApproxMatch(ava) => match schema.attribute_type(&ava.attribute_desc.0) {
            None => MatchResult::Undefined,
            Some(at) => {
                let stored = target.stored(at);
                leaf_result(
                    &stored,
                    at.match_approx(schema, &stored.values, ava.assertion_value.as_ref()),
                )
            }
        },
        Filter::GreaterOrEqual(ava) => match schema.attribute_type(&ava.attribute_desc.0) {
            None => MatchResult::Undefined,
            Some(at) => {
                let stored = target.stored(at);
                leaf_result(
                    &stored,
                    at.match_greater_or_equal(schema, &stored.values, ava.assertion_value.as_ref()),
                )
            }
        },
        Filter::LessOrEqual(ava) => match schema.attribute_type(&ava.attribute_desc.0) {
            None => MatchResult::Undefined,
            Some(at) => {
                let stored = target.stored(at);
                leaf_result(
                    &stored,
                    at.match_less_or_equal(schema, &stored.values, ava.assertion_value.as_ref()),
                )
            }
        },
        Filter::Substrings(sub) => match schema.attribute_type(&sub.filter_type.0) {
            None => MatchResult::Undefined,
            Some(at) => {
                let stored = target.stored(at);
                let any = sub.any();
                leaf_result(
                    &stored,
                    at.match_substr(
                        schema,
                        &stored.values,
                        sub.initial(),
                        &any,
                        sub.final_part(),
                    ),
                )
            }
        },
        Filter::ExtensibleMatch(mra) => eval_extensible(target, mra),
    }
}

fn eval_extensible<T: FilterEval>(
    target: &T,
    mra: &crate::filter::MatchingRuleAssertion<'_>,
) -> MatchResult {
    let schema = target.eval_schema();
    let rule: Option<&MatchingRule> = match &mra.matching_rule {
        Some(name) => match schema.matching_rule(&name.0) {
            Some(rule) => Some(rule),
            None => return MatchResult::Undefined,
        },
        None => None,
    };
    let dn_attributes = mra.dn_attributes.unwrap_or(false);
    let assertion = mra.assertion_value.0.as_ref();

    if let Some(desc) = &mra.rule_type {
        let at = match schema.attribute_type(&desc.0) {
            Some(at) => at,
            None => return MatchResult::Undefined,
        };
        let stored = target.stored(at);
        let mut results = vec![leaf_result(
            &stored,
            at.match_extensible(schema, &stored.values, assertion, rule),
        )];
        if dn_attributes {
            let dn_stored = target.dn_values(at);
            results.push(leaf_result(
                &dn_stored,
                at.match_extensible(schema, &dn_stored.values, assertion, rule),
            ));
        }
        MatchResult::or_all(results)
    } else {
        // without an attribute the rule must apply to any attribute the
        // entry carries
        let rule = match rule {
            Some(rule) => rule,
            None => return MatchResult::Undefined,
        };
        let mut results = Vec::new();
        let mut applicable = false;
        for (at, stored) in target.attribute_types() {
            if !rule.compatible_with_syntax(&at.syntax) {
                continue;
            }
            applicable = true;
            results.push(leaf_result(
                &stored,
                at.match_extensible(schema, &stored.values, assertion, Some(rule)),
            ));
        }
        if !applicable {
            return MatchResult::Undefined;
        }
        MatchResult::or_all(results)
    }
}

fn scope_matches(entry_dn: &Dn, base: &Dn, scope: SearchScope) -> bool {
    if scope == SearchScope::BaseObject {
        entry_dn == base
    } else if scope == SearchScope::SingleLevel {
        entry_dn.is_direct_child_of(base)
    } else if scope == SearchScope::WholeSubtree {
        entry_dn.in_subtree_of(base)
    } else {
        false
    }
}

/// Case-insensitive, OID-insensitive mapping from attribute type to a list of
/// decoded values.
///
/// Lookups also accept supertype names when asked for subtypes, so `name`
/// yields the values of `cn`, `sn` and the other descendants.
#[derive(Debug, Clone)]
pub struct AttributeDict {
    schema: Arc<Schema>,
    entries: Vec<(String, Vec<Value>)>,
}

impl AttributeDict {
    pub fn new(schema: Arc<Schema>) -> Self {
        AttributeDict {
            schema,
            entries: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn resolve(&self, key: &str) -> Option<&AttributeType> {
        self.schema.attribute_type(key)
    }

    fn position(&self, oid: &str) -> Option<usize> {
        self.entries.iter().position(|(o, _)| o == oid)
    }

    /// The values stored for exactly this attribute type ([] when absent or
    /// unknown).
    pub fn get(&self, key: &str) -> &[Value] {
        match self.resolve(key).map(|at| at.oid.clone()) {
            Some(oid) => self
                .position(&oid)
                .map(|i| self.entries[i].1.as_slice())
                .unwrap_or(&[]),
            None => &[],
        }
    }

    /// The values for this attribute type and all its subtypes.
    pub fn get_with_subtypes(&self, key: &str) -> Vec<Value> {
        let at = match self.resolve(key) {
            Some(at) => at,
            None => return Vec::new(),
        };
        self.stored_for(at)
    }

    fn stored_for(&self, at: &AttributeType) -> Vec<Value> {
        let types = self.schema.with_subtypes(at);
        let mut out = Vec::new();
        for (oid, values) in &self.entries {
            if types.iter().any(|t| &t.oid == oid) {
                out.extend(values.iter().cloned());
            }
        }
        out
    }

    /// Replace the value list of an attribute.
    pub fn set(&mut self, key: &str, values: Vec<Value>) -> Result<(), OperationError> {
        let oid = self
            .resolve(key)
            .map(|at| at.oid.clone())
            .ok_or(OperationError::UndefinedAttributeType)?;
        match self.position(&oid) {
            Some(i) => self.entries[i].1 = values,
            None => self.entries.push((oid, values)),
        }
        Ok(())
    }

    /// Mutable access to the value list, creating an empty one on demand.
    pub fn values_mut(&mut self, key: &str) -> Result<&mut Vec<Value>, OperationError> {
        let oid = self
            .resolve(key)
            .map(|at| at.oid.clone())
            .ok_or(OperationError::UndefinedAttributeType)?;
        let i = match self.position(&oid) {
            Some(i) => i,
            None => {
                self.entries.push((oid, Vec::new()));
                self.entries.len() - 1
            }
        };
        Ok(&mut self.entries[i].1)
    }

    /// Drop all values of an attribute (a no-op when absent).
    pub fn remove(&mut self, key: &str) -> Result<(), OperationError> {
        let oid = self
            .resolve(key)
            .map(|at| at.oid.clone())
            .ok_or(OperationError::UndefinedAttributeType)?;
        if let Some(i) = self.position(&oid) {
            self.entries.remove(i);
        }
        Ok(())
    }

    /// Insert the default when the attribute has no values yet; returns the
    /// resulting values.
    pub fn set_default(
        &mut self,
        key: &str,
        default: Vec<Value>,
    ) -> Result<&[Value], OperationError> {
        if self.get(key).is_empty() {
            self.set(key, default)?;
        }
        let oid = self.resolve(key).map(|at| at.oid.clone()).unwrap_or_default();
        Ok(self
            .position(&oid)
            .map(move |i| self.entries[i].1.as_slice())
            .unwrap_or(&[]))
    }

    /// Whether the attribute is present with at least one value.
    pub fn contains(&self, key: &str) -> bool {
        !self.get(key).is_empty()
    }

    /// Attribute types with at least one value, in insertion order.
    pub fn keys(&self) -> Vec<&AttributeType> {
        self.entries
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .filter_map(|(oid, _)| self.schema.attribute_type(oid))
            .collect()
    }

    /// `(attribute type, values)` pairs with at least one value.
    pub fn items(&self) -> Vec<(&AttributeType, &[Value])> {
        self.entries
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .filter_map(|(oid, values)| {
                self.schema
                    .attribute_type(oid)
                    .map(|at| (at, values.as_slice()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|(_, v)| !v.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Attribute selection and projection shared by all entry kinds.
fn project(
    schema: &Schema,
    dn: &Dn,
    attrs: &AttributeDict,
    selectors: &[&str],
    types_only: bool,
) -> Result<SearchResultEntry<'static>, OperationError> {
    fn add(oid: &str, list: &mut Vec<String>) {
        if !list.iter().any(|o| o == oid) {
            list.push(oid.to_string());
        }
    }

    let mut push_oid: Vec<String> = Vec::new();
    let all_user = |list: &mut Vec<String>| {
        for (oid, _) in &attrs.entries {
            if let Some(at) = schema.attribute_type(oid) {
                if !at.operational {
                    add(&at.oid, list);
                }
            }
        }
    };
    if selectors.is_empty() {
        all_user(&mut push_oid);
    } else {
        for selector in selectors {
            match *selector {
                "*" => all_user(&mut push_oid),
                "+" => {
                    for (oid, _) in &attrs.entries {
                        if let Some(at) = schema.attribute_type(oid) {
                            if at.operational {
                                add(&at.oid, &mut push_oid);
                            }
                        }
                    }
                }
                "1.1" => {}
                name => {
                    if let Some(at) = schema.attribute_type(name) {
                        add(&at.oid, &mut push_oid);
                    }
                    // unknown names are silently omitted
                }
            }
        }
    }

    let selected: Vec<&AttributeType> = push_oid
        .iter()
        .filter_map(|oid| schema.attribute_type(oid))
        .collect();

    let mut attributes = Vec::new();
    for at in selected {
        let values = attrs.get(&at.oid);
        if values.is_empty() {
            continue;
        }
        let attr_vals = if types_only {
            Vec::new()
        } else {
            values
                .iter()
                .map(|v| at.encode(schema, v).map(|b| AttributeValue(Cow::Owned(b))))
                .collect::<Result<Vec<_>, _>>()?
        };
        attributes.push(PartialAttribute {
            attr_type: LdapString(Cow::Owned(at.name().to_string())),
            attr_vals,
        });
    }
    Ok(SearchResultEntry {
        object_name: LdapDN(Cow::Owned(dn.to_string())),
        attributes,
    })
}

fn dn_assertion_values(schema: &Schema, dn: &Dn, at: &AttributeType) -> Vec<Value> {
    let mut out = Vec::new();
    for rdn in dn.rdns() {
        for assertion in rdn.assertions() {
            if let Some(assertion_type) = schema.attribute_type(assertion.attribute_oid()) {
                if schema.is_subtype(assertion_type, at) {
                    out.push(Value::Text(assertion.value().to_string()));
                }
            }
        }
    }
    out
}

/// An entry source consulted during search and compare dispatch.
///
/// Entries are application-owned; the library holds them only for the
/// duration of one operation.
pub trait DirectoryEntry: Send + Sync {
    /// Evaluate scope and filter; project attributes on a match.
    fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &Filter<'_>,
        attributes: &[&str],
        types_only: bool,
    ) -> Result<Option<SearchResultEntry<'static>>, OperationError>;

    /// Compare one attribute value assertion against this entry.
    fn compare(&self, dn: &str, attribute: &str, value: &[u8])
        -> Result<bool, OperationError>;

    /// Whether the search base names this entry or part of its subtree
    /// (used for the noSuchObject decision).
    fn covers_base(&self, base: &str) -> bool;
}

/// A concrete directory entry.
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    dn: Dn,
    attrs: AttributeDict,
}

impl ObjectEntry {
    pub fn new(schema: Arc<Schema>, dn: &str) -> Result<Self, DnError> {
        let dn = Dn::parse(&schema, dn)?;
        Ok(ObjectEntry {
            dn,
            attrs: AttributeDict::new(schema),
        })
    }

    pub(crate) fn from_parts(dn: Dn, attrs: AttributeDict) -> Self {
        ObjectEntry { dn, attrs }
    }

    pub fn dn(&self) -> &Dn {
        &self.dn
    }

    pub fn attributes(&self) -> &AttributeDict {
        &self.attrs
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeDict {
        &mut self.attrs
    }

    /// Replace the values of one attribute.
    pub fn set(&mut self, key: &str, values: Vec<Value>) -> Result<(), OperationError> {
        self.attrs.set(key, values)
    }

    pub fn match_search(&self, base: &str, scope: SearchScope, filter: &Filter<'_>) -> bool {
        let schema = self.attrs.schema.clone();
        let base = match Dn::parse(&schema, base) {
            Ok(base) => base,
            Err(_) => return false,
        };
        scope_matches(&self.dn, &base, scope) && eval_filter(self, filter).as_bool()
    }

    pub fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &Filter<'_>,
        attributes: &[&str],
        types_only: bool,
    ) -> Result<Option<SearchResultEntry<'static>>, OperationError> {
        if !self.match_search(base, scope, filter) {
            return Ok(None);
        }
        project(&self.attrs.schema, &self.dn, &self.attrs, attributes, types_only).map(Some)
    }

    pub fn compare(
        &self,
        dn: &str,
        attribute: &str,
        value: &[u8],
    ) -> Result<bool, OperationError> {
        let schema = &self.attrs.schema;
        let target = Dn::parse(schema, dn).map_err(|_| OperationError::NoSuchObject)?;
        if target != self.dn {
            return Err(OperationError::NoSuchObject);
        }
        let at = schema
            .attribute_type(attribute)
            .ok_or(OperationError::UndefinedAttributeType)?;
        let stored = self.attrs.stored_for(at);
        at.match_equal(schema, &stored, value)
    }
}

impl FilterEval for ObjectEntry {
    fn eval_schema(&self) -> &Schema {
        &self.attrs.schema
    }

    fn stored(&self, at: &AttributeType) -> Stored {
        Stored {
            values: self.attrs.stored_for(at),
            wildcard: false,
        }
    }

    fn dn_values(&self, at: &AttributeType) -> Stored {
        Stored {
            values: dn_assertion_values(&self.attrs.schema, &self.dn, at),
            wildcard: false,
        }
    }

    fn attribute_types(&self) -> Vec<(&AttributeType, Stored)> {
        self.attrs
            .entries
            .iter()
            .filter_map(|(oid, values)| {
                self.attrs.schema.attribute_type(oid).map(|at| {
                    (
                        at,
                        Stored {
                            values: values.clone(),
                            wildcard: false,
                        },
                    )
                })
            })
            .collect()
    }
}

impl DirectoryEntry for ObjectEntry {
    fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &Filter<'_>,
        attributes: &[&str],
        types_only: bool,
    ) -> Result<Option<SearchResultEntry<'static>>, OperationError> {
        ObjectEntry::search(self, base, scope, filter, attributes, types_only)
    }

    fn compare(&self, dn: &str, attribute: &str, value: &[u8]) -> Result<bool, OperationError> {
        ObjectEntry::compare(self, dn, attribute, value)
    }

    fn covers_base(&self, base: &str) -> bool {
        match Dn::parse(&self.attrs.schema, base) {
            Ok(base) => self.dn == base || self.dn.in_subtree_of(&base),
            Err(_) => false,
        }
    }
}

/// The root DSE: the single entry at the empty DN advertising server
/// capabilities.
///
/// It only answers searches with an empty base, baseObject scope, and an
/// `(objectClass=*)` filter.
#[derive(Debug, Clone)]
pub struct RootDse {
    entry: ObjectEntry,
}

impl RootDse {
    pub fn new(schema: Arc<Schema>) -> Self {
        RootDse {
            entry: ObjectEntry {
                dn: Dn::root(),
                attrs: AttributeDict::new(schema),
            },
        }
    }

    pub fn attributes(&self) -> &AttributeDict {
        &self.entry.attrs
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeDict {
        &mut self.entry.attrs
    }

    pub fn set(&mut self, key: &str, values: Vec<Value>) -> Result<(), OperationError> {
        self.entry.set(key, values)
    }

    fn filter_is_object_class_present(&self, filter: &Filter<'_>) -> bool {
        match filter {
            Filter::Present(desc) => self
                .entry
                .attrs
                .schema
                .attribute_type(&desc.0)
                .map(|at| at.oid == oids::attribute::OBJECT_CLASS)
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn match_search(&self, base: &str, scope: SearchScope, filter: &Filter<'_>) -> bool {
        base.is_empty()
            && scope == SearchScope::BaseObject
            && self.filter_is_object_class_present(filter)
    }
}

impl DirectoryEntry for RootDse {
    fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &Filter<'_>,
        attributes: &[&str],
        types_only: bool,
    ) -> Result<Option<SearchResultEntry<'static>>, OperationError> {
        if !self.match_search(base, scope, filter) {
            return Ok(None);
        }
        let schema = &self.entry.attrs.schema;
        project(schema, &self.entry.dn, &self.entry.attrs, attributes, types_only).map(Some)
    }

    fn compare(&self, dn: &str, attribute: &str, value: &[u8]) -> Result<bool, OperationError> {
        self.entry.compare(dn, attribute, value)
    }

    fn covers_base(&self, base: &str) -> bool {
        base.is_empty()
    }
}

/// The subschema subentry: publishes the schema as LDAP attributes and hands
/// out entry constructors that carry the matching `subschemaSubentry`
/// pointer.
#[derive(Debug, Clone)]
pub struct SubschemaSubentry {
    schema: Arc<Schema>,
    entry: ObjectEntry,
}

impl SubschemaSubentry {
    pub fn new(schema: Arc<Schema>, dn: &str) -> Result<Self, DnError> {
        let dn = Dn::parse(&schema, dn)?;
        let mut attrs = AttributeDict::new(schema.clone());
        let elements = |defs: Vec<String>| {
            defs.into_iter()
                .map(Value::SchemaElement)
                .collect::<Vec<_>>()
        };
        // the subentry publishes the very schema it was created from
        let _ = attrs.set(
            "objectClass",
            vec![Value::Oid("top".to_string()), Value::Oid("subschema".to_string())],
        );
        if let Some(rdn) = dn.first_rdn().and_then(Rdn::as_single) {
            let _ = attrs.set(rdn.attribute(), vec![Value::Text(rdn.value().to_string())]);
        }
        let _ = attrs.set("objectClasses", elements(schema.object_class_definitions()));
        let _ = attrs.set(
            "attributeTypes",
            elements(schema.attribute_type_definitions()),
        );
        let _ = attrs.set("ldapSyntaxes", elements(schema.syntax_definitions()));
        let _ = attrs.set(
            "matchingRules",
            elements(schema.matching_rule_definitions()),
        );
        let _ = attrs.set(
            "matchingRuleUse",
            elements(schema.matching_rule_use_definitions()),
        );
        Ok(SubschemaSubentry {
            schema,
            entry: ObjectEntry { dn, attrs },
        })
    }

    pub fn dn(&self) -> &Dn {
        &self.entry.dn
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn attributes(&self) -> &AttributeDict {
        &self.entry.attrs
    }

    /// Subentries only answer baseObject searches at their own DN.
    pub fn match_search(&self, base: &str, scope: SearchScope, filter: &Filter<'_>) -> bool {
        if scope != SearchScope::BaseObject {
            return false;
        }
        self.entry.match_search(base, scope, filter)
    }

    /// An [`AttributeDict`] bound to this subentry's schema.
    pub fn attribute_dict(&self) -> AttributeDict {
        AttributeDict::new(self.schema.clone())
    }

    /// An [`ObjectEntry`] carrying the `subschemaSubentry` pointer.
    pub fn object_entry(&self, dn: &str) -> Result<ObjectEntry, DnError> {
        let mut entry = ObjectEntry::new(self.schema.clone(), dn)?;
        let _ = entry.set(
            "subschemaSubentry",
            vec![Value::Dn(self.entry.dn.clone())],
        );
        Ok(entry)
    }

    /// A [`RootDse`] carrying the `subschemaSubentry` pointer.
    pub fn root_dse(&self) -> RootDse {
        let mut root = RootDse::new(self.schema.clone());
        let _ = root.set(
            "subschemaSubentry",
            vec![Value::Dn(self.entry.dn.clone())],
        );
        root
    }

    /// An [`EntryTemplate`] carrying the `subschemaSubentry` pointer.
    pub fn entry_template(
        &self,
        parent: &str,
        rdn_attribute: &str,
    ) -> Result<EntryTemplate, DnError> {
        let mut template = EntryTemplate::new(self.schema.clone(), parent, rdn_attribute)?;
        let _ = template.set(
            "subschemaSubentry",
            vec![Value::Dn(self.entry.dn.clone())],
        );
        Ok(template)
    }
}

impl DirectoryEntry for SubschemaSubentry {
    fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &Filter<'_>,
        attributes: &[&str],
        types_only: bool,
    ) -> Result<Option<SearchResultEntry<'static>>, OperationError> {
        if !self.match_search(base, scope, filter) {
            return Ok(None);
        }
        project(&self.schema, &self.entry.dn, &self.entry.attrs, attributes, types_only).map(Some)
    }

    fn compare(&self, dn: &str, attribute: &str, value: &[u8]) -> Result<bool, OperationError> {
        self.entry.compare(dn, attribute, value)
    }

    fn covers_base(&self, base: &str) -> bool {
        match Dn::parse(&self.schema, base) {
            Ok(base) => self.entry.dn == base || self.entry.dn.in_subtree_of(&base),
            Err(_) => false,
        }
    }
}

/// The values of one template attribute: a concrete list or the wildcard
/// sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Values(Vec<Value>),
    Wildcard,
}

/// A pattern standing for every entry `<rdn_attr>=<x>,<parent>`.
///
/// Wildcard attributes take part in filter evaluation with the fourth value
/// Maybe; [`EntryTemplate::extract_search_constraints`] pulls the concrete
/// values a filter demands so an application can generate matching entries
/// via [`EntryTemplate::create_entry`].
#[derive(Debug, Clone)]
pub struct EntryTemplate {
    schema: Arc<Schema>,
    parent: Dn,
    rdn_attribute: String,
    attrs: Vec<(String, TemplateValue)>,
}

impl EntryTemplate {
    pub fn new(schema: Arc<Schema>, parent: &str, rdn_attribute: &str) -> Result<Self, DnError> {
        let parent = Dn::parse(&schema, parent)?;
        let rdn_attribute = schema
            .attribute_type(rdn_attribute)
            .map(|at| at.oid.clone())
            .ok_or_else(|| DnError::UnknownAttributeType(rdn_attribute.to_string()))?;
        Ok(EntryTemplate {
            schema,
            parent,
            rdn_attribute,
            attrs: Vec::new(),
        })
    }

    pub fn parent(&self) -> &Dn {
        &self.parent
    }

    /// Canonical name of the RDN attribute.
    pub fn rdn_attribute(&self) -> &str {
        self.schema
            .attribute_type(&self.rdn_attribute)
            .map(|at| at.name())
            .unwrap_or(&self.rdn_attribute)
    }

    pub fn set(&mut self, key: &str, values: Vec<Value>) -> Result<(), OperationError> {
        self.set_template(key, TemplateValue::Values(values))
    }

    pub fn set_wildcard(&mut self, key: &str) -> Result<(), OperationError> {
        self.set_template(key, TemplateValue::Wildcard)
    }

    fn set_template(&mut self, key: &str, value: TemplateValue) -> Result<(), OperationError> {
        let oid = self
            .schema
            .attribute_type(key)
            .map(|at| at.oid.clone())
            .ok_or(OperationError::UndefinedAttributeType)?;
        match self.attrs.iter_mut().find(|(o, _)| *o == oid) {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((oid, value)),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        let oid = self.schema.attribute_type(key)?.oid.clone();
        self.attrs.iter().find(|(o, _)| *o == oid).map(|(_, v)| v)
    }

    // A DN this template could have generated: one RDN below the parent,
    // single-valued, using the template's RDN attribute.
    fn matches_child_dn(&self, dn: &Dn) -> bool {
        dn.is_direct_child_of(&self.parent)
            && dn
                .first_rdn()
                .and_then(Rdn::as_single)
                .map(|a| a.attribute_oid() == self.rdn_attribute)
                .unwrap_or(false)
    }

    pub fn match_search(&self, base: &str, scope: SearchScope, filter: &Filter<'_>) -> bool {
        let base = match Dn::parse(&self.schema, base) {
            Ok(base) => base,
            Err(_) => return false,
        };
        let in_scope = if scope == SearchScope::BaseObject {
            self.matches_child_dn(&base)
        } else if scope == SearchScope::SingleLevel {
            base == self.parent
        } else if scope == SearchScope::WholeSubtree {
            self.matches_child_dn(&base) || self.parent.in_subtree_of(&base)
        } else {
            false
        };
        in_scope && eval_filter(self, filter).as_bool()
    }

    /// Collect attribute -> required-values constraints from the True/Maybe
    /// leaves of the filter (and from the base DN when it names a concrete
    /// child), keyed by canonical attribute name.
    pub fn extract_search_constraints(
        &self,
        base: &str,
        _scope: SearchScope,
        filter: &Filter<'_>,
    ) -> HashMap<String, Vec<Value>> {
        let mut constraints = HashMap::new();
        self.collect_constraints(filter, &mut constraints);
        if let Ok(base) = Dn::parse(&self.schema, base) {
            if self.matches_child_dn(&base) {
                if let Some(assertion) = base.first_rdn().and_then(Rdn::as_single) {
                    constraints
                        .entry(self.rdn_attribute().to_string())
                        .or_insert_with(Vec::new)
                        .push(Value::Text(assertion.value().to_string()));
                }
            }
        }
        constraints
    }

    fn collect_constraints(&self, filter: &Filter<'_>, out: &mut HashMap<String, Vec<Value>>) {
        match filter {
            Filter::And(filters) => {
                for f in filters {
                    self.collect_constraints(f, out);
                }
            }
            // an Or-branch only contributes when it stands alone
            Filter::Or(filters) if filters.len() == 1 => {
                self.collect_constraints(&filters[0], out)
            }
            Filter::EqualityMatch(ava) => {
                if let Some(at) = self.schema.attribute_type(&ava.attribute_desc.0) {
                    if let Ok(value) = at.decode(&self.schema, ava.assertion_value.as_ref()) {
                        out.entry(at.name().to_string())
                            .or_insert_with(Vec::new)
                            .push(value);
                    }
                }
            }
            _ => {}
        }
    }

    /// Realize one entry of this pattern.
    ///
    /// Concrete template attributes carry over; wildcard attributes take the
    /// provided values; values for attributes outside the template are
    /// rejected.
    pub fn create_entry(
        &self,
        rdn_value: &str,
        values: &[(&str, Vec<Value>)],
    ) -> Result<ObjectEntry, OperationError> {
        let mut attrs = AttributeDict::new(self.schema.clone());
        for (oid, template_value) in &self.attrs {
            if let TemplateValue::Values(concrete) = template_value {
                attrs.set(oid, concrete.clone())?;
            }
        }
        for (key, provided) in values {
            let at = self
                .schema
                .attribute_type(key)
                .ok_or(OperationError::UndefinedAttributeType)?;
            if !self.attrs.iter().any(|(oid, _)| *oid == at.oid) {
                return Err(OperationError::Other(format!(
                    "attribute '{}' not part of the template",
                    key
                )));
            }
            attrs.set(key, provided.clone())?;
        }
        let rdn = Rdn::single(&self.schema, self.rdn_attribute(), rdn_value)
            .map_err(OperationError::from)?;
        let dn = &Dn::new(vec![rdn]) + &self.parent;
        Ok(ObjectEntry::from_parts(dn, attrs))
    }
}

impl FilterEval for EntryTemplate {
    fn eval_schema(&self) -> &Schema {
        &self.schema
    }

    fn stored(&self, at: &AttributeType) -> Stored {
        let types = self.schema.with_subtypes(at);
        let mut values = Vec::new();
        let mut wildcard = false;
        for (oid, template_value) in &self.attrs {
            if !types.iter().any(|t| &t.oid == oid) {
                continue;
            }
            match template_value {
                TemplateValue::Values(concrete) => values.extend(concrete.iter().cloned()),
                TemplateValue::Wildcard => wildcard = true,
            }
        }
        Stored { values, wildcard }
    }

    fn dn_values(&self, at: &AttributeType) -> Stored {
        let mut stored = Stored {
            values: dn_assertion_values(&self.schema, &self.parent, at),
            wildcard: false,
        };
        // the RDN attribute of generated children is unconstrained
        if let Some(rdn_at) = self.schema.attribute_type(&self.rdn_attribute) {
            if self.schema.is_subtype(rdn_at, at) {
                stored.wildcard = true;
            }
        }
        stored
    }

    fn attribute_types(&self) -> Vec<(&AttributeType, Stored)> {
        self.attrs
            .iter()
            .filter_map(|(oid, template_value)| {
                self.schema.attribute_type(oid).map(|at| {
                    let stored = match template_value {
                        TemplateValue::Values(values) => Stored {
                            values: values.clone(),
                            wildcard: false,
                        },
                        TemplateValue::Wildcard => Stored {
                            values: Vec::new(),
                            wildcard: true,
                        },
                    };
                    (at, stored)
                })
            })
            .collect()
    }
}

impl DirectoryEntry for EntryTemplate {
    // Templates describe entries without materializing them; search yields
    // nothing until the application generates entries from the constraints.
    fn search(
        &self,
        _base: &str,
        _scope: SearchScope,
        _filter: &Filter<'_>,
        _attributes: &[&str],
        _types_only: bool,
    ) -> Result<Option<SearchResultEntry<'static>>, OperationError> {
        Ok(None)
    }

    fn compare(&self, _dn: &str, _attribute: &str, _value: &[u8]) -> Result<bool, OperationError> {
        Err(OperationError::NoSuchObject)
    }

    fn covers_base(&self, base: &str) -> bool {
        match Dn::parse(&self.schema, base) {
            Ok(base) => {
                self.matches_child_dn(&base)
                    || base == self.parent
                    || self.parent.in_subtree_of(&base)
            }
            Err(_) => false,
        }
    }
}
