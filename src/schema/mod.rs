//! Schema engine (RFC 4512)
//!
//! A [`Schema`] is an immutable registry of syntaxes, matching rules,
//! attribute types and object classes, indexed by numeric OID and by
//! case-insensitive name. It binds attribute assertions to their comparison
//! semantics and publishes itself through the subschema subentry.
//!
//! Schemas are constructed once at startup and shared (they are cheap to
//! clone into an `Arc` and safely readable without locks afterwards).

mod builtin;
pub mod definitions;
pub mod matching;
pub mod syntax;

use std::collections::HashMap;
use std::ops::BitOr;

pub use builtin::rfc4519;
pub use definitions::{AttributeTypeDescription, ObjectClassDescription, ObjectClassKind};
pub use matching::{MatchingRule, MatchingRuleKind};
pub use syntax::{SubstringPattern, Syntax, SyntaxKind, Value};

use crate::error::{OperationError, SchemaError};

/// Well-known numeric OIDs.
pub mod oids {
    /// Syntax OIDs (RFC 4517).
    pub mod syntax {
        pub const ATTRIBUTE_TYPE_DESCRIPTION: &str = "1.3.6.1.4.1.1466.115.121.1.3";
        pub const BIT_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.6";
        pub const BOOLEAN: &str = "1.3.6.1.4.1.1466.115.121.1.7";
        pub const COUNTRY_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.11";
        pub const DN: &str = "1.3.6.1.4.1.1466.115.121.1.12";
        pub const DELIVERY_METHOD: &str = "1.3.6.1.4.1.1466.115.121.1.14";
        pub const DIRECTORY_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.15";
        pub const DIT_CONTENT_RULE_DESCRIPTION: &str = "1.3.6.1.4.1.1466.115.121.1.16";
        pub const DIT_STRUCTURE_RULE_DESCRIPTION: &str = "1.3.6.1.4.1.1466.115.121.1.17";
        pub const ENHANCED_GUIDE: &str = "1.3.6.1.4.1.1466.115.121.1.21";
        pub const FACSIMILE_TELEPHONE_NUMBER: &str = "1.3.6.1.4.1.1466.115.121.1.22";
        pub const GENERALIZED_TIME: &str = "1.3.6.1.4.1.1466.115.121.1.24";
        pub const GUIDE: &str = "1.3.6.1.4.1.1466.115.121.1.25";
        pub const IA5_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.26";
        pub const INTEGER: &str = "1.3.6.1.4.1.1466.115.121.1.27";
        pub const MATCHING_RULE_DESCRIPTION: &str = "1.3.6.1.4.1.1466.115.121.1.30";
        pub const MATCHING_RULE_USE_DESCRIPTION: &str = "1.3.6.1.4.1.1466.115.121.1.31";
        pub const NAME_AND_OPTIONAL_UID: &str = "1.3.6.1.4.1.1466.115.121.1.34";
        pub const NAME_FORM_DESCRIPTION: &str = "1.3.6.1.4.1.1466.115.121.1.35";
        pub const NUMERIC_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.36";
        pub const OBJECT_CLASS_DESCRIPTION: &str = "1.3.6.1.4.1.1466.115.121.1.37";
        pub const OID: &str = "1.3.6.1.4.1.1466.115.121.1.38";
        pub const OCTET_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.40";
        pub const POSTAL_ADDRESS: &str = "1.3.6.1.4.1.1466.115.121.1.41";
        pub const PRINTABLE_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.44";
        pub const TELEPHONE_NUMBER: &str = "1.3.6.1.4.1.1466.115.121.1.50";
        pub const TELETEX_TERMINAL_IDENTIFIER: &str = "1.3.6.1.4.1.1466.115.121.1.51";
        pub const TELEX_NUMBER: &str = "1.3.6.1.4.1.1466.115.121.1.52";
        pub const UTC_TIME: &str = "1.3.6.1.4.1.1466.115.121.1.53";
        pub const LDAP_SYNTAX_DESCRIPTION: &str = "1.3.6.1.4.1.1466.115.121.1.54";
        pub const SUBSTRING_ASSERTION: &str = "1.3.6.1.4.1.1466.115.121.1.58";
    }

    /// Attribute type OIDs used directly by the library.
    pub mod attribute {
        pub const OBJECT_CLASS: &str = "2.5.4.0";
        pub const SUBSCHEMA_SUBENTRY: &str = "2.5.18.10";
    }
}

/// A registered attribute type, with EQUALITY/ORDERING/SUBSTR and syntax
/// already resolved through any SUP chain.
#[derive(Debug, Clone)]
pub struct AttributeType {
    pub oid: String,
    pub names: Vec<String>,
    /// Numeric OID of the supertype, if any.
    pub sup: Option<String>,
    /// Resolved matching rule OIDs.
    pub equality: Option<String>,
    pub ordering: Option<String>,
    pub substr: Option<String>,
    /// Resolved syntax OID.
    pub syntax: String,
    pub single_value: bool,
    pub no_user_modification: bool,
    /// USAGE other than userApplications.
    pub operational: bool,
    /// Numeric OIDs of the direct subtypes (maintained on registration).
    pub subtypes: Vec<String>,
    definition: AttributeTypeDescription,
}

impl AttributeType {
    /// The canonical name (first NAME, or the OID for nameless types).
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.oid)
    }

    pub fn definition(&self) -> &AttributeTypeDescription {
        &self.definition
    }

    pub fn equality_rule<'s>(&self, schema: &'s Schema) -> Option<&'s MatchingRule> {
        self.equality.as_deref().and_then(|o| schema.matching_rule(o))
    }

    pub fn ordering_rule<'s>(&self, schema: &'s Schema) -> Option<&'s MatchingRule> {
        self.ordering.as_deref().and_then(|o| schema.matching_rule(o))
    }

    pub fn substr_rule<'s>(&self, schema: &'s Schema) -> Option<&'s MatchingRule> {
        self.substr.as_deref().and_then(|o| schema.matching_rule(o))
    }

    /// Every registered rule applicable to this attribute's syntax.
    pub fn compatible_matching_rules<'s>(&self, schema: &'s Schema) -> Vec<&'s MatchingRule> {
        schema
            .matching_rules()
            .iter()
            .filter(|r| r.compatible_with_syntax(&self.syntax))
            .collect()
    }

    pub fn decode(&self, schema: &Schema, raw: &[u8]) -> Result<Value, OperationError> {
        schema
            .syntax(&self.syntax)
            .ok_or(OperationError::InvalidAttributeSyntax)?
            .decode(schema, raw)
    }

    pub fn encode(&self, schema: &Schema, value: &Value) -> Result<Vec<u8>, OperationError> {
        schema
            .syntax(&self.syntax)
            .ok_or(OperationError::InvalidAttributeSyntax)?
            .encode(schema, value)
    }

    fn decode_assertion(
        &self,
        schema: &Schema,
        rule: &MatchingRule,
        raw: &[u8],
    ) -> Result<Value, OperationError> {
        schema
            .syntax(&rule.syntax)
            .ok_or(OperationError::InvalidAttributeSyntax)?
            .decode(schema, raw)
    }

    /// EQUALITY match against raw assertion octets.
    pub fn match_equal(
        &self,
        schema: &Schema,
        stored: &[Value],
        assertion: &[u8],
    ) -> Result<bool, OperationError> {
        let rule = self
            .equality_rule(schema)
            .ok_or(OperationError::InappropriateMatching)?;
        let assertion = self.decode_assertion(schema, rule, assertion)?;
        rule.match_equal(schema, stored, &assertion)
    }

    /// APPROX match; without a dedicated approximate rule this falls back to
    /// equality.
    pub fn match_approx(
        &self,
        schema: &Schema,
        stored: &[Value],
        assertion: &[u8],
    ) -> Result<bool, OperationError> {
        self.match_equal(schema, stored, assertion)
    }

    /// SUBSTR match against raw wire pieces.
    pub fn match_substr(
        &self,
        schema: &Schema,
        stored: &[Value],
        initial: Option<&[u8]>,
        any: &[&[u8]],
        final_part: Option<&[u8]>,
    ) -> Result<bool, OperationError> {
        let rule = self
            .substr_rule(schema)
            .ok_or(OperationError::InappropriateMatching)?;
        let pattern = SubstringPattern::from_wire(initial, any, final_part)?;
        rule.match_substrings(schema, stored, &pattern)
    }

    /// ORDERING match (`>=`).
    pub fn match_greater_or_equal(
        &self,
        schema: &Schema,
        stored: &[Value],
        assertion: &[u8],
    ) -> Result<bool, OperationError> {
        let rule = self
            .ordering_rule(schema)
            .ok_or(OperationError::InappropriateMatching)?;
        let assertion = self.decode_assertion(schema, rule, assertion)?;
        rule.match_greater_or_equal(schema, stored, &assertion)
    }

    /// `<=` is a hybrid: equal under EQUALITY or less under ORDERING.
    pub fn match_less_or_equal(
        &self,
        schema: &Schema,
        stored: &[Value],
        assertion: &[u8],
    ) -> Result<bool, OperationError> {
        let equality = self.equality_rule(schema);
        let ordering = self.ordering_rule(schema);
        if equality.is_none() && ordering.is_none() {
            return Err(OperationError::InappropriateMatching);
        }
        if let Some(rule) = equality {
            let assertion = self.decode_assertion(schema, rule, assertion)?;
            if rule.match_equal(schema, stored, &assertion)? {
                return Ok(true);
            }
        }
        if let Some(rule) = ordering {
            let assertion = self.decode_assertion(schema, rule, assertion)?;
            if rule.match_less(schema, stored, &assertion)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Extensible match: an explicit rule overrides the attribute's default
    /// EQUALITY rule and must be compatible with the attribute's syntax.
    pub fn match_extensible(
        &self,
        schema: &Schema,
        stored: &[Value],
        assertion: &[u8],
        rule: Option<&MatchingRule>,
    ) -> Result<bool, OperationError> {
        if let Some(rule) = rule {
            if !rule.compatible_with_syntax(&self.syntax) {
                return Err(OperationError::InappropriateMatching);
            }
        }
        let rule = match rule {
            Some(rule) => rule,
            None => self
                .equality_rule(schema)
                .ok_or(OperationError::InappropriateMatching)?,
        };
        if rule.supports_substrings() {
            let pattern = syntax::decode_substring_assertion(assertion)?;
            rule.match_substrings(schema, stored, &pattern)
        } else if rule.supports_equality() {
            let assertion = self.decode_assertion(schema, rule, assertion)?;
            rule.match_equal(schema, stored, &assertion)
        } else {
            Err(OperationError::InappropriateMatching)
        }
    }
}

/// A registered object class.
#[derive(Debug, Clone)]
pub struct ObjectClass {
    pub oid: String,
    pub names: Vec<String>,
    /// Numeric OIDs of the superior classes.
    pub sup: Vec<String>,
    pub kind: ObjectClassKind,
    /// Numeric OIDs of mandatory and optional attribute types.
    pub must: Vec<String>,
    pub may: Vec<String>,
    definition: ObjectClassDescription,
}

impl ObjectClass {
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.oid)
    }

    pub fn definition(&self) -> &ObjectClassDescription {
        &self.definition
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementRef {
    Syntax(usize),
    MatchingRule(usize),
    AttributeType(usize),
    ObjectClass(usize),
}

/// The schema registry.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    syntaxes: Vec<Syntax>,
    matching_rules: Vec<MatchingRule>,
    attribute_types: Vec<AttributeType>,
    object_classes: Vec<ObjectClass>,
    index: HashMap<String, ElementRef>,
}

impl Schema {
    /// Build a schema from syntaxes, matching rules and textual attribute
    /// type / object class definitions.
    ///
    /// Definitions may reference each other in any order within one call;
    /// unresolvable references and conflicting registrations are errors.
    pub fn new(
        syntaxes: Vec<Syntax>,
        matching_rules: Vec<MatchingRule>,
        attribute_types: &[&str],
        object_classes: &[&str],
    ) -> Result<Schema, SchemaError> {
        let attribute_types = attribute_types
            .iter()
            .map(|d| AttributeTypeDescription::parse(d))
            .collect::<Result<Vec<_>, _>>()?;
        let object_classes = object_classes
            .iter()
            .map(|d| ObjectClassDescription::parse(d))
            .collect::<Result<Vec<_>, _>>()?;
        Schema::build(syntaxes, matching_rules, attribute_types, object_classes)
    }

    /// A new schema with additional attribute type and object class
    /// definitions.
    pub fn extend(
        &self,
        attribute_types: &[&str],
        object_classes: &[&str],
    ) -> Result<Schema, SchemaError> {
        let mut attr_descs: Vec<AttributeTypeDescription> = self
            .attribute_types
            .iter()
            .map(|a| a.definition.clone())
            .collect();
        for d in attribute_types {
            attr_descs.push(AttributeTypeDescription::parse(d)?);
        }
        let mut oc_descs: Vec<ObjectClassDescription> = self
            .object_classes
            .iter()
            .map(|o| o.definition.clone())
            .collect();
        for d in object_classes {
            oc_descs.push(ObjectClassDescription::parse(d)?);
        }
        Schema::build(
            self.syntaxes.clone(),
            self.matching_rules.clone(),
            attr_descs,
            oc_descs,
        )
    }

    /// Merge two schemas; compatible duplicates are idempotent, conflicting
    /// ones raise a construction error.
    pub fn merge(&self, other: &Schema) -> Result<Schema, SchemaError> {
        let mut syntaxes = self.syntaxes.clone();
        for s in &other.syntaxes {
            match syntaxes.iter().find(|e| e.oid == s.oid) {
                None => syntaxes.push(s.clone()),
                Some(existing) if existing == s => {}
                Some(_) => return Err(SchemaError::Conflict(s.oid.to_string())),
            }
        }
        let mut matching_rules = self.matching_rules.clone();
        for r in &other.matching_rules {
            match matching_rules.iter().find(|e| e.oid == r.oid) {
                None => matching_rules.push(r.clone()),
                Some(existing) if existing == r => {}
                Some(_) => return Err(SchemaError::Conflict(r.oid.to_string())),
            }
        }
        let mut attr_descs: Vec<AttributeTypeDescription> = self
            .attribute_types
            .iter()
            .map(|a| a.definition.clone())
            .collect();
        for a in &other.attribute_types {
            match attr_descs.iter().find(|e| e.oid == a.definition.oid) {
                None => attr_descs.push(a.definition.clone()),
                Some(existing) if *existing == a.definition => {}
                Some(_) => return Err(SchemaError::Conflict(a.oid.clone())),
            }
        }
        let mut oc_descs: Vec<ObjectClassDescription> = self
            .object_classes
            .iter()
            .map(|o| o.definition.clone())
            .collect();
        for o in &other.object_classes {
            match oc_descs.iter().find(|e| e.oid == o.definition.oid) {
                None => oc_descs.push(o.definition.clone()),
                Some(existing) if *existing == o.definition => {}
                Some(_) => return Err(SchemaError::Conflict(o.oid.clone())),
            }
        }
        Schema::build(syntaxes, matching_rules, attr_descs, oc_descs)
    }

    fn build(
        syntaxes: Vec<Syntax>,
        matching_rules: Vec<MatchingRule>,
        attr_descs: Vec<AttributeTypeDescription>,
        oc_descs: Vec<ObjectClassDescription>,
    ) -> Result<Schema, SchemaError> {
        let mut schema = Schema::default();

        for s in syntaxes {
            if let Some(existing) = schema.syntax(&s.oid) {
                if *existing == s {
                    continue;
                }
                return Err(SchemaError::Conflict(s.oid.to_string()));
            }
            let idx = schema.syntaxes.len();
            let oid = s.oid.to_string();
            schema.syntaxes.push(s);
            schema.register(&oid, ElementRef::Syntax(idx))?;
        }

        for r in matching_rules {
            if let Some(existing) = schema.matching_rule(&r.oid) {
                if *existing == r {
                    continue;
                }
                return Err(SchemaError::Conflict(r.oid.to_string()));
            }
            if schema.syntax(&r.syntax).is_none() {
                return Err(SchemaError::UnknownReference(r.syntax.to_string()));
            }
            let idx = schema.matching_rules.len();
            let oid = r.oid.to_string();
            let names: Vec<String> = r.names.iter().map(|n| n.to_string()).collect();
            schema.matching_rules.push(r);
            schema.register(&oid, ElementRef::MatchingRule(idx))?;
            for name in names {
                schema.register(&name, ElementRef::MatchingRule(idx))?;
            }
        }

        schema.resolve_attribute_types(attr_descs)?;
        schema.resolve_object_classes(oc_descs)?;
        Ok(schema)
    }

    fn register(&mut self, key: &str, elem: ElementRef) -> Result<(), SchemaError> {
        let key = key.to_ascii_lowercase();
        match self.index.get(&key) {
            None => {
                self.index.insert(key, elem);
                Ok(())
            }
            Some(existing) if *existing == elem => Ok(()),
            Some(_) => Err(SchemaError::Conflict(key)),
        }
    }

    // Attribute type descriptions may arrive in any order; resolve SUP chains
    // by fixpoint iteration. A batch that stops making progress has a missing
    // dependency or a SUP cycle.
    fn resolve_attribute_types(
        &mut self,
        descs: Vec<AttributeTypeDescription>,
    ) -> Result<(), SchemaError> {
        let mut pending: Vec<AttributeTypeDescription> = Vec::new();
        for desc in descs {
            if let Some(existing) = self.attribute_type(&desc.oid) {
                if existing.definition == desc {
                    continue;
                }
                return Err(SchemaError::Conflict(desc.oid));
            }
            // duplicate registration of an identical definition is idempotent
            if let Some(prior) = pending.iter().find(|d| d.oid == desc.oid) {
                if *prior == desc {
                    continue;
                }
                return Err(SchemaError::Conflict(desc.oid));
            }
            pending.push(desc);
        }

        while !pending.is_empty() {
            let mut progressed = false;
            let mut still_pending = Vec::new();
            for desc in pending {
                let sup = match &desc.sup {
                    None => None,
                    Some(name) => match self.attribute_type(name) {
                        Some(at) => Some(at.clone()),
                        None => {
                            still_pending.push(desc);
                            continue;
                        }
                    },
                };
                self.register_attribute_type(desc, sup)?;
                progressed = true;
            }
            if !progressed {
                let missing: Vec<String> =
                    still_pending.iter().map(|d| d.oid.clone()).collect();
                return Err(SchemaError::Unresolvable(missing.join(", ")));
            }
            pending = still_pending;
        }
        Ok(())
    }

    fn register_attribute_type(
        &mut self,
        desc: AttributeTypeDescription,
        sup: Option<AttributeType>,
    ) -> Result<(), SchemaError> {
        let resolve_rule = |schema: &Schema, name: &Option<String>| -> Result<Option<String>, SchemaError> {
            match name {
                None => Ok(None),
                Some(name) => schema
                    .matching_rule(name)
                    .map(|r| Some(r.oid.to_string()))
                    .ok_or_else(|| SchemaError::UnknownReference(name.clone())),
            }
        };
        let equality = resolve_rule(self, &desc.equality)?
            .or_else(|| sup.as_ref().and_then(|s| s.equality.clone()));
        let ordering = resolve_rule(self, &desc.ordering)?
            .or_else(|| sup.as_ref().and_then(|s| s.ordering.clone()));
        let substr = resolve_rule(self, &desc.substr)?
            .or_else(|| sup.as_ref().and_then(|s| s.substr.clone()));
        let syntax = match &desc.syntax {
            Some(oid) => {
                if self.syntax(oid).is_none() {
                    return Err(SchemaError::UnknownReference(oid.clone()));
                }
                oid.clone()
            }
            None => match &sup {
                Some(s) => s.syntax.clone(),
                None => {
                    return Err(SchemaError::InvalidDefinition(format!(
                        "attribute type {} has neither SYNTAX nor SUP",
                        desc.oid
                    )))
                }
            },
        };
        let operational = matches!(
            desc.usage.as_deref(),
            Some("directoryOperation") | Some("dSAOperation") | Some("distributedOperation")
        );
        let at = AttributeType {
            oid: desc.oid.clone(),
            names: desc.names.clone(),
            sup: sup.as_ref().map(|s| s.oid.clone()),
            equality,
            ordering,
            substr,
            syntax,
            single_value: desc.single_value,
            no_user_modification: desc.no_user_modification,
            operational,
            subtypes: Vec::new(),
            definition: desc,
        };
        let idx = self.attribute_types.len();
        let oid = at.oid.clone();
        let names = at.names.clone();
        let sup_oid = at.sup.clone();
        self.attribute_types.push(at);
        self.register(&oid, ElementRef::AttributeType(idx))?;
        for name in names {
            self.register(&name, ElementRef::AttributeType(idx))?;
        }
        if let Some(sup_oid) = sup_oid {
            if let Some(ElementRef::AttributeType(parent)) =
                self.index.get(&sup_oid.to_ascii_lowercase()).copied()
            {
                self.attribute_types[parent].subtypes.push(oid);
            }
        }
        Ok(())
    }

    fn resolve_object_classes(
        &mut self,
        descs: Vec<ObjectClassDescription>,
    ) -> Result<(), SchemaError> {
        let mut pending: Vec<ObjectClassDescription> = Vec::new();
        for desc in descs {
            if let Some(existing) = self.object_class(&desc.oid) {
                if existing.definition == desc {
                    continue;
                }
                return Err(SchemaError::Conflict(desc.oid));
            }
            if let Some(prior) = pending.iter().find(|d| d.oid == desc.oid) {
                if *prior == desc {
                    continue;
                }
                return Err(SchemaError::Conflict(desc.oid));
            }
            pending.push(desc);
        }

        while !pending.is_empty() {
            let mut progressed = false;
            let mut still_pending = Vec::new();
            for desc in pending {
                let mut sup = Vec::new();
                let mut missing_sup = false;
                for name in &desc.sup {
                    match self.object_class(name) {
                        Some(oc) => sup.push(oc.oid.clone()),
                        None => {
                            missing_sup = true;
                            break;
                        }
                    }
                }
                if missing_sup {
                    still_pending.push(desc);
                    continue;
                }
                let resolve_attrs = |schema: &Schema,
                                     names: &[String]|
                 -> Result<Vec<String>, SchemaError> {
                    names
                        .iter()
                        .map(|n| {
                            schema
                                .attribute_type(n)
                                .map(|a| a.oid.clone())
                                .ok_or_else(|| SchemaError::UnknownReference(n.clone()))
                        })
                        .collect()
                };
                let must = resolve_attrs(self, &desc.must)?;
                let may = resolve_attrs(self, &desc.may)?;
                let oc = ObjectClass {
                    oid: desc.oid.clone(),
                    names: desc.names.clone(),
                    sup,
                    kind: desc.kind,
                    must,
                    may,
                    definition: desc,
                };
                let idx = self.object_classes.len();
                let oid = oc.oid.clone();
                let names = oc.names.clone();
                self.object_classes.push(oc);
                self.register(&oid, ElementRef::ObjectClass(idx))?;
                for name in names {
                    self.register(&name, ElementRef::ObjectClass(idx))?;
                }
                progressed = true;
            }
            if !progressed {
                let missing: Vec<String> =
                    still_pending.iter().map(|d| d.oid.clone()).collect();
                return Err(SchemaError::Unresolvable(missing.join(", ")));
            }
            pending = still_pending;
        }
        Ok(())
    }

    fn lookup(&self, key: &str) -> Option<ElementRef> {
        self.index.get(&key.to_ascii_lowercase()).copied()
    }

    /// The number of registered elements.
    pub fn len(&self) -> usize {
        self.syntaxes.len()
            + self.matching_rules.len()
            + self.attribute_types.len()
            + self.object_classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn syntaxes(&self) -> &[Syntax] {
        &self.syntaxes
    }

    pub fn matching_rules(&self) -> &[MatchingRule] {
        &self.matching_rules
    }

    pub fn attribute_types(&self) -> &[AttributeType] {
        &self.attribute_types
    }

    pub fn object_classes(&self) -> &[ObjectClass] {
        &self.object_classes
    }

    pub fn syntax(&self, key: &str) -> Option<&Syntax> {
        match self.lookup(key)? {
            ElementRef::Syntax(i) => self.syntaxes.get(i),
            _ => None,
        }
    }

    pub fn matching_rule(&self, key: &str) -> Option<&MatchingRule> {
        match self.lookup(key)? {
            ElementRef::MatchingRule(i) => self.matching_rules.get(i),
            _ => None,
        }
    }

    pub fn attribute_type(&self, key: &str) -> Option<&AttributeType> {
        // attribute options (e.g. ";binary") are ignored
        let key = key.split(';').next().unwrap_or(key);
        match self.lookup(key)? {
            ElementRef::AttributeType(i) => self.attribute_types.get(i),
            _ => None,
        }
    }

    pub fn object_class(&self, key: &str) -> Option<&ObjectClass> {
        match self.lookup(key)? {
            ElementRef::ObjectClass(i) => self.object_classes.get(i),
            _ => None,
        }
    }

    /// Resolve any element name to its canonical numeric OID.
    pub fn numeric_oid(&self, key: &str) -> Option<&str> {
        match self.lookup(key)? {
            ElementRef::Syntax(i) => self.syntaxes.get(i).map(|s| s.oid.as_ref()),
            ElementRef::MatchingRule(i) => self.matching_rules.get(i).map(|r| r.oid.as_ref()),
            ElementRef::AttributeType(i) => self.attribute_types.get(i).map(|a| a.oid.as_str()),
            ElementRef::ObjectClass(i) => self.object_classes.get(i).map(|o| o.oid.as_str()),
        }
    }

    /// The attribute type plus all its transitive subtypes.
    pub fn with_subtypes<'s>(&'s self, at: &'s AttributeType) -> Vec<&'s AttributeType> {
        let mut out = vec![at];
        let mut queue: Vec<&str> = at.subtypes.iter().map(String::as_str).collect();
        while let Some(oid) = queue.pop() {
            if let Some(sub) = self.attribute_type(oid) {
                out.push(sub);
                queue.extend(sub.subtypes.iter().map(String::as_str));
            }
        }
        out
    }

    /// Whether `child` equals `ancestor` or descends from it via SUP.
    pub fn is_subtype(&self, child: &AttributeType, ancestor: &AttributeType) -> bool {
        let mut current = Some(child);
        while let Some(at) = current {
            if at.oid == ancestor.oid {
                return true;
            }
            current = at.sup.as_deref().and_then(|o| self.attribute_type(o));
        }
        false
    }

    /// `ldapSyntaxes` values for subschema publication.
    pub fn syntax_definitions(&self) -> Vec<String> {
        self.syntaxes.iter().map(|s| s.to_string()).collect()
    }

    /// `matchingRules` values for subschema publication.
    pub fn matching_rule_definitions(&self) -> Vec<String> {
        self.matching_rules.iter().map(|r| r.to_string()).collect()
    }

    /// `attributeTypes` values for subschema publication.
    pub fn attribute_type_definitions(&self) -> Vec<String> {
        self.attribute_types
            .iter()
            .map(|a| a.definition.to_string())
            .collect()
    }

    /// `objectClasses` values for subschema publication.
    pub fn object_class_definitions(&self) -> Vec<String> {
        self.object_classes
            .iter()
            .map(|o| o.definition.to_string())
            .collect()
    }

    /// `matchingRuleUse` values: every rule referenced by at least one
    /// attribute type, with the types it applies to.
    pub fn matching_rule_use_definitions(&self) -> Vec<String> {
        let mut out = Vec::new();
        for rule in &self.matching_rules {
            let applies: Vec<&str> = self
                .attribute_types
                .iter()
                .filter(|a| {
                    [&a.equality, &a.ordering, &a.substr]
                        .iter()
                        .any(|r| r.as_deref() == Some(rule.oid.as_ref()))
                })
                .map(|a| a.name())
                .collect();
            if applies.is_empty() {
                continue;
            }
            let applies = if applies.len() == 1 {
                applies[0].to_string()
            } else {
                format!("( {} )", applies.join(" $ "))
            };
            out.push(format!(
                "( {} NAME '{}' APPLIES {} )",
                rule.oid,
                rule.name(),
                applies
            ));
        }
        out
    }
}

impl BitOr<&Schema> for &Schema {
    type Output = Result<Schema, SchemaError>;

    fn bitor(self, rhs: &Schema) -> Self::Output {
        self.merge(rhs)
    }
}
