//! The built-in RFC 4519 schema
//!
//! Syntaxes and matching rules from RFC 4517, the attribute types and object
//! classes of RFC 4519, the operational attributes of RFC 4512 and the
//! `subschema` object class. Built once, shared through an `Arc`.

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use crate::schema::matching::{MatchingRule, MatchingRuleKind};
use crate::schema::oids::syntax as syn;
use crate::schema::syntax::{Syntax, SyntaxKind};
use crate::schema::Schema;
use crate::stringprep::MatchingType;

fn syntax(oid: &'static str, desc: &'static str, kind: SyntaxKind) -> Syntax {
    Syntax {
        oid: Cow::Borrowed(oid),
        desc: Cow::Borrowed(desc),
        kind,
    }
}

pub(crate) fn core_syntaxes() -> Vec<Syntax> {
    vec![
        syntax(syn::ATTRIBUTE_TYPE_DESCRIPTION, "Attribute Type Description", SyntaxKind::SchemaElement),
        syntax(syn::BIT_STRING, "Bit String", SyntaxKind::BitString),
        syntax(syn::BOOLEAN, "Boolean", SyntaxKind::Boolean),
        syntax(syn::COUNTRY_STRING, "Country String", SyntaxKind::CountryString),
        syntax(syn::DN, "DN", SyntaxKind::Dn),
        syntax(syn::DELIVERY_METHOD, "Delivery Method", SyntaxKind::DirectoryString),
        syntax(syn::DIRECTORY_STRING, "Directory String", SyntaxKind::DirectoryString),
        syntax(syn::DIT_CONTENT_RULE_DESCRIPTION, "DIT Content Rule Description", SyntaxKind::SchemaElement),
        syntax(syn::DIT_STRUCTURE_RULE_DESCRIPTION, "DIT Structure Rule Description", SyntaxKind::SchemaElement),
        syntax(syn::ENHANCED_GUIDE, "Enhanced Guide", SyntaxKind::DirectoryString),
        syntax(syn::FACSIMILE_TELEPHONE_NUMBER, "Facsimile Telephone Number", SyntaxKind::FacsimileTelephoneNumber),
        syntax(syn::GENERALIZED_TIME, "Generalized Time", SyntaxKind::GeneralizedTime),
        syntax(syn::GUIDE, "Guide", SyntaxKind::DirectoryString),
        syntax(syn::IA5_STRING, "IA5 String", SyntaxKind::Ia5String),
        syntax(syn::INTEGER, "INTEGER", SyntaxKind::Integer),
        syntax(syn::MATCHING_RULE_DESCRIPTION, "Matching Rule Description", SyntaxKind::SchemaElement),
        syntax(syn::MATCHING_RULE_USE_DESCRIPTION, "Matching Rule Use Description", SyntaxKind::SchemaElement),
        syntax(syn::NAME_AND_OPTIONAL_UID, "Name And Optional UID", SyntaxKind::NameAndOptionalUid),
        syntax(syn::NAME_FORM_DESCRIPTION, "Name Form Description", SyntaxKind::SchemaElement),
        syntax(syn::NUMERIC_STRING, "Numeric String", SyntaxKind::NumericString),
        syntax(syn::OBJECT_CLASS_DESCRIPTION, "Object Class Description", SyntaxKind::SchemaElement),
        syntax(syn::OID, "OID", SyntaxKind::Oid),
        syntax(syn::OCTET_STRING, "Octet String", SyntaxKind::OctetString),
        syntax(syn::POSTAL_ADDRESS, "Postal Address", SyntaxKind::PostalAddress),
        syntax(syn::PRINTABLE_STRING, "Printable String", SyntaxKind::PrintableString),
        syntax(syn::TELEPHONE_NUMBER, "Telephone Number", SyntaxKind::TelephoneNumber),
        syntax(syn::TELETEX_TERMINAL_IDENTIFIER, "Teletex Terminal Identifier", SyntaxKind::DirectoryString),
        syntax(syn::TELEX_NUMBER, "Telex Number", SyntaxKind::TelexNumber),
        syntax(syn::UTC_TIME, "UTC Time", SyntaxKind::UtcTime),
        syntax(syn::LDAP_SYNTAX_DESCRIPTION, "LDAP Syntax Description", SyntaxKind::SchemaElement),
        syntax(syn::SUBSTRING_ASSERTION, "Substring Assertion", SyntaxKind::SubstringAssertion),
    ]
}

/// Syntaxes the RFC 4518 string preparation families apply to.
const STRING_SYNTAXES: &[&str] = &[
    syn::DIRECTORY_STRING,
    syn::IA5_STRING,
    syn::PRINTABLE_STRING,
    syn::TELEPHONE_NUMBER,
    syn::NUMERIC_STRING,
    syn::COUNTRY_STRING,
    syn::TELEX_NUMBER,
    syn::FACSIMILE_TELEPHONE_NUMBER,
];

const SCHEMA_ELEMENT_SYNTAXES: &[&str] = &[
    syn::ATTRIBUTE_TYPE_DESCRIPTION,
    syn::DIT_CONTENT_RULE_DESCRIPTION,
    syn::MATCHING_RULE_DESCRIPTION,
    syn::MATCHING_RULE_USE_DESCRIPTION,
    syn::NAME_FORM_DESCRIPTION,
    syn::OBJECT_CLASS_DESCRIPTION,
    syn::LDAP_SYNTAX_DESCRIPTION,
    syn::OID,
];

fn rule(
    oid: &'static str,
    names: &'static [&'static str],
    syntax: &'static str,
    compatible_syntaxes: &'static [&'static str],
    kind: MatchingRuleKind,
) -> MatchingRule {
    MatchingRule {
        oid: Cow::Borrowed(oid),
        names,
        syntax: Cow::Borrowed(syntax),
        compatible_syntaxes,
        kind,
    }
}

pub(crate) fn core_matching_rules() -> Vec<MatchingRule> {
    use MatchingRuleKind::*;
    use MatchingType::*;
    vec![
        rule("2.5.13.0", &["objectIdentifierMatch"], syn::OID, &[syn::OID], OidEquality),
        rule("2.5.13.1", &["distinguishedNameMatch"], syn::DN, &[syn::DN], ValueEquality),
        rule("2.5.13.2", &["caseIgnoreMatch"], syn::DIRECTORY_STRING, STRING_SYNTAXES, StringEquality(CaseIgnoreString)),
        rule("2.5.13.3", &["caseIgnoreOrderingMatch"], syn::DIRECTORY_STRING, STRING_SYNTAXES, StringOrdering(CaseIgnoreString)),
        rule("2.5.13.4", &["caseIgnoreSubstringsMatch"], syn::SUBSTRING_ASSERTION, STRING_SYNTAXES, StringSubstrings(CaseIgnoreString)),
        rule("2.5.13.5", &["caseExactMatch"], syn::DIRECTORY_STRING, STRING_SYNTAXES, StringEquality(ExactString)),
        rule("2.5.13.6", &["caseExactOrderingMatch"], syn::DIRECTORY_STRING, STRING_SYNTAXES, StringOrdering(ExactString)),
        rule("2.5.13.7", &["caseExactSubstringsMatch"], syn::SUBSTRING_ASSERTION, STRING_SYNTAXES, StringSubstrings(ExactString)),
        rule("2.5.13.8", &["numericStringMatch"], syn::NUMERIC_STRING, &[syn::NUMERIC_STRING], StringEquality(NumericString)),
        rule("2.5.13.9", &["numericStringOrderingMatch"], syn::NUMERIC_STRING, &[syn::NUMERIC_STRING], StringOrdering(NumericString)),
        rule("2.5.13.10", &["numericStringSubstringsMatch"], syn::SUBSTRING_ASSERTION, &[syn::NUMERIC_STRING], StringSubstrings(NumericString)),
        rule("2.5.13.11", &["caseIgnoreListMatch"], syn::POSTAL_ADDRESS, &[syn::POSTAL_ADDRESS], ListEquality(CaseIgnoreList)),
        rule("2.5.13.12", &["caseIgnoreListSubstringsMatch"], syn::SUBSTRING_ASSERTION, &[syn::POSTAL_ADDRESS], ListSubstrings(CaseIgnoreList)),
        rule("2.5.13.13", &["booleanMatch"], syn::BOOLEAN, &[syn::BOOLEAN], ValueEquality),
        rule("2.5.13.14", &["integerMatch"], syn::INTEGER, &[syn::INTEGER], ValueEquality),
        rule("2.5.13.15", &["integerOrderingMatch"], syn::INTEGER, &[syn::INTEGER], ValueOrdering),
        rule("2.5.13.16", &["bitStringMatch"], syn::BIT_STRING, &[syn::BIT_STRING], ValueEquality),
        rule("2.5.13.17", &["octetStringMatch"], syn::OCTET_STRING, &[syn::OCTET_STRING], ValueEquality),
        rule("2.5.13.18", &["octetStringOrderingMatch"], syn::OCTET_STRING, &[syn::OCTET_STRING], ValueOrdering),
        rule("2.5.13.20", &["telephoneNumberMatch"], syn::TELEPHONE_NUMBER, &[syn::TELEPHONE_NUMBER], StringEquality(TelephoneNumber)),
        rule("2.5.13.21", &["telephoneNumberSubstringsMatch"], syn::SUBSTRING_ASSERTION, &[syn::TELEPHONE_NUMBER], StringSubstrings(TelephoneNumber)),
        rule("2.5.13.23", &["uniqueMemberMatch"], syn::NAME_AND_OPTIONAL_UID, &[syn::NAME_AND_OPTIONAL_UID], ValueEquality),
        rule("2.5.13.27", &["generalizedTimeMatch"], syn::GENERALIZED_TIME, &[syn::GENERALIZED_TIME, syn::UTC_TIME], ValueEquality),
        rule("2.5.13.28", &["generalizedTimeOrderingMatch"], syn::GENERALIZED_TIME, &[syn::GENERALIZED_TIME, syn::UTC_TIME], ValueOrdering),
        rule("2.5.13.29", &["integerFirstComponentMatch"], syn::INTEGER, &[syn::INTEGER, syn::DIT_STRUCTURE_RULE_DESCRIPTION], FirstComponentInteger),
        rule("2.5.13.30", &["objectIdentifierFirstComponentMatch"], syn::OID, SCHEMA_ELEMENT_SYNTAXES, FirstComponentOid),
        rule("1.3.6.1.4.1.1466.109.114.1", &["caseExactIA5Match"], syn::IA5_STRING, STRING_SYNTAXES, StringEquality(ExactString)),
        rule("1.3.6.1.4.1.1466.109.114.2", &["caseIgnoreIA5Match"], syn::IA5_STRING, STRING_SYNTAXES, StringEquality(CaseIgnoreString)),
        rule("1.3.6.1.4.1.1466.109.114.3", &["caseIgnoreIA5SubstringsMatch"], syn::SUBSTRING_ASSERTION, &[syn::IA5_STRING], StringSubstrings(CaseIgnoreString)),
    ]
}

const ATTRIBUTE_TYPES: &[&str] = &[
    // RFC 4512 / 4519 user attribute types
    "( 2.5.4.0 NAME 'objectClass' EQUALITY objectIdentifierMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.38 )",
    "( 2.5.4.1 NAME 'aliasedObjectName' EQUALITY distinguishedNameMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 SINGLE-VALUE )",
    "( 2.5.4.41 NAME 'name' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    "( 2.5.4.3 NAME ( 'cn' 'commonName' ) SUP name )",
    "( 2.5.4.4 NAME ( 'sn' 'surname' ) SUP name )",
    "( 2.5.4.5 NAME 'serialNumber' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.44 )",
    "( 2.5.4.6 NAME ( 'c' 'countryName' ) SUP name SYNTAX 1.3.6.1.4.1.1466.115.121.1.11 SINGLE-VALUE )",
    "( 2.5.4.7 NAME ( 'l' 'localityName' ) SUP name )",
    "( 2.5.4.8 NAME ( 'st' 'stateOrProvinceName' ) SUP name )",
    "( 2.5.4.9 NAME ( 'street' 'streetAddress' ) EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    "( 2.5.4.10 NAME ( 'o' 'organizationName' ) SUP name )",
    "( 2.5.4.11 NAME ( 'ou' 'organizationalUnitName' ) SUP name )",
    "( 2.5.4.12 NAME 'title' SUP name )",
    "( 2.5.4.13 NAME 'description' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    "( 2.5.4.14 NAME 'searchGuide' SYNTAX 1.3.6.1.4.1.1466.115.121.1.25 )",
    "( 2.5.4.15 NAME 'businessCategory' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    "( 2.5.4.16 NAME 'postalAddress' EQUALITY caseIgnoreListMatch SUBSTR caseIgnoreListSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.41 )",
    "( 2.5.4.17 NAME 'postalCode' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    "( 2.5.4.18 NAME 'postOfficeBox' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    "( 2.5.4.19 NAME 'physicalDeliveryOfficeName' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    "( 2.5.4.20 NAME 'telephoneNumber' EQUALITY telephoneNumberMatch SUBSTR telephoneNumberSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.50 )",
    "( 2.5.4.21 NAME 'telexNumber' SYNTAX 1.3.6.1.4.1.1466.115.121.1.52 )",
    "( 2.5.4.23 NAME ( 'facsimileTelephoneNumber' 'fax' ) SYNTAX 1.3.6.1.4.1.1466.115.121.1.22 )",
    "( 2.5.4.24 NAME 'x121Address' EQUALITY numericStringMatch SUBSTR numericStringSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.36 )",
    "( 2.5.4.25 NAME 'internationalISDNNumber' EQUALITY numericStringMatch SUBSTR numericStringSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.36 )",
    "( 2.5.4.26 NAME 'registeredAddress' SUP postalAddress SYNTAX 1.3.6.1.4.1.1466.115.121.1.41 )",
    "( 2.5.4.27 NAME 'destinationIndicator' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.44 )",
    "( 2.5.4.28 NAME 'preferredDeliveryMethod' SYNTAX 1.3.6.1.4.1.1466.115.121.1.14 SINGLE-VALUE )",
    "( 2.5.4.31 NAME 'member' SUP distinguishedName )",
    "( 2.5.4.32 NAME 'owner' SUP distinguishedName )",
    "( 2.5.4.33 NAME 'roleOccupant' SUP distinguishedName )",
    "( 2.5.4.34 NAME 'seeAlso' SUP distinguishedName )",
    "( 2.5.4.35 NAME 'userPassword' EQUALITY octetStringMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.40 )",
    "( 2.5.4.40 NAME 'teletexTerminalIdentifier' SYNTAX 1.3.6.1.4.1.1466.115.121.1.51 )",
    "( 2.5.4.42 NAME ( 'givenName' 'gn' ) SUP name )",
    "( 2.5.4.43 NAME 'initials' SUP name )",
    "( 2.5.4.44 NAME 'generationQualifier' SUP name )",
    "( 2.5.4.45 NAME 'x500UniqueIdentifier' EQUALITY bitStringMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.6 )",
    "( 2.5.4.46 NAME 'dnQualifier' EQUALITY caseIgnoreMatch ORDERING caseIgnoreOrderingMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.44 )",
    "( 2.5.4.47 NAME 'enhancedSearchGuide' SYNTAX 1.3.6.1.4.1.1466.115.121.1.21 )",
    "( 2.5.4.49 NAME 'distinguishedName' EQUALITY distinguishedNameMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 )",
    "( 2.5.4.50 NAME 'uniqueMember' EQUALITY uniqueMemberMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.34 )",
    "( 2.5.4.51 NAME 'houseIdentifier' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    "( 0.9.2342.19200300.100.1.1 NAME ( 'uid' 'userid' ) EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    "( 0.9.2342.19200300.100.1.25 NAME ( 'dc' 'domainComponent' ) EQUALITY caseIgnoreIA5Match SUBSTR caseIgnoreIA5SubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.26 SINGLE-VALUE )",
    // RFC 4512 operational attribute types
    "( 2.5.18.1 NAME 'createTimestamp' EQUALITY generalizedTimeMatch ORDERING generalizedTimeOrderingMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.24 SINGLE-VALUE NO-USER-MODIFICATION USAGE directoryOperation )",
    "( 2.5.18.2 NAME 'modifyTimestamp' EQUALITY generalizedTimeMatch ORDERING generalizedTimeOrderingMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.24 SINGLE-VALUE NO-USER-MODIFICATION USAGE directoryOperation )",
    "( 2.5.18.3 NAME 'creatorsName' EQUALITY distinguishedNameMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 SINGLE-VALUE NO-USER-MODIFICATION USAGE directoryOperation )",
    "( 2.5.18.4 NAME 'modifiersName' EQUALITY distinguishedNameMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 SINGLE-VALUE NO-USER-MODIFICATION USAGE directoryOperation )",
    "( 2.5.18.10 NAME 'subschemaSubentry' EQUALITY distinguishedNameMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 SINGLE-VALUE NO-USER-MODIFICATION USAGE directoryOperation )",
    "( 2.5.21.1 NAME 'dITStructureRules' EQUALITY integerFirstComponentMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.17 USAGE directoryOperation )",
    "( 2.5.21.2 NAME 'dITContentRules' EQUALITY objectIdentifierFirstComponentMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.16 USAGE directoryOperation )",
    "( 2.5.21.4 NAME 'matchingRules' EQUALITY objectIdentifierFirstComponentMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.30 USAGE directoryOperation )",
    "( 2.5.21.5 NAME 'attributeTypes' EQUALITY objectIdentifierFirstComponentMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.3 USAGE directoryOperation )",
    "( 2.5.21.6 NAME 'objectClasses' EQUALITY objectIdentifierFirstComponentMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.37 USAGE directoryOperation )",
    "( 2.5.21.7 NAME 'nameForms' EQUALITY objectIdentifierFirstComponentMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.35 USAGE directoryOperation )",
    "( 2.5.21.8 NAME 'matchingRuleUse' EQUALITY objectIdentifierFirstComponentMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.31 USAGE directoryOperation )",
    "( 2.5.21.9 NAME 'structuralObjectClass' EQUALITY objectIdentifierMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.38 SINGLE-VALUE NO-USER-MODIFICATION USAGE directoryOperation )",
    "( 1.3.6.1.4.1.1466.101.120.16 NAME 'ldapSyntaxes' EQUALITY objectIdentifierFirstComponentMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.54 USAGE directoryOperation )",
    // root DSE attributes (RFC 4512 section 5.1)
    "( 1.3.6.1.4.1.1466.101.120.5 NAME 'namingContexts' SYNTAX 1.3.6.1.4.1.1466.115.121.1.12 USAGE dSAOperation )",
    "( 1.3.6.1.4.1.1466.101.120.6 NAME 'altServer' SYNTAX 1.3.6.1.4.1.1466.115.121.1.26 USAGE dSAOperation )",
    "( 1.3.6.1.4.1.1466.101.120.7 NAME 'supportedExtension' SYNTAX 1.3.6.1.4.1.1466.115.121.1.38 USAGE dSAOperation )",
    "( 1.3.6.1.4.1.1466.101.120.13 NAME 'supportedControl' SYNTAX 1.3.6.1.4.1.1466.115.121.1.38 USAGE dSAOperation )",
    "( 1.3.6.1.4.1.1466.101.120.14 NAME 'supportedSASLMechanisms' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 USAGE dSAOperation )",
    "( 1.3.6.1.4.1.1466.101.120.15 NAME 'supportedLDAPVersion' SYNTAX 1.3.6.1.4.1.1466.115.121.1.27 USAGE dSAOperation )",
    "( 1.3.6.1.4.1.4203.1.3.5 NAME 'supportedFeatures' EQUALITY objectIdentifierMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.38 USAGE dSAOperation )",
];

const OBJECT_CLASSES: &[&str] = &[
    "( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )",
    "( 2.5.6.1 NAME 'alias' SUP top STRUCTURAL MUST aliasedObjectName )",
    "( 2.5.6.2 NAME 'country' SUP top STRUCTURAL MUST c MAY ( searchGuide $ description ) )",
    "( 2.5.6.3 NAME 'locality' SUP top STRUCTURAL MAY ( street $ seeAlso $ searchGuide $ st $ l $ description ) )",
    "( 2.5.6.4 NAME 'organization' SUP top STRUCTURAL MUST o MAY ( userPassword $ searchGuide $ seeAlso $ businessCategory $ x121Address $ registeredAddress $ destinationIndicator $ preferredDeliveryMethod $ telexNumber $ teletexTerminalIdentifier $ telephoneNumber $ internationalISDNNumber $ facsimileTelephoneNumber $ street $ postOfficeBox $ postalCode $ postalAddress $ physicalDeliveryOfficeName $ st $ l $ description ) )",
    "( 2.5.6.5 NAME 'organizationalUnit' SUP top STRUCTURAL MUST ou MAY ( businessCategory $ description $ destinationIndicator $ facsimileTelephoneNumber $ internationalISDNNumber $ l $ physicalDeliveryOfficeName $ postalAddress $ postalCode $ postOfficeBox $ preferredDeliveryMethod $ registeredAddress $ searchGuide $ seeAlso $ st $ street $ telephoneNumber $ teletexTerminalIdentifier $ telexNumber $ userPassword $ x121Address ) )",
    "( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( sn $ cn ) MAY ( userPassword $ telephoneNumber $ seeAlso $ description ) )",
    "( 2.5.6.7 NAME 'organizationalPerson' SUP person STRUCTURAL MAY ( title $ x121Address $ registeredAddress $ destinationIndicator $ preferredDeliveryMethod $ telexNumber $ teletexTerminalIdentifier $ telephoneNumber $ internationalISDNNumber $ facsimileTelephoneNumber $ street $ postOfficeBox $ postalCode $ postalAddress $ physicalDeliveryOfficeName $ ou $ st $ l ) )",
    "( 2.5.6.8 NAME 'organizationalRole' SUP top STRUCTURAL MUST cn MAY ( x121Address $ registeredAddress $ destinationIndicator $ preferredDeliveryMethod $ telexNumber $ teletexTerminalIdentifier $ telephoneNumber $ internationalISDNNumber $ facsimileTelephoneNumber $ seeAlso $ roleOccupant $ street $ postOfficeBox $ postalCode $ postalAddress $ physicalDeliveryOfficeName $ ou $ st $ l $ description ) )",
    "( 2.5.6.9 NAME 'groupOfNames' SUP top STRUCTURAL MUST ( member $ cn ) MAY ( businessCategory $ seeAlso $ owner $ ou $ o $ description ) )",
    "( 2.5.6.11 NAME 'applicationProcess' SUP top STRUCTURAL MUST cn MAY ( seeAlso $ ou $ l $ description ) )",
    "( 2.5.6.14 NAME 'device' SUP top STRUCTURAL MUST cn MAY ( serialNumber $ seeAlso $ owner $ ou $ o $ l $ description ) )",
    "( 2.5.6.17 NAME 'groupOfUniqueNames' SUP top STRUCTURAL MUST ( uniqueMember $ cn ) MAY ( businessCategory $ seeAlso $ owner $ ou $ o $ description ) )",
    "( 2.5.20.1 NAME 'subschema' AUXILIARY MAY ( dITStructureRules $ nameForms $ dITContentRules $ objectClasses $ attributeTypes $ matchingRules $ matchingRuleUse ) )",
    "( 0.9.2342.19200300.100.4.13 NAME 'domain' SUP top STRUCTURAL MUST dc MAY ( o $ seeAlso $ l $ st $ description ) )",
    "( 1.3.6.1.4.1.1466.344 NAME 'dcObject' SUP top AUXILIARY MUST dc )",
    "( 1.3.6.1.4.1.1466.101.120.111 NAME 'extensibleObject' SUP top AUXILIARY )",
];

/// The shared RFC 4519 schema instance.
pub fn rfc4519() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            let schema = Schema::new(
                core_syntaxes(),
                core_matching_rules(),
                ATTRIBUTE_TYPES,
                OBJECT_CLASSES,
            )
            .expect("built-in RFC 4519 schema is well-formed");
            Arc::new(schema)
        })
        .clone()
}
