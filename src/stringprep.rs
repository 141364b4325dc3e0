//! RFC 4518 string preparation
//!
//! Every string comparison in the schema goes through [`prepare`] first:
//! transcode, map, NFKC-normalize, reject prohibited code points, then apply
//! the insignificant-character handling of RFC 4518 section 2.6. The variants
//! differ per matching rule family ([`MatchingType`]) and per substring
//! position ([`SubstringType`]).

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// The matching rule family a string is being prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingType {
    ExactString,
    CaseIgnoreString,
    NumericString,
    TelephoneNumber,
    CaseIgnoreList,
}

impl MatchingType {
    fn case_fold(self) -> bool {
        // characters are case folded for case ignore, numeric and telephone
        // number rules (RFC4518 section 2.4)
        !matches!(self, MatchingType::ExactString)
    }
}

/// The position of a substring assertion piece, `None` for whole values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstringType {
    None,
    Initial,
    Any,
    Final,
}

/// A code point prohibited by RFC 3454 appeared in the input.
///
/// Callers surface this as `invalidAttributeSyntax`; a prohibited code point
/// in a *stored* value makes that value unmatchable but never aborts matching
/// over the remaining values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("prohibited code point U+{0:04X}")]
pub struct ProhibitedCharacter(pub u32);

/// Run the full RFC 4518 preparation pipeline over `input`.
pub fn prepare(
    input: &str,
    matching: MatchingType,
    substring: SubstringType,
) -> Result<String, ProhibitedCharacter> {
    let mapped = map_characters(input, matching.case_fold());
    let normalized: String = mapped.nfkc().collect();
    check_prohibited(&normalized)?;
    Ok(match matching {
        MatchingType::NumericString => strip_insignificant(&normalized, false),
        MatchingType::TelephoneNumber => strip_insignificant(&normalized, true),
        _ => space_normalize(&normalized, substring),
    })
}

fn is_mapped_to_nothing(c: char) -> bool {
    matches!(c,
        '\u{00AD}' | '\u{1806}' | '\u{034F}' | '\u{180B}'..='\u{180D}'
        | '\u{FE00}'..='\u{FE0F}' | '\u{FFFC}' | '\u{200B}'
        // other control code points or code points with a control function
        | '\u{0000}'..='\u{0008}' | '\u{000E}'..='\u{001F}' | '\u{007F}'..='\u{0084}'
        | '\u{0086}'..='\u{009F}' | '\u{06DD}' | '\u{070F}' | '\u{180E}'
        | '\u{200C}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2063}'
        | '\u{206A}'..='\u{206F}' | '\u{FEFF}' | '\u{FFF9}'..='\u{FFFB}'
        | '\u{1D173}'..='\u{1D17A}' | '\u{E0001}' | '\u{E0020}'..='\u{E007F}')
}

fn is_mapped_to_space(c: char) -> bool {
    matches!(c,
        // TAB, LF, VT, FF, CR and NEL are mapped to SPACE
        '\u{0009}'..='\u{000D}' | '\u{0085}'
        // all other separator code points (Zs, Zl, Zp)
        | '\u{00A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{2028}' | '\u{2029}'
        | '\u{202F}' | '\u{205F}' | '\u{3000}')
}

fn map_characters(input: &str, case_fold: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if is_mapped_to_nothing(c) {
            continue;
        }
        if is_mapped_to_space(c) {
            out.push(' ');
            continue;
        }
        if case_fold {
            for folded in c.to_lowercase() {
                out.push(folded);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn is_prohibited(c: char) -> bool {
    matches!(c,
        '\u{FFFD}'
        // private use
        | '\u{E000}'..='\u{F8FF}' | '\u{F0000}'..='\u{FFFFD}' | '\u{100000}'..='\u{10FFFD}'
        // non-characters
        | '\u{FDD0}'..='\u{FDEF}')
        || (c as u32 & 0xFFFE) == 0xFFFE
}

fn check_prohibited(input: &str) -> Result<(), ProhibitedCharacter> {
    for c in input.chars() {
        if is_prohibited(c) {
            return Err(ProhibitedCharacter(c as u32));
        }
    }
    Ok(())
}

// A SPACE immediately followed by a combining mark is not an insignificant
// space (RFC4518 section 2.6.1); it stays glued to the surrounding text.
fn space_positions(chars: &[char]) -> Vec<bool> {
    let mut spaces = vec![false; chars.len()];
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let followed_by_mark = chars.get(i + 1).map_or(false, |&n| is_combining_mark(n));
            spaces[i] = !followed_by_mark;
        }
    }
    spaces
}

/// Insignificant space handling for string matching rules.
///
/// Inner runs of spaces collapse to exactly two spaces. Whole values are
/// wrapped with one leading and one trailing space; substring pieces keep a
/// boundary space only where the piece is anchored (initial start, final end)
/// or where the original input had one.
fn space_normalize(input: &str, substring: SubstringType) -> String {
    let chars: Vec<char> = input.chars().collect();
    let spaces = space_positions(&chars);

    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if spaces[i] {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    if segments.is_empty() {
        return " ".to_string();
    }

    let had_leading = spaces.first().copied().unwrap_or(false);
    let had_trailing = spaces.last().copied().unwrap_or(false);
    let leading = match substring {
        SubstringType::None | SubstringType::Initial => true,
        SubstringType::Any | SubstringType::Final => had_leading,
    };
    let trailing = match substring {
        SubstringType::None | SubstringType::Final => true,
        SubstringType::Any | SubstringType::Initial => had_trailing,
    };

    let mut out = String::new();
    if leading {
        out.push(' ');
    }
    out.push_str(&segments.join("  "));
    if trailing {
        out.push(' ');
    }
    out
}

/// NUMERIC_STRING and TELEPHONE_NUMBER drop every space (and, for telephone
/// numbers, every hyphen).
fn strip_insignificant(input: &str, strip_hyphens: bool) -> String {
    let chars: Vec<char> = input.chars().collect();
    let spaces = space_positions(&chars);
    let mut out = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        if spaces[i] {
            continue;
        }
        if strip_hyphens
            && matches!(
                c,
                '\u{002D}' | '\u{058A}' | '\u{2010}' | '\u{2011}' | '\u{2212}' | '\u{FE63}'
                    | '\u{FF0D}'
            )
        {
            continue;
        }
        out.push(c);
    }
    out
}
