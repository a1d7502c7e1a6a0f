use std::borrow::Cow;

use crate::error::ParseError;

/// Expand predefined entities and character references.
///
/// Returns the input slice untouched if it contains no `&`.
pub(crate) fn parse_entities(content: &str) -> Result<Cow<str>, ParseError> {
    if !content.contains('&') {
        return Ok(Cow::Borrowed(content));
    }
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '&' {
            result.push(c);
            continue;
        }
        let mut entity = String::new();
        let mut is_complete = false;
        for c in chars.by_ref() {
            if c == ';' {
                is_complete = true;
                break;
            }
            entity.push(c);
        }
        if !is_complete {
            return Err(ParseError::UnclosedEntity(entity));
        }
        match entity.as_str() {
            "amp" => result.push('&'),
            "apos" => result.push('\''),
            "gt" => result.push('>'),
            "lt" => result.push('<'),
            "quot" => result.push('"'),
            _ if entity.starts_with('#') => result.push(parse_char_reference(&entity)?),
            _ => return Err(ParseError::InvalidEntity(entity)),
        }
    }
    Ok(Cow::Owned(result))
}

fn parse_char_reference(entity: &str) -> Result<char, ParseError> {
    let invalid = || ParseError::InvalidCharacterReference(entity.to_string());
    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).map_err(|_| invalid())?
    } else {
        entity[1..].parse::<u32>().map_err(|_| invalid())?
    };
    let c = char::from_u32(code).ok_or_else(invalid)?;
    if is_xml_char(c) {
        Ok(c)
    } else {
        Err(invalid())
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Attribute value normalization: literal tab, CR and LF become a space.
///
/// Must run before entity expansion so `&#10;` survives.
pub(crate) fn normalize_attribute(value: &str) -> Cow<str> {
    if !value.contains(['\t', '\r', '\n']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace("\r\n", " ").replace(['\t', '\r', '\n'], " "))
}
