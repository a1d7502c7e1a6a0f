use std::borrow::Cow;

use encoding_rs::Encoding;
use xhtmlchardet::detect;

use crate::error::ParseError;

pub(crate) fn sniff(data: &[u8]) -> Option<&'static Encoding> {
    if let Some((encoding, _)) = Encoding::for_bom(data) {
        return Some(encoding);
    }
    let mut cursor = std::io::Cursor::new(data);
    let charsets = detect(&mut cursor, None).ok()?;
    // no encoding detected
    let label = if charsets.is_empty() {
        "UTF-8"
    } else {
        &charsets[0]
    };
    Encoding::for_label(label.as_bytes())
}

/// Decode raw bytes into text.
///
/// With a declared `label` that encoding is used as is. Without one we honour
/// a byte-order mark, then the XML declaration, then fall back to UTF-8.
pub(crate) fn decode<'a>(data: &'a [u8], label: Option<&str>) -> Result<Cow<'a, str>, ParseError> {
    let encoding = match label {
        Some(label) => Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| ParseError::UnknownEncoding(label.to_string()))?,
        None => sniff(data).unwrap_or(encoding_rs::UTF_8),
    };
    let data = match Encoding::for_bom(data) {
        Some((bom_encoding, bom_length)) if bom_encoding == encoding => &data[bom_length..],
        _ => data,
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(data)
        .ok_or(ParseError::Decode(encoding.name()))
}
