use precios_to_csv::{Channel, ReportFamily, output_key};

/// Decodes an object key as delivered in storage event notifications:
/// `+` stands for a space, the rest is percent-encoded. Keys that do not
/// decode to UTF-8 are kept with only the `+` substitution applied.
pub fn decode_object_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

pub fn is_pdf_key(key: &str) -> bool {
    key.rsplit_once('.')
        .is_some_and(|(_, extension)| extension.eq_ignore_ascii_case("pdf"))
}

/// Output object keys `family` may write for the source `key`, in channel
/// order.
pub fn output_keys(key: &str, family: ReportFamily) -> Vec<(Channel, String)> {
    family
        .channels()
        .iter()
        .map(|channel| (*channel, output_key(key, *channel)))
        .collect()
}

pub fn parse_flag(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    lowered == "true" || lowered == "1" || lowered == "yes"
}
