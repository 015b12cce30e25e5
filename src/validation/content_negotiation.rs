//! MIME media-type parsing and wildcard-aware compatibility.
//!
//! Parameters (`charset`, `q`, ...) are parsed but never take part in compatibility.

/// A normalized media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub type_: String,
    pub subtype: String,
    pub params: Vec<(String, String)>,
}

impl MediaType {
    fn is_exactly(&self, other: &MediaType) -> bool {
        self.type_ == other.type_ && self.subtype == other.subtype
    }
}

/// Splits on `;`, lowercases type and subtype and trims whitespace.
pub fn normalize_media_type(raw: &str) -> MediaType {
    let mut parts = raw.split(';');
    let essence = parts.next().unwrap_or("").trim().to_ascii_lowercase();
    let (type_, subtype) = match essence.split_once('/') {
        Some((t, s)) => (t.trim().to_string(), s.trim().to_string()),
        None if essence == "*" => ("*".to_string(), "*".to_string()),
        None => (essence.clone(), String::new()),
    };
    let params = parts
        .filter_map(|p| {
            let (name, value) = p.split_once('=')?;
            Some((
                name.trim().to_ascii_lowercase(),
                value.trim().trim_matches('"').to_string(),
            ))
        })
        .collect();
    MediaType {
        type_,
        subtype,
        params,
    }
}

/// True when type and subtype match literally or either side uses a `*` wildcard.
pub fn are_compatible(a: &str, b: &str) -> bool {
    media_types_compatible(&normalize_media_type(a), &normalize_media_type(b))
}

fn media_types_compatible(a: &MediaType, b: &MediaType) -> bool {
    let type_matches = a.type_ == b.type_ || a.type_ == "*" || b.type_ == "*";
    let subtype_matches = a.subtype == b.subtype || a.subtype == "*" || b.subtype == "*";
    type_matches && subtype_matches
}

/// The declared media type nearest to `actual`: an exact type/subtype match first, then the
/// first wildcard-compatible one, in declaration order.
pub fn find_matching_media_type<'a>(actual: &str, declared: &[&'a str]) -> Option<&'a str> {
    let actual = normalize_media_type(actual);
    let normalized: Vec<(MediaType, &'a str)> = declared
        .iter()
        .map(|d| (normalize_media_type(d), *d))
        .collect();

    normalized
        .iter()
        .find(|(candidate, _)| candidate.is_exactly(&actual))
        .or_else(|| {
            normalized
                .iter()
                .find(|(candidate, _)| media_types_compatible(candidate, &actual))
        })
        .map(|(_, raw)| *raw)
}

/// True when `actual` is compatible with at least one declared media type.
pub fn is_declared<S: AsRef<str>>(actual: &str, declared: &[S]) -> bool {
    let actual = normalize_media_type(actual);
    declared
        .iter()
        .any(|d| media_types_compatible(&normalize_media_type(d.as_ref()), &actual))
}

/// Media ranges listed in an `Accept` header.
pub fn parse_accept(header: &str) -> Vec<&str> {
    header
        .split(',')
        .map(str::trim)
        .filter(|range| !range.is_empty())
        .collect()
}

/// True when any media range of an `Accept` header is compatible with a declared type.
pub fn accept_matches<S: AsRef<str>>(accept_header: &str, declared: &[S]) -> bool {
    parse_accept(accept_header)
        .into_iter()
        .any(|range| is_declared(range, declared))
}

/// `application/json` and structured-syntax `+json` types.
pub fn is_json_media_type(raw: &str) -> bool {
    let media_type = normalize_media_type(raw);
    media_type.subtype == "json" || media_type.subtype.ends_with("+json")
}
