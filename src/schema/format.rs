//! Format-specific schema keywords.
//!
//! OpenAPI/Swagger `format` values such as `int32` or `double` are not JSON-Schema formats, and the
//! structural validator only applies formats to strings. [`adapt_format`] strips them from a schema
//! node and records a [`FORMAT_MARKER`] keyword instead; the marker is enforced by
//! [`crate::schema::SchemaValidator`] using the predicates in this module.
//!
//! Numeric predicates work on the exact decimal text of a value, never on a float approximation:
//! `is_int64("9223372036854775808")` is false even though it survives a trip through `f64`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Number, Value};
use std::borrow::Cow;

/// Internal keyword carrying a custom format for the format-marker checker.
pub const FORMAT_MARKER: &str = "x-mock-validator-format";

/// Formats the structural validator (draft 4) understands natively. Other string formats are
/// dropped from resolved schemas.
const STRUCTURAL_FORMATS: [&str; 6] = ["date-time", "email", "hostname", "ipv4", "ipv6", "uri"];

/// Significant digits a `float` value may carry.
const FLOAT_MAX_PRECISION: usize = 6;

/// Formats enforced through [`FORMAT_MARKER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomFormat {
    Int32,
    Int64,
    Float,
    Double,
    Byte,
}

impl CustomFormat {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Byte => "byte",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int32" => Some(Self::Int32),
            "int64" => Some(Self::Int64),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "byte" => Some(Self::Byte),
            _ => None,
        }
    }

    /// Whether the format constrains numbers (as opposed to strings)
    #[inline]
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Byte)
    }

    /// Checks a raw textual value (query/header values, or a number's literal text).
    pub fn check_text(&self, text: &str) -> bool {
        match self {
            Self::Int32 => is_int32(text),
            Self::Int64 => is_int64(text),
            Self::Float => is_float(text),
            Self::Double => is_double(text),
            Self::Byte => is_byte(text),
        }
    }

    /// Checks a JSON value. Values of a type the format does not apply to pass.
    pub fn check_value(&self, value: &Value) -> bool {
        match (self.is_numeric(), value) {
            (true, Value::Number(n)) => self.check_text(&n.to_string()),
            (false, Value::String(s)) => self.check_text(s),
            _ => true,
        }
    }

    fn applies_to(&self, types: &[&str]) -> bool {
        if types.is_empty() {
            return true;
        }
        let accepted: &[&str] = match self {
            Self::Int32 | Self::Int64 | Self::Float | Self::Double => &["integer", "number"],
            Self::Byte => &["string"],
        };
        types.iter().any(|t| accepted.contains(t))
    }
}

/// Rewrites the `format` keyword of a single schema node.
///
/// - `int32`/`int64`/`float`/`double` on numeric types and `byte` on strings become a
///   [`FORMAT_MARKER`] keyword.
/// - Formats the structural validator understands are kept.
/// - Every other format is removed.
pub fn adapt_format(node: &mut Map<String, Value>) {
    let format = match node.get("format") {
        Some(Value::String(f)) => f.clone(),
        Some(_) => {
            node.remove("format");
            return;
        }
        None => return,
    };

    let custom = {
        let types = declared_types(node);
        if STRUCTURAL_FORMATS.contains(&format.as_str())
            && (types.is_empty() || types.contains(&"string"))
        {
            return;
        }
        CustomFormat::from_name(&format).filter(|c| c.applies_to(&types))
    };

    node.remove("format");
    if let Some(custom) = custom {
        node.insert(
            FORMAT_MARKER.to_string(),
            Value::String(custom.name().to_string()),
        );
    }
}

fn declared_types(node: &Map<String, Value>) -> Vec<&str> {
    match node.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Anything that can be viewed as decimal text for the format predicates.
pub trait DecimalInput {
    fn decimal_text(&self) -> Option<Cow<'_, str>>;
}

impl DecimalInput for str {
    fn decimal_text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

impl DecimalInput for &str {
    fn decimal_text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

impl DecimalInput for String {
    fn decimal_text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_str()))
    }
}

impl DecimalInput for Number {
    fn decimal_text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.to_string()))
    }
}

impl DecimalInput for Value {
    fn decimal_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Number(n) => n.decimal_text(),
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            _ => None,
        }
    }
}

impl DecimalInput for &Value {
    fn decimal_text(&self) -> Option<Cow<'_, str>> {
        (*self).decimal_text()
    }
}

macro_rules! impl_decimal_input_for_primitive {
    ($($t:ty),*) => {
        $(impl DecimalInput for $t {
            fn decimal_text(&self) -> Option<Cow<'_, str>> {
                Some(Cow::Owned(self.to_string()))
            }
        })*
    };
}

impl_decimal_input_for_primitive!(i32, i64, i128, u32, u64, u128);

impl DecimalInput for f64 {
    fn decimal_text(&self) -> Option<Cow<'_, str>> {
        if self.is_finite() {
            Some(Cow::Owned(format!("{:e}", self)))
        } else {
            None
        }
    }
}

/// True iff the value is an integer within `[-2^31, 2^31-1]`.
pub fn is_int32<V: DecimalInput + ?Sized>(value: &V) -> bool {
    integer_in_range(value, i32::MIN as i128, i32::MAX as i128)
}

/// True iff the value is an integer within `[-2^63, 2^63-1]`.
pub fn is_int64<V: DecimalInput + ?Sized>(value: &V) -> bool {
    integer_in_range(value, i64::MIN as i128, i64::MAX as i128)
}

/// True iff the value carries at most six significant decimal digits.
pub fn is_float<V: DecimalInput + ?Sized>(value: &V) -> bool {
    parse_input(value)
        .map(|d| d.significant_digits() <= FLOAT_MAX_PRECISION)
        .unwrap_or(false)
}

/// True iff the value survives a round trip through an IEEE-754 double unchanged.
pub fn is_double<V: DecimalInput + ?Sized>(value: &V) -> bool {
    let Some(text) = value.decimal_text() else {
        return false;
    };
    let Some(exact) = ExactDecimal::parse(&text) else {
        return false;
    };
    let Ok(double) = text.parse::<f64>() else {
        return false;
    };
    if !double.is_finite() {
        return false;
    }
    ExactDecimal::parse(&format!("{:e}", double))
        .map(|rounded| rounded == exact)
        .unwrap_or(false)
}

/// True iff the value is a string holding valid standard Base64.
pub fn is_byte<V: DecimalInput + ?Sized>(value: &V) -> bool {
    value
        .decimal_text()
        .map(|text| STANDARD.decode(text.as_bytes()).is_ok())
        .unwrap_or(false)
}

fn parse_input<V: DecimalInput + ?Sized>(value: &V) -> Option<ExactDecimal> {
    value.decimal_text().and_then(|t| ExactDecimal::parse(&t))
}

fn integer_in_range<V: DecimalInput + ?Sized>(value: &V, min: i128, max: i128) -> bool {
    parse_input(value)
        .and_then(|d| d.to_i128())
        .map(|n| (min..=max).contains(&n))
        .unwrap_or(false)
}

/// A decimal literal normalized to `digits * 10^exponent`, with no leading or trailing zeros in
/// `digits`. Zero has empty digits and is never negative.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExactDecimal {
    negative: bool,
    digits: String,
    exponent: i64,
}

impl ExactDecimal {
    fn parse(text: &str) -> Option<Self> {
        let (negative, rest) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        let (mantissa, exp_part) = match rest.find(['e', 'E']) {
            Some(i) => (&rest[..i], Some(&rest[i + 1..])),
            None => (rest, None),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let declared_exponent = match exp_part {
            Some(e) => e.parse::<i64>().ok()?,
            None => 0,
        };
        let mut exponent = declared_exponent.checked_sub(i64::try_from(frac_part.len()).ok()?)?;

        let all = format!("{}{}", int_part, frac_part);
        let without_leading = all.trim_start_matches('0');
        let digits = without_leading.trim_end_matches('0');
        exponent = exponent
            .checked_add(i64::try_from(without_leading.len() - digits.len()).ok()?)?;

        if digits.is_empty() {
            return Some(Self {
                negative: false,
                digits: String::new(),
                exponent: 0,
            });
        }

        Some(Self {
            negative,
            digits: digits.to_string(),
            exponent,
        })
    }

    fn significant_digits(&self) -> usize {
        self.digits.len().max(1)
    }

    fn to_i128(&self) -> Option<i128> {
        if self.digits.is_empty() {
            return Some(0);
        }
        if self.exponent < 0 || self.digits.len() as i64 + self.exponent > 38 {
            return None;
        }
        let mut n: i128 = self.digits.parse().ok()?;
        for _ in 0..self.exponent {
            n = n.checked_mul(10)?;
        }
        Some(if self.negative { -n } else { n })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int32_boundaries() {
        assert!(is_int32(&2147483647i64));
        assert!(!is_int32(&2147483648i64));
        assert!(is_int32("-2147483648"));
        assert!(!is_int32("-2147483649"));
        assert!(is_int32("1.0"));
        assert!(is_int32("2e3"));
        assert!(!is_int32("1.5"));
    }

    #[test]
    fn test_int64_boundaries() {
        assert!(is_int64("9223372036854775807"));
        assert!(!is_int64("9223372036854775808"));
        assert!(is_int64("-9223372036854775808"));
        assert!(!is_int64(&json!(9223372036854775808u64)));
        assert!(is_int64(&json!(-42)));
    }

    #[test]
    fn test_float_precision() {
        assert!(is_float("1.5"));
        assert!(is_float("123456"));
        assert!(is_float("0.000123456"));
        assert!(is_float("1230000000"));
        assert!(!is_float("1.234567"));
    }

    #[test]
    fn test_double_round_trip() {
        assert!(is_double(&0.1f64));
        assert!(is_double("0.1"));
        assert!(is_double("2147483648"));
        assert!(!is_double("1.2345678901234567891"));
        assert!(!is_double("9007199254740993"));
        assert!(!is_double("1e400"));
    }

    #[test]
    fn test_predicates_reject_garbage() {
        for bad in ["", "abc", "1..2", "--1", "NaN", "Infinity", "0x10", "1e", "."] {
            assert!(!is_int32(bad), "{bad}");
            assert!(!is_int64(bad), "{bad}");
            assert!(!is_float(bad), "{bad}");
            assert!(!is_double(bad), "{bad}");
        }
        assert!(!is_int32(&json!(true)));
        assert!(!is_double(&f64::NAN));
    }

    #[test]
    fn test_byte() {
        assert!(is_byte("aGVsbG8="));
        assert!(!is_byte("not base64!"));
        assert!(!is_byte(&json!(12)));
    }

    #[test]
    fn test_adapt_numeric_formats() {
        let mut node = json!({"type": "integer", "format": "int32"});
        adapt_format(node.as_object_mut().unwrap());
        assert_eq!(node, json!({"type": "integer", FORMAT_MARKER: "int32"}));

        let mut node = json!({"type": "number", "format": "double"});
        adapt_format(node.as_object_mut().unwrap());
        assert_eq!(node, json!({"type": "number", FORMAT_MARKER: "double"}));
    }

    #[test]
    fn test_adapt_string_formats() {
        let mut node = json!({"type": "string", "format": "uuid"});
        adapt_format(node.as_object_mut().unwrap());
        assert_eq!(node, json!({"type": "string"}));

        let mut node = json!({"type": "string", "format": "date-time"});
        adapt_format(node.as_object_mut().unwrap());
        assert_eq!(node, json!({"type": "string", "format": "date-time"}));

        let mut node = json!({"type": "string", "format": "byte"});
        adapt_format(node.as_object_mut().unwrap());
        assert_eq!(node, json!({"type": "string", FORMAT_MARKER: "byte"}));
    }

    #[test]
    fn test_adapt_mismatched_type_drops_format() {
        let mut node = json!({"type": "string", "format": "int32"});
        adapt_format(node.as_object_mut().unwrap());
        assert_eq!(node, json!({"type": "string"}));
    }

    #[test]
    fn test_check_value_ignores_other_types() {
        assert!(CustomFormat::Int32.check_value(&json!("not a number")));
        assert!(!CustomFormat::Int32.check_value(&json!(4294967296u64)));
        assert!(!CustomFormat::Byte.check_value(&json!("%%%")));
    }
}
