//! XSD Simple Type validators
//!
//! Leaf values are decoded through the [`AtomicType`] trait. A handful of
//! builtin types is provided; richer types (facets, lists, unions) plug in
//! by implementing the trait.
//!
//! See: https://www.w3.org/TR/xmlschema-2/

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{Number, Value};

use crate::namespaces::QName;
use crate::xpath::is_ncname;
use crate::XSD_1_0_NAMESPACE;

use super::exceptions::{DecodeError, EncodeError};

/// White space normalization of a simple type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Preserve all white space
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace and collapse multiple spaces
    Collapse,
}

impl WhiteSpace {
    /// Normalize a string according to this white space mode
    pub fn normalize(&self, s: &str) -> String {
        match self {
            WhiteSpace::Preserve => s.to_string(),
            WhiteSpace::Replace => s.replace(['\t', '\n', '\r'], " "),
            WhiteSpace::Collapse => s.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

/// Decoder/encoder of leaf values
pub trait AtomicType: fmt::Debug + Send + Sync {
    /// Name used in diagnostics, like `xs:integer`
    fn name(&self) -> String;

    /// Decode a lexical value
    fn decode(&self, text: &str) -> Result<Value, DecodeError>;

    /// Encode a value back to its lexical form
    fn encode(&self, value: &Value) -> Result<String, EncodeError>;

    /// Check a lexical value
    fn is_valid(&self, text: &str) -> bool {
        self.decode(text).is_ok()
    }
}

/// Builtin atomic types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    /// xs:string
    String,
    /// xs:token
    Token,
    /// xs:boolean
    Boolean,
    /// xs:integer
    Integer,
    /// xs:nonNegativeInteger
    NonNegativeInteger,
    /// xs:positiveInteger
    PositiveInteger,
    /// xs:decimal
    Decimal,
    /// xs:QName (lexical form only)
    QName,
}

impl BuiltinType {
    /// Local name in the XSD namespace
    pub fn local_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Token => "token",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::NonNegativeInteger => "nonNegativeInteger",
            Self::PositiveInteger => "positiveInteger",
            Self::Decimal => "decimal",
            Self::QName => "QName",
        }
    }

    /// Lookup by local name
    pub fn from_local_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => Self::String,
            "token" => Self::Token,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "nonNegativeInteger" => Self::NonNegativeInteger,
            "positiveInteger" => Self::PositiveInteger,
            "decimal" => Self::Decimal,
            "QName" => Self::QName,
            _ => return None,
        })
    }

    /// All builtins
    pub fn all() -> [BuiltinType; 8] {
        [
            Self::String,
            Self::Token,
            Self::Boolean,
            Self::Integer,
            Self::NonNegativeInteger,
            Self::PositiveInteger,
            Self::Decimal,
            Self::QName,
        ]
    }

    /// Qualified name of the builtin
    pub fn qname(&self) -> QName {
        QName::namespaced(XSD_1_0_NAMESPACE, self.local_name())
    }

    /// White space normalization applied before decoding
    pub fn white_space(&self) -> WhiteSpace {
        match self {
            Self::String => WhiteSpace::Preserve,
            _ => WhiteSpace::Collapse,
        }
    }

    fn decode_integer(&self, text: &str) -> Result<Value, DecodeError> {
        let (negative, digits) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        if digits.is_empty() || !digits.bytes().all(|c| c.is_ascii_digit()) {
            return Err(self.error(text, "invalid literal for an integer"));
        }

        let digits = digits.trim_start_matches('0');
        let is_zero = digits.is_empty();
        match self {
            Self::NonNegativeInteger if negative && !is_zero => {
                return Err(self.error(text, "value must be non negative"))
            }
            Self::PositiveInteger if negative || is_zero => {
                return Err(self.error(text, "value must be positive"))
            }
            _ => {}
        }

        let canonical = match (is_zero, negative) {
            (true, _) => "0".to_string(),
            (false, true) => format!("-{}", digits),
            (false, false) => digits.to_string(),
        };
        self.number(text, &canonical)
    }

    fn decode_decimal(&self, text: &str) -> Result<Value, DecodeError> {
        let (sign, unsigned) = match text.as_bytes().first() {
            Some(b'-') => ("-", &text[1..]),
            Some(b'+') => ("", &text[1..]),
            _ => ("", text),
        };
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let valid = !(int_part.is_empty() && frac_part.is_empty())
            && int_part.bytes().all(|c| c.is_ascii_digit())
            && frac_part.bytes().all(|c| c.is_ascii_digit());
        if !valid {
            return Err(self.error(text, "invalid literal for a decimal"));
        }

        let int_part = match int_part.trim_start_matches('0') {
            "" => "0",
            digits => digits,
        };
        let frac_part = frac_part.trim_end_matches('0');
        let lexical = if frac_part.is_empty() {
            format!("{}{}", sign, int_part)
        } else {
            format!("{}{}.{}", sign, int_part, frac_part)
        };

        match Decimal::from_str(&lexical) {
            Ok(value) => self.number(text, &value.normalize().to_string()),
            // beyond the precision of Decimal, keep the exact lexical form
            Err(_) => self.number(text, &lexical),
        }
    }

    fn number(&self, text: &str, canonical: &str) -> Result<Value, DecodeError> {
        if let Ok(value) = canonical.parse::<i64>() {
            return Ok(Value::from(value));
        }
        Number::from_str(canonical)
            .map(Value::Number)
            .map_err(|_| self.error(text, "invalid numeric value"))
    }

    fn error(&self, text: &str, reason: &str) -> DecodeError {
        DecodeError::new(text, reason).with_target_type(self.name())
    }
}

impl AtomicType for BuiltinType {
    fn name(&self) -> String {
        format!("xs:{}", self.local_name())
    }

    fn decode(&self, text: &str) -> Result<Value, DecodeError> {
        let text = self.white_space().normalize(text);
        match self {
            Self::String | Self::Token => Ok(Value::String(text)),
            Self::Boolean => match text.as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(self.error(&text, "invalid literal for a boolean")),
            },
            Self::Integer | Self::NonNegativeInteger | Self::PositiveInteger => {
                self.decode_integer(&text)
            }
            Self::Decimal => self.decode_decimal(&text),
            Self::QName => {
                let valid = match text.split_once(':') {
                    Some((prefix, local)) => is_ncname(prefix) && is_ncname(local),
                    None => is_ncname(&text),
                };
                if valid {
                    Ok(Value::String(text))
                } else {
                    Err(self.error(&text, "invalid QName"))
                }
            }
        }
    }

    fn encode(&self, value: &Value) -> Result<String, EncodeError> {
        match (self, value) {
            (Self::String | Self::Token, Value::String(s)) => Ok(s.clone()),
            (Self::QName, Value::String(s)) if self.is_valid(s) => Ok(s.clone()),
            (Self::Boolean, Value::Bool(b)) => Ok(b.to_string()),
            (Self::Integer | Self::NonNegativeInteger | Self::PositiveInteger, Value::Number(n)) => {
                let text = n.to_string();
                self.decode(&text)
                    .map(|_| text)
                    .map_err(|e| EncodeError::new(value.to_string(), e.reason))
            }
            (Self::Decimal, Value::Number(n)) => Ok(n.to_string()),
            _ => Err(EncodeError::new(
                value.to_string(),
                format!("not a valid value for {}", self.name()),
            )),
        }
    }
}

/// A simple type in the component graph
#[derive(Debug, Clone)]
pub struct XsdSimpleType {
    /// Type name (None for anonymous types)
    pub name: Option<QName>,
    /// Leaf value decoder
    pub atomic: Arc<dyn AtomicType>,
}

impl XsdSimpleType {
    /// Create a simple type from a builtin
    pub fn builtin(builtin: BuiltinType) -> Self {
        Self {
            name: Some(builtin.qname()),
            atomic: Arc::new(builtin),
        }
    }

    /// Create a simple type from any atomic decoder
    pub fn new(name: Option<QName>, atomic: Arc<dyn AtomicType>) -> Self {
        Self { name, atomic }
    }

    /// Decode a lexical value
    pub fn decode(&self, text: &str) -> Result<Value, DecodeError> {
        self.atomic.decode(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_white_space() {
        assert_eq!(WhiteSpace::Collapse.normalize("  a \n  b "), "a b");
        assert_eq!(WhiteSpace::Replace.normalize("a\tb"), "a b");
        assert_eq!(WhiteSpace::Preserve.normalize(" a "), " a ");
    }

    #[test]
    fn test_decode_builtins() {
        assert_eq!(BuiltinType::String.decode(" x ").unwrap(), json!(" x "));
        assert_eq!(BuiltinType::Token.decode(" x  y ").unwrap(), json!("x y"));
        assert_eq!(BuiltinType::Boolean.decode("1").unwrap(), json!(true));
        assert_eq!(BuiltinType::Integer.decode(" +42 ").unwrap(), json!(42));
        assert_eq!(BuiltinType::Decimal.decode("1.50").unwrap(), json!(1.5));
        assert_eq!(BuiltinType::Decimal.decode("+.50").unwrap(), json!(0.5));
        assert_eq!(BuiltinType::Decimal.decode("007.0").unwrap(), json!(7));
        assert_eq!(BuiltinType::NonNegativeInteger.decode("-0").unwrap(), json!(0));
    }

    #[test]
    fn test_decode_keeps_precision() {
        let big = BuiltinType::Integer.decode("099999999999999999999").unwrap();
        assert_eq!(big.to_string(), "99999999999999999999");

        let small = BuiltinType::Decimal.decode("0.100000000000000000010").unwrap();
        assert_eq!(small.to_string(), "0.10000000000000000001");
        assert_ne!(small, BuiltinType::Decimal.decode("0.1").unwrap());

        let wide = BuiltinType::Decimal.decode("-12345678901234567890.25").unwrap();
        assert_eq!(wide.to_string(), "-12345678901234567890.25");
        assert_eq!(BuiltinType::Decimal.encode(&wide).unwrap(), "-12345678901234567890.25");
        assert_eq!(BuiltinType::Integer.encode(&big).unwrap(), "99999999999999999999");
    }

    #[test]
    fn test_decode_errors() {
        let err = BuiltinType::Integer.decode("abc").unwrap_err();
        assert_eq!(err.target_type.as_deref(), Some("xs:integer"));
        assert!(BuiltinType::Boolean.decode("yes").is_err());
        assert!(BuiltinType::NonNegativeInteger.decode("-1").is_err());
        assert!(BuiltinType::PositiveInteger.decode("0").is_err());
        assert!(BuiltinType::Decimal.decode("1.2.3").is_err());
        assert!(BuiltinType::Decimal.decode("-").is_err());
        assert!(!BuiltinType::Integer.is_valid("1e3"));
        assert!(BuiltinType::QName.is_valid("xs:string"));
        assert!(!BuiltinType::QName.is_valid("a:b:c"));
    }

    #[test]
    fn test_encode_builtins() {
        assert_eq!(BuiltinType::Boolean.encode(&json!(false)).unwrap(), "false");
        assert_eq!(BuiltinType::Integer.encode(&json!(7)).unwrap(), "7");
        assert!(BuiltinType::PositiveInteger.encode(&json!(0)).is_err());
        assert!(BuiltinType::Integer.encode(&json!("7")).is_err());
    }

    #[test]
    fn test_builtin_lookup() {
        for builtin in BuiltinType::all() {
            assert_eq!(BuiltinType::from_local_name(builtin.local_name()), Some(builtin));
        }
        assert_eq!(BuiltinType::Decimal.qname().namespace_uri(), XSD_1_0_NAMESPACE);
    }
}
