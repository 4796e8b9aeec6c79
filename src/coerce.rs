//! Value coercion: convert a raw source value to a field's declared type.
//!
//! Sources mostly hand back strings (`"8080"`, `"yes"`), but programmatic
//! sources may supply native scalars. Coercion normalizes both into the
//! `toml::Value` shape the final deserialization expects.
//!
//! Rules, in priority order:
//!
//! 1. **Boolean**: strings are lowercased and matched against
//!    `true/yes/on/1` and `false/no/off/0`. Native booleans, `1`/`0` integers
//!    and `1.0`/`0.0` floats are also accepted.
//! 2. **Enum**: the value's text must equal one of the variant names exactly.
//! 3. **Scalar**: integers and floats are parsed from trimmed strings; integers
//!    are range-checked against the declared width. Strings accept any scalar
//!    rendered as text.
//!
//! Absent values never reach this module.

use toml::Value;

use crate::error::CoercionError;
use crate::schema::{IntKind, TypeTag};

pub const TRUE_VALUES: [&str; 4] = ["true", "yes", "on", "1"];
pub const FALSE_VALUES: [&str; 4] = ["false", "no", "off", "0"];

/// Convert `raw` into the shape of `target`.
///
/// `Optional(T)` targets coerce to `T`.
pub fn coerce(raw: &Value, target: &TypeTag) -> Result<Value, CoercionError> {
    match target.effective() {
        TypeTag::Boolean => coerce_bool(raw).map(Value::Boolean),
        TypeTag::Enum { name, variants } => coerce_enum(raw, name, variants),
        TypeTag::Integer(kind) => coerce_int(raw, *kind).map(Value::Integer),
        TypeTag::Float => coerce_float(raw).map(Value::Float),
        TypeTag::String => coerce_string(raw).map(Value::String),
        TypeTag::Optional(inner) => coerce(raw, inner),
    }
}

fn coerce_bool(raw: &Value) -> Result<bool, CoercionError> {
    let parsed = match raw {
        Value::Boolean(b) => Some(*b),
        Value::String(s) => {
            let lower = s.to_lowercase();
            if TRUE_VALUES.contains(&lower.as_str()) {
                Some(true)
            } else if FALSE_VALUES.contains(&lower.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        Value::Integer(1) => Some(true),
        Value::Integer(0) => Some(false),
        Value::Float(f) if *f == 1.0 => Some(true),
        Value::Float(f) if *f == 0.0 => Some(false),
        _ => None,
    };
    parsed.ok_or_else(|| CoercionError::InvalidBool {
        value: display_raw(raw),
    })
}

fn coerce_enum(
    raw: &Value,
    name: &'static str,
    variants: &[&'static str],
) -> Result<Value, CoercionError> {
    let text = scalar_text(raw);
    match text {
        Some(text) if variants.contains(&text.as_str()) => Ok(Value::String(text)),
        _ => Err(CoercionError::InvalidVariant {
            value: display_raw(raw),
            type_name: name,
            variants: variants.to_vec(),
        }),
    }
}

fn coerce_int(raw: &Value, kind: IntKind) -> Result<i64, CoercionError> {
    let target = TypeTag::Integer(kind).to_string();
    let conversion = || CoercionError::Conversion {
        value: display_raw(raw),
        target: target.clone(),
    };

    let wide: i128 = match raw {
        Value::Integer(i) => (*i).into(),
        Value::String(s) => s.trim().parse::<i128>().map_err(|_| conversion())?,
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => *f as i128,
        _ => return Err(conversion()),
    };

    let (min, max) = kind.bounds();
    if wide < min || wide > max {
        return Err(CoercionError::OutOfRange {
            value: display_raw(raw),
            target,
        });
    }
    // u64 values above i64::MAX have no toml representation.
    i64::try_from(wide).map_err(|_| CoercionError::OutOfRange {
        value: display_raw(raw),
        target,
    })
}

fn coerce_float(raw: &Value) -> Result<f64, CoercionError> {
    match raw {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| CoercionError::Conversion {
            value: s.clone(),
            target: TypeTag::Float.to_string(),
        }),
        other => Err(CoercionError::Conversion {
            value: display_raw(other),
            target: TypeTag::Float.to_string(),
        }),
    }
}

fn coerce_string(raw: &Value) -> Result<String, CoercionError> {
    scalar_text(raw).ok_or_else(|| CoercionError::Conversion {
        value: display_raw(raw),
        target: TypeTag::String.to_string(),
    })
}

/// Text form of a scalar value; `None` for datetimes, arrays and tables.
fn scalar_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        // Debug keeps the `.0` on integral floats.
        Value::Float(f) => Some(format!("{f:?}")),
        Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Render a raw value for error messages, without TOML quoting for strings.
fn display_raw(raw: &Value) -> String {
    scalar_text(raw).unwrap_or_else(|| raw.to_string())
}
