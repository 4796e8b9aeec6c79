//! Schema introspection: turn a config struct into an ordered list of
//! [`FieldDescriptor`]s.
//!
//! A schema is any struct deriving both confique's `Config` and serde's
//! `Deserialize`:
//!
//! ```ignore
//! #[derive(Config, Deserialize)]
//! struct AppConfig {
//!     host: String,
//!     #[config(default = 8080)]
//!     port: u16,
//!     log_file: Option<String>,
//! }
//! ```
//!
//! Two derive-generated tables are combined:
//!
//! - confique's `META` supplies the field names, whether the field is
//!   `Option<T>`, and the `#[config(default = ...)]` value.
//! - a serde probe (see `probe`) drives the struct's `Deserialize` impl to find
//!   each field's declared type, including enum variant names.
//!
//! Anything the binder cannot handle (nested sections, lists, maps, a type
//! that is not a record) is rejected here, before any source is queried.

use std::fmt;

use confique::Config;
use confique::meta::{Expr, FieldKind, Float, Integer, LeafKind};
use serde::de::DeserializeOwned;
use toml::Value;

use crate::error::ConfigError;
use crate::probe;

/// Width and signedness of an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntKind {
    /// Inclusive bounds of the Rust type this kind stands for.
    pub fn bounds(self) -> (i128, i128) {
        match self {
            IntKind::I8 => (i8::MIN.into(), i8::MAX.into()),
            IntKind::I16 => (i16::MIN.into(), i16::MAX.into()),
            IntKind::I32 => (i32::MIN.into(), i32::MAX.into()),
            IntKind::I64 => (i64::MIN.into(), i64::MAX.into()),
            IntKind::U8 => (0, u8::MAX.into()),
            IntKind::U16 => (0, u16::MAX.into()),
            IntKind::U32 => (0, u32::MAX.into()),
            IntKind::U64 => (0, u64::MAX.into()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntKind::I8 => "i8",
            IntKind::I16 => "i16",
            IntKind::I32 => "i32",
            IntKind::I64 => "i64",
            IntKind::U8 => "u8",
            IntKind::U16 => "u16",
            IntKind::U32 => "u32",
            IntKind::U64 => "u64",
        }
    }
}

/// The declared type of a schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeTag {
    String,
    Integer(IntKind),
    Float,
    Boolean,
    /// A unit-variant enum; `variants` are the serialized variant names.
    Enum {
        name: &'static str,
        variants: Vec<&'static str>,
    },
    Optional(Box<TypeTag>),
}

impl TypeTag {
    /// The coercion target: `Optional(T)` unwraps to `T`, everything else is itself.
    pub fn effective(&self) -> &TypeTag {
        match self {
            TypeTag::Optional(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::String => write!(f, "string"),
            TypeTag::Integer(kind) => write!(f, "integer ({})", kind.name()),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Boolean => write!(f, "boolean"),
            TypeTag::Enum { name, .. } => write!(f, "{name}"),
            TypeTag::Optional(inner) => write!(f, "optional {inner}"),
        }
    }
}

/// One field of a schema, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub declared_type: TypeTag,
    pub optional: bool,
    /// The `#[config(default = ...)]` value, already in its native type.
    pub default: Option<Value>,
}

impl FieldDescriptor {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn effective_type(&self) -> &TypeTag {
        self.declared_type.effective()
    }
}

/// Describe the fields of config type `C`.
///
/// Fails with [`ConfigError::SchemaType`] if `C` is not a flat record of
/// supported scalar fields.
pub fn describe<C>() -> Result<Vec<FieldDescriptor>, ConfigError>
where
    C: Config + DeserializeOwned,
{
    let schema = std::any::type_name::<C>();
    let schema_error = |reason: String| ConfigError::SchemaType { schema, reason };

    let probed = probe::probe_fields::<C>().map_err(|e| schema_error(e.to_string()))?;
    let meta = &C::META;

    if probed.len() != meta.fields.len() {
        return Err(schema_error(format!(
            "serde sees {} fields but the config derive declares {}",
            probed.len(),
            meta.fields.len()
        )));
    }

    let mut fields = Vec::with_capacity(probed.len());
    for (name, declared_type) in probed {
        let meta_field = meta
            .fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| schema_error(format!("field `{name}` is renamed or skipped by serde")))?;

        let (meta_optional, default) = match &meta_field.kind {
            FieldKind::Leaf { kind, .. } => match kind {
                LeafKind::Optional => (true, None),
                LeafKind::Required { default } => {
                    let default = match default {
                        Some(expr) => Some(expr_to_value(expr).ok_or_else(|| {
                            schema_error(format!(
                                "default of field `{name}` cannot be represented as a scalar value"
                            ))
                        })?),
                        None => None,
                    };
                    (false, default)
                }
            },
            FieldKind::Nested { .. } => {
                return Err(schema_error(format!(
                    "field `{name}` is a nested section, only flat records are supported"
                )));
            }
        };

        let optional = matches!(declared_type, TypeTag::Optional(_));
        if optional != meta_optional {
            return Err(schema_error(format!(
                "field `{name}` optionality differs between serde and the config derive"
            )));
        }

        fields.push(FieldDescriptor {
            name,
            declared_type,
            optional,
            default,
        });
    }

    tracing::trace!(schema, fields = fields.len(), "described config schema");
    Ok(fields)
}

/// Names of every field in `C`, in declaration order.
pub(crate) fn field_names<C: Config>() -> impl Iterator<Item = &'static str> {
    C::META.fields.iter().map(|f| f.name)
}

/// Convert a confique default expression into a raw value.
///
/// Returns `None` for arrays, maps, and integers that do not fit in an `i64`.
fn expr_to_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Str(s) => Some(Value::String((*s).to_string())),
        Expr::Bool(b) => Some(Value::Boolean(*b)),
        Expr::Float(f) => float_to_f64(f).map(Value::Float),
        Expr::Integer(i) => integer_to_i64(i).map(Value::Integer),
        _ => None,
    }
}

fn integer_to_i64(i: &Integer) -> Option<i64> {
    match *i {
        Integer::I8(v) => Some(v.into()),
        Integer::I16(v) => Some(v.into()),
        Integer::I32(v) => Some(v.into()),
        Integer::I64(v) => Some(v),
        Integer::I128(v) => i64::try_from(v).ok(),
        Integer::Isize(v) => i64::try_from(v).ok(),
        Integer::U8(v) => Some(v.into()),
        Integer::U16(v) => Some(v.into()),
        Integer::U32(v) => Some(v.into()),
        Integer::U64(v) => i64::try_from(v).ok(),
        Integer::U128(v) => i64::try_from(v).ok(),
        Integer::Usize(v) => i64::try_from(v).ok(),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

fn float_to_f64(f: &Float) -> Option<f64> {
    match *f {
        Float::F32(v) => Some(f64::from(v)),
        Float::F64(v) => Some(v),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}
