//! Serde-driven type discovery.
//!
//! Runs a record type's own `Deserialize` impl against a deserializer that
//! answers every request with a placeholder and writes down which `deserialize_*`
//! method was called for each field. The result is the declared type of every
//! field, found structurally from the type itself rather than from names.
//!
//! The placeholder instance is thrown away; only the recorded tags matter.
//!
//! Enums are probed once per variant index, each run answering with variant
//! `k` as a unit variant, so an enum with any data-carrying variant is
//! rejected here instead of failing at construction.

use serde::de::value::BorrowedStrDeserializer;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, MapAccess, VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;
use thiserror::Error;

use crate::schema::{IntKind, TypeTag};

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProbeError(String);

impl de::Error for ProbeError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        ProbeError(msg.to_string())
    }
}

/// Record the declared type of every field of `C`, in declaration order.
pub fn probe_fields<C: DeserializeOwned>() -> Result<Vec<(&'static str, TypeTag)>, ProbeError> {
    let mut out = Vec::new();
    C::deserialize(RecordProbe {
        out: &mut out,
        variant: 0,
    })?;

    let widest = out
        .iter()
        .filter_map(|(_, tag)| match tag.effective() {
            TypeTag::Enum { variants, .. } => Some(variants.len()),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    for variant in 1..widest {
        let mut scratch = Vec::new();
        C::deserialize(RecordProbe {
            out: &mut scratch,
            variant,
        })?;
    }
    Ok(out)
}

struct RecordProbe<'a> {
    out: &'a mut Vec<(&'static str, TypeTag)>,
    /// Which variant every enum field answers with on this run.
    variant: usize,
}

impl<'de> de::Deserializer<'de> for RecordProbe<'_> {
    type Error = ProbeError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(ProbeError("not a record with named fields".into()))
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(ProbeError(
            "maps and flattened fields are not supported".into(),
        ))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_map(FieldsAccess {
            fields,
            next: 0,
            out: self.out,
            variant: self.variant,
        })
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct enum identifier ignored_any
    }
}

struct FieldsAccess<'a> {
    fields: &'static [&'static str],
    next: usize,
    out: &'a mut Vec<(&'static str, TypeTag)>,
    variant: usize,
}

impl<'de> MapAccess<'de> for FieldsAccess<'_> {
    type Error = ProbeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        let Some(name) = self.fields.get(self.next) else {
            return Ok(None);
        };
        seed.deserialize(BorrowedStrDeserializer::new(*name))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, Self::Error> {
        let name = self.fields[self.next];
        self.next += 1;

        let mut tag = None;
        let value = seed
            .deserialize(FieldProbe {
                tag: &mut tag,
                variant: self.variant,
            })
            .map_err(|e| ProbeError(format!("field `{name}`: {e}")))?;
        let tag = tag.ok_or_else(|| ProbeError(format!("field `{name}`: type not recognized")))?;
        self.out.push((name, tag));
        Ok(value)
    }
}

struct FieldProbe<'a> {
    tag: &'a mut Option<TypeTag>,
    variant: usize,
}

impl FieldProbe<'_> {
    fn unsupported<T>(what: &str) -> Result<T, ProbeError> {
        Err(ProbeError(format!("{what} fields are not supported")))
    }
}

macro_rules! probe_int {
    ($($method:ident => $kind:ident, $visit:ident($placeholder:expr);)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                *self.tag = Some(TypeTag::Integer(IntKind::$kind));
                visitor.$visit($placeholder)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for FieldProbe<'_> {
    type Error = ProbeError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Self::unsupported("self-describing")
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        *self.tag = Some(TypeTag::Boolean);
        visitor.visit_bool(false)
    }

    // 1 rather than 0 so NonZero* and similar newtypes accept the placeholder.
    probe_int! {
        deserialize_i8 => I8, visit_i64(1);
        deserialize_i16 => I16, visit_i64(1);
        deserialize_i32 => I32, visit_i64(1);
        deserialize_i64 => I64, visit_i64(1);
        deserialize_u8 => U8, visit_u64(1);
        deserialize_u16 => U16, visit_u64(1);
        deserialize_u32 => U32, visit_u64(1);
        deserialize_u64 => U64, visit_u64(1);
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        *self.tag = Some(TypeTag::Float);
        visitor.visit_f64(0.0)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        *self.tag = Some(TypeTag::Float);
        visitor.visit_f64(0.0)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        *self.tag = Some(TypeTag::String);
        visitor.visit_str("")
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        *self.tag = Some(TypeTag::String);
        visitor.visit_string(String::new())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let mut inner = None;
        let value = visitor.visit_some(FieldProbe {
            tag: &mut inner,
            variant: self.variant,
        })?;
        let inner = inner.ok_or_else(|| ProbeError("optional inner type not recognized".into()))?;
        if matches!(inner, TypeTag::Optional(_)) {
            return Self::unsupported("nested optional");
        }
        *self.tag = Some(TypeTag::Optional(Box::new(inner)));
        Ok(value)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        if variants.is_empty() {
            return Self::unsupported("empty enum");
        }
        let variant = *variants.get(self.variant).unwrap_or(&variants[0]);
        *self.tag = Some(TypeTag::Enum {
            name,
            variants: variants.to_vec(),
        });
        visitor.visit_enum(UnitVariant {
            enum_name: name,
            variant,
        })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Self::unsupported("nested record")
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Self::unsupported("list")
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Self::unsupported("map")
    }

    forward_to_deserialize_any! {
        i128 u128 char bytes byte_buf unit unit_struct tuple tuple_struct
        identifier ignored_any
    }
}

/// Answers an enum's `Deserialize` impl with one variant, as a unit variant.
struct UnitVariant {
    enum_name: &'static str,
    variant: &'static str,
}

impl UnitVariant {
    fn carries_data(&self) -> ProbeError {
        ProbeError(format!(
            "enum `{}` variant `{}` carries data, only unit variants are supported",
            self.enum_name, self.variant
        ))
    }
}

impl<'de> EnumAccess<'de> for UnitVariant {
    type Error = ProbeError;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant), Self::Error> {
        let value = seed.deserialize(BorrowedStrDeserializer::new(self.variant))?;
        Ok((value, self))
    }
}

impl<'de> VariantAccess<'de> for UnitVariant {
    type Error = ProbeError;

    fn unit_variant(self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        _seed: T,
    ) -> Result<T::Value, Self::Error> {
        Err(self.carries_data())
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.carries_data())
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.carries_data())
    }
}
