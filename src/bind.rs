//! The binder: resolve every schema field against a source and build the
//! typed config.
//!
//! Performs no I/O of its own; all reading happened when the source was
//! constructed. Steps:
//!
//! 1. Describe the schema (fails fast, before the source is queried)
//! 2. For each field in declaration order: look the key up, fall back to the
//!    declared default, coerce present values, record failures
//! 3. Fail with every collected field error at once, or
//! 4. Deserialize the bound table into `C`

use confique::Config;
use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::coerce::coerce;
use crate::error::{ConfigError, FieldError, FieldErrors};
use crate::schema::describe;
use crate::source::Source;

/// Bind config type `C` from `source`.
///
/// Absent keys take the field's `#[config(default = ...)]` value unchanged.
/// Absent optional fields become `None`. Missing required fields and values
/// that fail coercion are all reported together in [`ConfigError::Fields`].
pub fn bind<C, S>(source: &S) -> Result<C, ConfigError>
where
    C: Config + DeserializeOwned,
    S: Source + ?Sized,
{
    let schema = std::any::type_name::<C>();
    let fields = describe::<C>()?;
    tracing::debug!(schema, source = %source.name(), fields = fields.len(), "binding config");

    let mut table = Table::new();
    let mut errors = FieldErrors::new();

    for field in &fields {
        match source.get_key(field.name) {
            Some(raw) => match coerce(&raw, field.effective_type()) {
                Ok(value) => {
                    tracing::trace!(field = field.name, origin = "source", "field bound");
                    table.insert(field.name.to_string(), value);
                }
                Err(e) => {
                    tracing::trace!(field = field.name, error = %e, "field rejected");
                    errors.push(field.name, FieldError::Coercion(e));
                }
            },
            None => match &field.default {
                Some(default) => {
                    tracing::trace!(field = field.name, origin = "default", "field bound");
                    table.insert(field.name.to_string(), default.clone());
                }
                None if field.optional => {
                    tracing::trace!(field = field.name, origin = "unset", "field bound");
                }
                None => errors.push(field.name, FieldError::Missing),
            },
        }
    }

    if !errors.is_empty() {
        tracing::debug!(schema, errors = errors.len(), "bind failed");
        return Err(ConfigError::Fields(errors));
    }

    Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Construct {
            schema,
            reason: e.to_string(),
        })
}
