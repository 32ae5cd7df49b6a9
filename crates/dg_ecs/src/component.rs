// component.rs - component schemas and the typed-component trait
//
// A schema is a stable string name plus an ordered list of typed fields with
// defaults. Schemas are immutable once built: `ComponentSchema::new` is the
// only constructor and every field is private behind accessors.
//
// Primitive-only schemas prefer SoA storage (a plain `Vec<T>` dense array,
// memcpy-cheap because T: Copy). Schemas that declare a non-primitive field
// (Object/Set/Map) force AoS storage, where insertion clones the value
// one level deep so the store never aliases the caller's data (see
// DESIGN.md for the source pattern this replaces).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ComponentId = u32;

/// Primitive field type tags a schema field may declare.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    I8,
    I16,
    I32,
    U8,
    U16,
    U32,
    F32,
    F64,
    Bool,
    EntityRef,
    StringHandle,
    /// Non-primitive: forces AoS storage for the owning schema.
    Object,
    Set,
    Map,
}

impl FieldType {
    /// Primitive types are the ones a SoA column can hold directly.
    pub fn is_primitive(self) -> bool {
        !matches!(self, FieldType::Object | FieldType::Set | FieldType::Map)
    }
}

/// A concrete field value, used for schema defaults and for the generic
/// delta-encoded serialization path (§4.14) where payloads are expressed
/// without needing the concrete Rust type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    I8(i8),
    I16(i16),
    I32(i32),
    U8(u8),
    U16(u16),
    U32(u32),
    F32(f32),
    F64(f64),
    Bool(bool),
    EntityRef(u32),
    StringHandle(u32),
    /// Tagged envelope so a set round-trips as a set, not a list.
    Set(Vec<FieldValue>),
    /// Tagged envelope so a map round-trips as a map, not an object.
    Map(Vec<(String, FieldValue)>),
    Object(HashMap<String, FieldValue>),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::I8(_) => FieldType::I8,
            FieldValue::I16(_) => FieldType::I16,
            FieldValue::I32(_) => FieldType::I32,
            FieldValue::U8(_) => FieldType::U8,
            FieldValue::U16(_) => FieldType::U16,
            FieldValue::U32(_) => FieldType::U32,
            FieldValue::F32(_) => FieldType::F32,
            FieldValue::F64(_) => FieldType::F64,
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::EntityRef(_) => FieldType::EntityRef,
            FieldValue::StringHandle(_) => FieldType::StringHandle,
            FieldValue::Set(_) => FieldType::Set,
            FieldValue::Map(_) => FieldType::Map,
            FieldValue::Object(_) => FieldType::Object,
        }
    }
}

/// One field in a component schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub ty: FieldType,
    pub default: FieldValue,
}

/// Storage preference declared alongside a schema. `Auto` lets the registry
/// decide (SoA when every field is primitive, AoS otherwise); `ForceAos` is
/// for schemas that are all-primitive today but are expected to grow a
/// non-primitive field, or that want AoS's deep-clone-on-insert semantics
/// regardless of layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageHint {
    Auto,
    ForceAos,
}

/// An immutable component schema: name, ordered fields, storage hint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentSchema {
    name: String,
    fields: Vec<FieldSchema>,
    storage_hint: StorageHint,
}

impl ComponentSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>, storage_hint: StorageHint) -> Self {
        Self {
            name: name.into(),
            fields,
            storage_hint,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn storage_hint(&self) -> StorageHint {
        self.storage_hint
    }

    /// All-primitive schemas are eligible for SoA storage.
    pub fn is_all_primitive(&self) -> bool {
        self.fields.iter().all(|f| f.ty.is_primitive())
    }

    /// The kind of store the registry will actually build for this schema.
    pub fn resolved_storage_kind(&self) -> StorageKind {
        match self.storage_hint {
            StorageHint::ForceAos => StorageKind::Aos,
            StorageHint::Auto if self.is_all_primitive() => StorageKind::Soa,
            StorageHint::Auto => StorageKind::Aos,
        }
    }

    pub fn default_of(&self, field_name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == field_name).map(|f| &f.default)
    }
}

/// Which concrete store variant backs a component.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageKind {
    Soa,
    Aos,
}

/// Trait implemented by Rust-native component types. `schema()` describes
/// the component for tracing, serialization, and validation purposes; the
/// actual storage is the plain typed `T` held in the store, not a
/// field-by-field reflection of the schema.
pub trait Component: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Stable schema name, used as the registry key and the serialized tag.
    const NAME: &'static str;

    fn schema() -> ComponentSchema;
}

/// Declares a `Component` impl for a plain Rust struct, providing the
/// schema's name. Field-level schema detail is optional; most callers only
/// need the name for registration and tracing, so this macro defaults to a
/// single opaque `Object` field capturing "this is a Rust-native value".
/// Use [`ComponentSchema::new`] directly when downstream tooling (e.g. the
/// scripting or save-inspection layer) needs real per-field metadata.
#[macro_export]
macro_rules! component {
    ($ty:ty, $name:expr) => {
        impl $crate::component::Component for $ty {
            const NAME: &'static str = $name;

            fn schema() -> $crate::component::ComponentSchema {
                $crate::component::ComponentSchema::new(
                    $name,
                    vec![$crate::component::FieldSchema {
                        name: "value".to_string(),
                        ty: $crate::component::FieldType::Object,
                        default: $crate::component::FieldValue::Object(Default::default()),
                    }],
                    $crate::component::StorageHint::Auto,
                )
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitive_field(name: &str, ty: FieldType, default: FieldValue) -> FieldSchema {
        FieldSchema { name: name.to_string(), ty, default }
    }

    #[test]
    fn all_primitive_schema_resolves_to_soa() {
        let schema = ComponentSchema::new(
            "Position",
            vec![
                primitive_field("x", FieldType::F32, FieldValue::F32(0.0)),
                primitive_field("y", FieldType::F32, FieldValue::F32(0.0)),
            ],
            StorageHint::Auto,
        );
        assert_eq!(schema.resolved_storage_kind(), StorageKind::Soa);
    }

    #[test]
    fn object_field_forces_aos() {
        let schema = ComponentSchema::new(
            "Inventory",
            vec![primitive_field(
                "items",
                FieldType::Object,
                FieldValue::Object(Default::default()),
            )],
            StorageHint::Auto,
        );
        assert_eq!(schema.resolved_storage_kind(), StorageKind::Aos);
    }

    #[test]
    fn force_aos_overrides_all_primitive_layout() {
        let schema = ComponentSchema::new(
            "Velocity",
            vec![primitive_field("dx", FieldType::F32, FieldValue::F32(0.0))],
            StorageHint::ForceAos,
        );
        assert_eq!(schema.resolved_storage_kind(), StorageKind::Aos);
    }
}
