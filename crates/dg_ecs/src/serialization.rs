// serialization.rs - versioned world snapshots
//
// A snapshot is a tagged envelope: format version, tick, every alive
// entity's component set, and every named resource, each serialized through
// `serde_json::Value` rather than a bespoke binary format (the `Component`
// trait already requires `Serialize + DeserializeOwned`, so this reuses that
// bound instead of asking callers to hand-write a second reflection layer).
//
// Per-entity component payloads are stored template-relative: if the caller
// supplies a baseline (the component values an entity's spawn template would
// have produced), only the keys that differ from that baseline are written.
// An entity spawned untouched from its template therefore serializes to an
// empty delta object. `Set`/`Map`-shaped fields are wrapped in a tagged
// envelope (`{"$set": [...]}` / `{"$map": [...]}`) so they round-trip as a
// set or map rather than silently decaying to a JSON array/object.
//
// Restoring a snapshot is two-pass: first every entity is spawned fresh
// (since slot/generation from the old run carry no meaning in the new
// world), building an old-id -> new-`Entity` map; then each entity's
// components are applied, with any component-specific entity-reference
// fields remapped through that table via the codec's registered remap
// function.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{Component, ComponentSchema, FieldType};
use crate::entity::Entity;
use crate::error::EcsError;
use crate::world::World;

pub const SNAPSHOT_FORMAT_VERSION: &str = "1.0";

#[derive(Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub format_version: String,
    pub engine_version: String,
    /// Milliseconds since the Unix epoch at capture time, supplied by the
    /// caller rather than read from the clock here - snapshotting stays a
    /// pure function of its inputs, consistent with the rest of the crate.
    pub timestamp_ms: u64,
    pub tick: u64,
    pub entities: Vec<EntityRecord>,
    pub resources: HashMap<String, Value>,
}

#[derive(Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u32,
    /// Name of the template this entity was instantiated from, if any.
    /// `components` is a delta against that template's baseline when set.
    pub template: Option<String>,
    pub components: HashMap<String, Value>,
}

/// Wraps a JSON array/object so it round-trips as the set/map it came from
/// instead of a plain list or object.
pub fn tag_set(items: Vec<Value>) -> Value {
    serde_json::json!({ "$set": items })
}

pub fn tag_map(entries: Vec<(String, Value)>) -> Value {
    let obj: serde_json::Map<String, Value> = entries.into_iter().collect();
    serde_json::json!({ "$map": obj })
}

/// Top-level-only diff: keys present in `actual` whose value differs from
/// (or is absent in) `base` are kept; everything else is dropped.
pub fn diff_against_template(base: &Value, actual: &Value) -> Value {
    match (base, actual) {
        (Value::Object(base_obj), Value::Object(actual_obj)) => {
            let mut delta = serde_json::Map::new();
            for (key, actual_val) in actual_obj {
                if base_obj.get(key) != Some(actual_val) {
                    delta.insert(key.clone(), actual_val.clone());
                }
            }
            Value::Object(delta)
        }
        _ => actual.clone(),
    }
}

/// Inverse of [`diff_against_template`]: overlay `delta` on top of `base`.
pub fn apply_delta(base: &Value, delta: &Value) -> Value {
    match (base, delta) {
        (Value::Object(base_obj), Value::Object(delta_obj)) => {
            let mut merged = base_obj.clone();
            for (key, value) in delta_obj {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => delta.clone(),
    }
}

/// Wrap every field `schema` declares `Set`/`Map`-typed in the tagged
/// envelope, so the serialized component round-trips as a set/map instead
/// of decaying to a plain JSON array/object. Fields of other types, and
/// fields the schema doesn't mention, pass through untouched.
fn wrap_tagged_fields(schema: &ComponentSchema, value: Value) -> Value {
    let Value::Object(mut obj) = value else {
        return value;
    };
    for field in schema.fields() {
        match field.ty {
            FieldType::Set => {
                if let Some(Value::Array(items)) = obj.remove(&field.name) {
                    obj.insert(field.name.clone(), tag_set(items));
                }
            }
            FieldType::Map => {
                if let Some(Value::Object(map)) = obj.remove(&field.name) {
                    obj.insert(field.name.clone(), tag_map(map.into_iter().collect()));
                }
            }
            _ => {}
        }
    }
    Value::Object(obj)
}

/// Inverse of [`wrap_tagged_fields`]: unwrap the `$set`/`$map` envelope back
/// to the plain array/object `serde_json::from_value` expects.
fn unwrap_tagged_fields(schema: &ComponentSchema, value: Value) -> Value {
    let Value::Object(mut obj) = value else {
        return value;
    };
    for field in schema.fields() {
        match field.ty {
            FieldType::Set => {
                if let Some(wrapped) = obj.remove(&field.name) {
                    let unwrapped = match wrapped {
                        Value::Object(mut w) => w.remove("$set").unwrap_or(Value::Array(Vec::new())),
                        other => other,
                    };
                    obj.insert(field.name.clone(), unwrapped);
                }
            }
            FieldType::Map => {
                if let Some(wrapped) = obj.remove(&field.name) {
                    let unwrapped = match wrapped {
                        Value::Object(mut w) => w.remove("$map").unwrap_or_else(|| Value::Object(Default::default())),
                        other => other,
                    };
                    obj.insert(field.name.clone(), unwrapped);
                }
            }
            _ => {}
        }
    }
    Value::Object(obj)
}

type SerializeFn = Box<dyn Fn(&World, Entity) -> Option<Value> + Send + Sync>;
type DeserializeFn = Box<dyn Fn(&mut World, Entity, Value) -> Result<(), EcsError> + Send + Sync>;
pub type RemapFn = Box<dyn Fn(Value, &HashMap<u32, Entity>) -> Value + Send + Sync>;

struct ComponentCodec {
    serialize: SerializeFn,
    deserialize: DeserializeFn,
    remap: Option<RemapFn>,
}

/// Component types known to the (de)serializer. Registered once per type,
/// independently of `ComponentRegistry` (not every registered component
/// needs to be persisted, e.g. purely derived/cache components).
#[derive(Default)]
pub struct SerdeRegistry {
    codecs: HashMap<&'static str, ComponentCodec>,
}

impl SerdeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Component>(&mut self) {
        self.register_with_remap::<T>(None);
    }

    /// Like [`Self::register`], but also installs a function that rewrites
    /// entity-reference fields in the serialized JSON using the old-id ->
    /// new-`Entity` map built during restore (e.g. a `Parent` component's
    /// referenced entity).
    pub fn register_with_remap<T: Component>(&mut self, remap: Option<RemapFn>) {
        let schema = T::schema();
        let serialize_schema = schema.clone();
        let serialize: SerializeFn = Box::new(move |world, entity| {
            world
                .get_component::<T>(entity)
                .and_then(|c| serde_json::to_value(c).ok())
                .map(|value| wrap_tagged_fields(&serialize_schema, value))
        });
        let deserialize: DeserializeFn = Box::new(move |world, entity, value| {
            let value = unwrap_tagged_fields(&schema, value);
            let component: T = serde_json::from_value(value).map_err(|e| EcsError::ComponentDeserializeFailed {
                name: T::NAME.to_string(),
                reason: e.to_string(),
            })?;
            world.set_component(entity, component)
        });
        self.codecs.insert(
            T::NAME,
            ComponentCodec { serialize, deserialize, remap },
        );
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.codecs.keys().copied()
    }
}

/// Build a snapshot of every alive entity and registered resource. `bases`
/// supplies, per entity, the template name and component baseline to diff
/// against; entities absent from `bases` are serialized in full. `timestamp_ms`
/// is the caller-supplied capture time (milliseconds since the Unix epoch).
pub fn snapshot(
    world: &World,
    codecs: &SerdeRegistry,
    bases: &HashMap<Entity, (String, HashMap<String, Value>)>,
    resources: HashMap<String, Value>,
    timestamp_ms: u64,
) -> WorldSnapshot {
    let mut entities = Vec::new();
    for entity in world.iter_alive() {
        let mut components = HashMap::new();
        let base = bases.get(&entity);
        for (name, codec) in codecs.codecs.iter() {
            if let Some(value) = (codec.serialize)(world, entity) {
                let value = match base {
                    Some((_, baseline)) => match baseline.get(*name) {
                        Some(base_value) => diff_against_template(base_value, &value),
                        None => value,
                    },
                    None => value,
                };
                components.insert((*name).to_string(), value);
            }
        }
        entities.push(EntityRecord {
            id: entity.to_bits(),
            template: base.map(|(name, _)| name.clone()),
            components,
        });
    }

    WorldSnapshot {
        format_version: SNAPSHOT_FORMAT_VERSION.to_string(),
        engine_version: crate::VERSION.to_string(),
        timestamp_ms,
        tick: world.current_tick(),
        entities,
        resources,
    }
}

/// Restore a snapshot into a fresh `World`. `bases` must supply the same
/// per-template component baselines used when the snapshot was taken, keyed
/// by template name this time (not by entity, since old entities no longer
/// exist).
pub fn restore(
    snapshot: &WorldSnapshot,
    world: &mut World,
    codecs: &SerdeRegistry,
    template_bases: &HashMap<String, HashMap<String, Value>>,
) -> Result<HashMap<u32, Entity>, EcsError> {
    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(EcsError::UnsupportedSaveVersion {
            found: snapshot.format_version.clone(),
            expected: SNAPSHOT_FORMAT_VERSION.to_string(),
        });
    }

    let mut id_map = HashMap::with_capacity(snapshot.entities.len());
    for record in &snapshot.entities {
        let entity = world.spawn()?;
        id_map.insert(record.id, entity);
    }

    for record in &snapshot.entities {
        let entity = id_map[&record.id];
        let baseline = record
            .template
            .as_ref()
            .and_then(|name| template_bases.get(name));

        for (name, delta) in &record.components {
            let Some(codec) = codecs.codecs.get(name.as_str()) else {
                continue;
            };
            let full = match baseline.and_then(|b| b.get(name.as_str())) {
                Some(base_value) => apply_delta(base_value, delta),
                None => delta.clone(),
            };
            let remapped = match &codec.remap {
                Some(f) => f(full, &id_map),
                None => full,
            };
            (codec.deserialize)(world, entity, remapped)?;
        }
    }

    world.set_current_tick(snapshot.tick);
    Ok(id_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentSchema, FieldSchema, FieldValue, StorageHint};

    #[test]
    fn diff_then_apply_round_trips() {
        let base = serde_json::json!({"hp": 10, "name": "goblin"});
        let actual = serde_json::json!({"hp": 4, "name": "goblin"});
        let delta = diff_against_template(&base, &actual);
        assert_eq!(delta, serde_json::json!({"hp": 4}));
        assert_eq!(apply_delta(&base, &delta), actual);
    }

    #[test]
    fn untouched_entity_diffs_to_empty_object() {
        let base = serde_json::json!({"hp": 10});
        let delta = diff_against_template(&base, &base);
        assert_eq!(delta, serde_json::json!({}));
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Bag {
        items: Vec<String>,
    }

    impl Component for Bag {
        const NAME: &'static str = "Bag";
        fn schema() -> ComponentSchema {
            ComponentSchema::new(
                "Bag",
                vec![FieldSchema { name: "items".into(), ty: FieldType::Set, default: FieldValue::Set(vec![]) }],
                StorageHint::ForceAos,
            )
        }
    }

    #[test]
    fn set_typed_field_round_trips_through_the_tagged_envelope() {
        let mut world = World::new();
        world.register_component::<Bag>().unwrap();
        let entity = world.spawn().unwrap();
        world
            .set_component(entity, Bag { items: vec!["torch".into(), "rope".into()] })
            .unwrap();

        let mut codecs = SerdeRegistry::new();
        codecs.register::<Bag>();
        let snap = snapshot(&world, &codecs, &HashMap::new(), HashMap::new(), 0);

        let record = &snap.entities[0];
        assert_eq!(
            record.components["Bag"],
            serde_json::json!({"items": {"$set": ["torch", "rope"]}})
        );

        let mut restored = World::new();
        restored.register_component::<Bag>().unwrap();
        restore(&snap, &mut restored, &codecs, &HashMap::new()).unwrap();
        let new_entity = restored.iter_alive().next().unwrap();
        assert_eq!(
            restored.get_component::<Bag>(new_entity),
            Some(&Bag { items: vec!["torch".into(), "rope".into()] })
        );
    }

    #[test]
    fn snapshot_and_restore_round_trip_an_actual_world() {
        #[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
        struct Hp(i32);

        impl Component for Hp {
            const NAME: &'static str = "Hp";
            fn schema() -> ComponentSchema {
                ComponentSchema::new(
                    "Hp",
                    vec![FieldSchema { name: "0".into(), ty: FieldType::I32, default: FieldValue::I32(0) }],
                    StorageHint::Auto,
                )
            }
        }

        let mut world = World::new();
        world.register_component::<Hp>().unwrap();
        let a = world.spawn().unwrap();
        let b = world.spawn().unwrap();
        world.set_component(a, Hp(10)).unwrap();
        world.set_component(b, Hp(20)).unwrap();
        world.set_current_tick(42);

        let mut codecs = SerdeRegistry::new();
        codecs.register::<Hp>();
        let mut resources = HashMap::new();
        resources.insert("seed".to_string(), serde_json::json!(7));

        let snap = snapshot(&world, &codecs, &HashMap::new(), resources, 1_700_000_000_000);
        assert_eq!(snap.format_version, SNAPSHOT_FORMAT_VERSION);
        assert_eq!(snap.timestamp_ms, 1_700_000_000_000);
        assert_eq!(snap.tick, 42);
        assert_eq!(snap.entities.len(), 2);

        let json = serde_json::to_string(&snap).unwrap();
        let round_tripped: WorldSnapshot = serde_json::from_str(&json).unwrap();

        let mut restored = World::new();
        restored.register_component::<Hp>().unwrap();
        let id_map = restore(&round_tripped, &mut restored, &codecs, &HashMap::new()).unwrap();

        assert_eq!(restored.current_tick(), 42);
        assert_eq!(restored.live_count(), 2);
        let new_a = id_map[&a.to_bits()];
        let new_b = id_map[&b.to_bits()];
        assert_eq!(restored.get_component::<Hp>(new_a), Some(&Hp(10)));
        assert_eq!(restored.get_component::<Hp>(new_b), Some(&Hp(20)));
    }
}
