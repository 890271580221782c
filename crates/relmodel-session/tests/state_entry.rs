use std::sync::Arc;

use relmodel_core::{
    AccessorRegistry, EntityKeyValue, EntityType, MetadataProvider, Model, NotFoundKind, Property,
    TypeAccessors, Value, ValueGenerationOnAdd, ValueGenerationOnSave,
};
use relmodel_session::{
    ContextConfiguration, ContextOptions, EntityState, ORIGINAL_VALUES, STORE_GENERATED_VALUES,
    Sidecar, StateEntry, StateEntryFactory,
};

#[derive(Debug, Default)]
struct SomeEntity {
    id: i32,
    name: Option<String>,
}

#[derive(Debug, Default)]
struct SomeDependentEntity {
    id1: i32,
    id2: Option<String>,
    some_entity_id: i32,
    just_a_property: i32,
}

#[derive(Debug, Default)]
struct SomeMoreDependentEntity {
    id: i32,
    fk1: i32,
    fk2: Option<String>,
}

#[derive(Debug, Default)]
struct FullNotificationEntity {
    id: i32,
    name: Option<String>,
}

#[derive(Debug, Default)]
struct Ticket {
    code: String,
}

#[derive(Debug, Default)]
struct ChangedOnlyEntity {
    id: i32,
    name: Option<String>,
}

macro_rules! id_name_accessors {
    ($ty:ty) => {
        TypeAccessors::<$ty>::with_default()
            .property(
                "Id",
                |e| e.id.into(),
                |e, v| {
                    e.id = v.try_into()?;
                    Ok(())
                },
            )
            .property(
                "Name",
                |e| e.name.clone().into(),
                |e, v| {
                    e.name = v.try_into()?;
                    Ok(())
                },
            )
    };
}

fn register_accessors() -> AccessorRegistry {
    let registry = AccessorRegistry::new();
    registry.register(id_name_accessors!(SomeEntity));
    registry.register(id_name_accessors!(FullNotificationEntity));
    registry.register(id_name_accessors!(ChangedOnlyEntity));
    registry.register(TypeAccessors::<Ticket>::with_default().property(
        "Code",
        |t| t.code.clone().into(),
        |t, v| {
            t.code = v.try_into()?;
            Ok(())
        },
    ));
    registry.register(
        TypeAccessors::<SomeDependentEntity>::with_default()
            .property(
                "Id1",
                |e| e.id1.into(),
                |e, v| {
                    e.id1 = v.try_into()?;
                    Ok(())
                },
            )
            .property(
                "Id2",
                |e| e.id2.clone().into(),
                |e, v| {
                    e.id2 = v.try_into()?;
                    Ok(())
                },
            )
            .property(
                "SomeEntityId",
                |e| e.some_entity_id.into(),
                |e, v| {
                    e.some_entity_id = v.try_into()?;
                    Ok(())
                },
            )
            .property(
                "JustAProperty",
                |e| e.just_a_property.into(),
                |e, v| {
                    e.just_a_property = v.try_into()?;
                    Ok(())
                },
            ),
    );
    registry.register(
        TypeAccessors::<SomeMoreDependentEntity>::with_default()
            .property(
                "Id",
                |e| e.id.into(),
                |e, v| {
                    e.id = v.try_into()?;
                    Ok(())
                },
            )
            .property(
                "Fk1",
                |e| e.fk1.into(),
                |e, v| {
                    e.fk1 = v.try_into()?;
                    Ok(())
                },
            )
            .property(
                "Fk2",
                |e| e.fk2.clone().into(),
                |e, v| {
                    e.fk2 = v.try_into()?;
                    Ok(())
                },
            ),
    );
    registry
}

fn id_name_type<T: 'static>(name: &str, lazy_original_values: bool) -> EntityType {
    let mut et = EntityType::for_type::<T>(name);
    let id = et.add_property(Property::typed::<i32>("Id")).unwrap();
    et.set_key(vec![id]).unwrap();
    et.add_property(Property::typed::<Option<String>>("Name").concurrency_token())
        .unwrap();
    et.set_use_lazy_original_values(lazy_original_values);
    et
}

fn build_model(full_notification_lazy: bool) -> Model {
    let mut some_entity = EntityType::for_type::<SomeEntity>("SomeEntity");
    let id = some_entity
        .add_property(
            Property::typed::<i32>("Id")
                .generate_on_add(ValueGenerationOnAdd::Client)
                .generate_on_save(ValueGenerationOnSave::WhenInserting),
        )
        .unwrap();
    let key1 = some_entity.set_key(vec![id]).unwrap().clone();
    some_entity
        .add_property(Property::typed::<Option<String>>("Name").concurrency_token())
        .unwrap();

    let mut dependent = EntityType::for_type::<SomeDependentEntity>("SomeDependentEntity");
    let id1 = dependent.add_property(Property::typed::<i32>("Id1")).unwrap();
    let id2 = dependent
        .add_property(Property::typed::<Option<String>>("Id2"))
        .unwrap();
    let key2 = dependent.set_key(vec![id1, id2]).unwrap().clone();
    let fk = dependent
        .add_property(Property::typed::<i32>("SomeEntityId"))
        .unwrap();
    dependent.add_foreign_key(&key1, vec![fk]).unwrap();
    dependent
        .add_property(
            Property::typed::<i32>("JustAProperty")
                .generate_on_add(ValueGenerationOnAdd::Client)
                .generate_on_save(ValueGenerationOnSave::WhenInserting),
        )
        .unwrap();

    let mut more_dependent =
        EntityType::for_type::<SomeMoreDependentEntity>("SomeMoreDependentEntity");
    let id5 = more_dependent.add_property(Property::typed::<i32>("Id")).unwrap();
    more_dependent.set_key(vec![id5]).unwrap();
    let fk1 = more_dependent.add_property(Property::typed::<i32>("Fk1")).unwrap();
    let fk2 = more_dependent
        .add_property(Property::typed::<Option<String>>("Fk2"))
        .unwrap();
    more_dependent.add_foreign_key(&key2, vec![fk1, fk2]).unwrap();

    let mut model = Model::new();
    model.add_entity_type(some_entity);
    model.add_entity_type(dependent);
    model.add_entity_type(id_name_type::<FullNotificationEntity>(
        "FullNotificationEntity",
        full_notification_lazy,
    ));
    model.add_entity_type(id_name_type::<ChangedOnlyEntity>("ChangedOnlyEntity", true));
    model.add_entity_type(more_dependent);
    model
}

struct Fixture {
    configuration: Arc<ContextConfiguration>,
    factory: StateEntryFactory,
}

impl Fixture {
    fn new() -> Self {
        Self::with_model(build_model(true))
    }

    fn with_model(model: Model) -> Self {
        let configuration = ContextConfiguration::new(
            ContextOptions::new()
                .use_model(Arc::new(model))
                .accessors(Arc::new(register_accessors())),
        )
        .unwrap();
        Self {
            factory: StateEntryFactory::new(Arc::clone(&configuration)),
            configuration,
        }
    }

    fn entity_type(&self, name: &str) -> Arc<EntityType> {
        self.configuration.model().get_entity_type(name).unwrap()
    }

    fn property(&self, entity_type: &str, name: &str) -> Property {
        self.entity_type(entity_type)
            .get_property(name)
            .unwrap()
            .clone()
    }

    fn new_entry<T: Default + Send + 'static>(&self) -> StateEntry {
        self.factory.create_for(T::default()).unwrap()
    }

    fn entry_from_values(&self, entity_type: &str, values: Vec<Value>) -> StateEntry {
        self.factory
            .create_from_values(&self.entity_type(entity_type), values)
            .unwrap()
    }

    fn is_tracked(&self, entry: &StateEntry) -> bool {
        self.configuration.state_manager().is_tracked(entry.id())
    }
}

fn kool() -> Vec<Value> {
    vec![Value::Int(1), Value::from("Kool")]
}

#[test]
fn changing_state_from_unknown_starts_tracking() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let mut entry = fx.new_entry::<SomeEntity>();
    entry.set(&id, Value::Int(1)).unwrap();

    entry.set_entity_state(EntityState::Added).unwrap();

    assert_eq!(entry.state(), EntityState::Added);
    assert!(fx.is_tracked(&entry));
}

#[test]
fn changing_state_to_unknown_stops_tracking() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let mut entry = fx.new_entry::<SomeEntity>();
    entry.set(&id, Value::Int(1)).unwrap();

    entry.set_entity_state(EntityState::Added).unwrap();
    entry.set_entity_state(EntityState::Unknown).unwrap();

    assert_eq!(entry.state(), EntityState::Unknown);
    assert!(!fx.is_tracked(&entry));
}

#[test]
fn changing_state_from_added_to_deleted_stops_tracking() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let mut entry = fx.new_entry::<SomeEntity>();
    entry.set(&id, Value::Int(1)).unwrap();

    entry.set_entity_state(EntityState::Added).unwrap();
    entry.set_entity_state(EntityState::Deleted).unwrap();

    assert_eq!(entry.state(), EntityState::Unknown);
    assert!(!fx.is_tracked(&entry));
    assert!(fx.configuration.state_manager().is_empty());
}

#[test]
fn changing_state_to_modified_or_unchanged_marks_all_properties() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let name = fx.property("SomeEntity", "Name");
    let mut entry = fx.new_entry::<SomeEntity>();
    entry.set(&id, Value::Int(1)).unwrap();

    assert!(!entry.is_property_modified(&id).unwrap());
    assert!(!entry.is_property_modified(&name).unwrap());

    entry.set_entity_state(EntityState::Modified).unwrap();
    assert!(!entry.is_property_modified(&id).unwrap());
    assert!(entry.is_property_modified(&name).unwrap());

    entry.set_entity_state(EntityState::Unchanged).unwrap();
    assert!(!entry.is_property_modified(&id).unwrap());
    assert!(!entry.is_property_modified(&name).unwrap());

    entry.set_property_modified(&id, true).unwrap();
    assert_eq!(entry.state(), EntityState::Modified);
    assert!(entry.is_property_modified(&id).unwrap());
    assert!(!entry.is_property_modified(&name).unwrap());
}

#[test]
fn changing_state_to_added_triggers_key_generation() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let mut entry = fx.new_entry::<SomeEntity>();
    assert_eq!(entry.get(&id).unwrap(), Value::Int(0));

    entry.set_entity_state(EntityState::Added).unwrap();

    let generated = entry.get(&id).unwrap();
    assert!(!generated.is_null());
    assert_ne!(generated, Value::Int(0));
    assert_eq!(entry.entity::<SomeEntity>().unwrap().id, generated.as_i64().unwrap() as i32);
}

#[test]
fn changing_state_to_added_triggers_value_generation_for_any_property() {
    let fx = Fixture::new();
    let id1 = fx.property("SomeDependentEntity", "Id1");
    let id2 = fx.property("SomeDependentEntity", "Id2");
    let fk = fx.property("SomeDependentEntity", "SomeEntityId");
    let just_a_property = fx.property("SomeDependentEntity", "JustAProperty");

    let mut entry = fx.new_entry::<SomeDependentEntity>();
    entry.set(&id1, Value::Int(77)).unwrap();
    entry.set(&id2, Value::from("ReadySalted")).unwrap();
    entry.set(&fk, Value::Int(0)).unwrap();
    assert_eq!(entry.get(&just_a_property).unwrap(), Value::Int(0));

    entry.set_entity_state(EntityState::Added).unwrap();

    assert_ne!(entry.get(&just_a_property).unwrap(), Value::Int(0));
    assert_eq!(entry.get(&id1).unwrap(), Value::Int(77));
    assert_eq!(entry.get(&fk).unwrap(), Value::Int(0));
}

#[test]
fn changing_state_to_added_generates_required_string_key() {
    let mut ticket = EntityType::for_type::<Ticket>("Ticket");
    let code = ticket
        .add_property(Property::typed::<String>("Code").generate_on_add(ValueGenerationOnAdd::Client))
        .unwrap();
    ticket.set_key(vec![code.clone()]).unwrap();
    let mut model = build_model(true);
    model.add_entity_type(ticket);
    let fx = Fixture::with_model(model);

    let mut entry = fx.new_entry::<Ticket>();
    assert_eq!(entry.get(&code).unwrap(), Value::Text(String::new()));

    entry.set_entity_state(EntityState::Added).unwrap();

    let generated = entry.get(&code).unwrap();
    assert_ne!(generated, Value::Text(String::new()));
    assert!(!code.is_default_value(&generated));
    assert_eq!(Value::from(entry.entity::<Ticket>().unwrap().code.clone()), generated);
}

#[test]
fn explicit_values_are_not_regenerated() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let mut entry = fx.new_entry::<SomeEntity>();
    entry.set(&id, Value::Int(42)).unwrap();

    entry.set_entity_state(EntityState::Added).unwrap();

    assert_eq!(entry.get(&id).unwrap(), Value::Int(42));
}

#[test]
fn can_create_primary_key() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let mut entry = fx.new_entry::<SomeEntity>();
    entry.set(&id, Value::Int(77)).unwrap();

    assert_eq!(
        entry.primary_key_value().unwrap(),
        EntityKeyValue::Simple(Value::Int(77))
    );
}

#[test]
fn can_create_composite_primary_key() {
    let fx = Fixture::new();
    let id1 = fx.property("SomeDependentEntity", "Id1");
    let id2 = fx.property("SomeDependentEntity", "Id2");
    let mut entry = fx.new_entry::<SomeDependentEntity>();
    entry.set(&id1, Value::Int(77)).unwrap();
    entry.set(&id2, Value::from("SmokeyBacon")).unwrap();

    let key = entry.primary_key_value().unwrap();
    assert_eq!(key.values(), &[Value::Int(77), Value::from("SmokeyBacon")][..]);
    assert!(matches!(key, EntityKeyValue::Composite(_)));
}

#[test]
fn foreign_key_value_uses_current_dependent_values() {
    let fx = Fixture::new();
    let dependent = fx.entity_type("SomeDependentEntity");
    let fk = fx.property("SomeDependentEntity", "SomeEntityId");
    let mut entry = fx.new_entry::<SomeDependentEntity>();
    entry.set(&fk, Value::Int(77)).unwrap();
    entry.set_relationship_snapshot_value(&fk, Value::Int(78)).unwrap();

    let foreign_key = &dependent.foreign_keys()[0];
    assert_eq!(
        entry.dependent_key_value(foreign_key).unwrap(),
        EntityKeyValue::Simple(Value::Int(77))
    );
    assert_eq!(
        entry.dependent_key_snapshot(foreign_key).unwrap(),
        EntityKeyValue::Simple(Value::Int(78))
    );
}

#[test]
fn snapshot_falls_back_to_current_value_when_never_snapshotted() {
    let fx = Fixture::new();
    let dependent = fx.entity_type("SomeDependentEntity");
    let fk = fx.property("SomeDependentEntity", "SomeEntityId");
    let mut entry = fx.entry_from_values(
        "SomeDependentEntity",
        vec![Value::Int(1), Value::from("A"), Value::Int(77), Value::Int(0)],
    );
    assert_eq!(entry.relationship_snapshot_value(&fk).unwrap(), Value::Int(77));

    let foreign_key = &dependent.foreign_keys()[0];
    assert_eq!(
        entry.dependent_key_snapshot(foreign_key).unwrap(),
        EntityKeyValue::Simple(Value::Int(77))
    );

    entry.set(&fk, Value::Int(77)).unwrap();
    assert_eq!(
        entry.dependent_key_snapshot(foreign_key).unwrap(),
        EntityKeyValue::Simple(Value::Int(77))
    );
}

#[test]
fn changing_an_fk_property_updates_the_snapshot() {
    let fx = Fixture::new();
    let dependent = fx.entity_type("SomeDependentEntity");
    let fk = fx.property("SomeDependentEntity", "SomeEntityId");
    let mut entry = fx.new_entry::<SomeDependentEntity>();
    entry.set(&fk, Value::Int(77)).unwrap();
    entry.set_relationship_snapshot_value(&fk, Value::Int(78)).unwrap();

    entry.set(&fk, Value::Int(79)).unwrap();

    assert_eq!(
        entry.dependent_key_snapshot(&dependent.foreign_keys()[0]).unwrap(),
        EntityKeyValue::Simple(Value::Int(79))
    );
}

#[test]
fn setting_property_to_the_same_value_does_not_update_the_snapshot() {
    let fx = Fixture::new();
    let dependent = fx.entity_type("SomeDependentEntity");
    let fk = fx.property("SomeDependentEntity", "SomeEntityId");
    let mut entry = fx.new_entry::<SomeDependentEntity>();
    entry.set(&fk, Value::Int(77)).unwrap();
    entry.set_relationship_snapshot_value(&fk, Value::Int(78)).unwrap();

    entry.set(&fk, Value::Int(77)).unwrap();
    entry.set(&fk, Value::Int(77)).unwrap();

    assert_eq!(
        entry.dependent_key_snapshot(&dependent.foreign_keys()[0]).unwrap(),
        EntityKeyValue::Simple(Value::Int(78))
    );
}

#[test]
fn can_create_foreign_key_value_from_principal_end() {
    let fx = Fixture::new();
    let dependent = fx.entity_type("SomeDependentEntity");
    let id = fx.property("SomeEntity", "Id");
    let mut entry = fx.new_entry::<SomeEntity>();
    entry.set(&id, Value::Int(77)).unwrap();

    assert_eq!(
        entry.principal_key_value(&dependent.foreign_keys()[0]).unwrap(),
        EntityKeyValue::Simple(Value::Int(77))
    );
}

#[test]
fn can_create_composite_foreign_key_value_from_dependent_values() {
    let fx = Fixture::new();
    let more = fx.entity_type("SomeMoreDependentEntity");
    let fk1 = fx.property("SomeMoreDependentEntity", "Fk1");
    let fk2 = fx.property("SomeMoreDependentEntity", "Fk2");
    let mut entry = fx.new_entry::<SomeMoreDependentEntity>();
    entry.set(&fk1, Value::Int(77)).unwrap();
    entry.set(&fk2, Value::from("CheeseAndOnion")).unwrap();

    assert_eq!(
        entry.dependent_key_value(&more.foreign_keys()[0]).unwrap(),
        EntityKeyValue::Composite(vec![Value::Int(77), Value::from("CheeseAndOnion")])
    );
}

#[test]
fn can_create_composite_foreign_key_value_from_principal_end() {
    let fx = Fixture::new();
    let more = fx.entity_type("SomeMoreDependentEntity");
    let id1 = fx.property("SomeDependentEntity", "Id1");
    let id2 = fx.property("SomeDependentEntity", "Id2");
    let mut entry = fx.new_entry::<SomeDependentEntity>();
    entry.set(&id1, Value::Int(77)).unwrap();
    entry.set(&id2, Value::from("PrawnCocktail")).unwrap();

    assert_eq!(
        entry.principal_key_value(&more.foreign_keys()[0]).unwrap(),
        EntityKeyValue::Composite(vec![Value::Int(77), Value::from("PrawnCocktail")])
    );
}

#[test]
fn principal_key_with_null_component_is_the_null_key() {
    let fx = Fixture::new();
    let more = fx.entity_type("SomeMoreDependentEntity");
    let id1 = fx.property("SomeDependentEntity", "Id1");
    let id2 = fx.property("SomeDependentEntity", "Id2");
    let mut entry = fx.new_entry::<SomeDependentEntity>();
    entry.set(&id1, Value::Int(77)).unwrap();
    entry.set(&id2, Value::Null).unwrap();

    assert!(entry.principal_key_value(&more.foreign_keys()[0]).unwrap().is_null());
}

#[test]
fn can_get_and_set_values_after_creation_from_value_buffer() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let mut entry = fx.entry_from_values("SomeEntity", kool());

    assert_eq!(entry.get(&id).unwrap(), Value::Int(1));
    entry.set(&id, Value::Int(77)).unwrap();
    assert_eq!(entry.get(&id).unwrap(), Value::Int(77));
    assert_eq!(entry.entity::<SomeEntity>().unwrap().id, 77);
}

#[test]
fn value_buffer_length_must_match() {
    let fx = Fixture::new();
    let err = fx
        .factory
        .create_from_values(&fx.entity_type("SomeEntity"), vec![Value::Int(1)])
        .unwrap_err();
    assert!(matches!(err, relmodel_core::Error::Type(_)));
}

#[test]
fn can_set_and_get_property_values_and_value_buffer() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let name = fx.property("SomeEntity", "Name");
    let mut entry = fx.new_entry::<SomeEntity>();

    entry.set(&id, Value::Int(77)).unwrap();
    entry.set(&name, Value::from("Magic Tree House")).unwrap();

    assert_eq!(entry.get(&id).unwrap(), Value::Int(77));
    assert_eq!(entry.get_by_name("Name").unwrap(), Value::from("Magic Tree House"));
    assert_eq!(
        entry.get_value_buffer().unwrap(),
        vec![Value::Int(77), Value::from("Magic Tree House")]
    );
}

#[test]
fn unknown_property_is_not_found() {
    let fx = Fixture::new();
    let foreign = fx.property("ChangedOnlyEntity", "Name");
    let mut entry = fx.new_entry::<SomeEntity>();

    assert_eq!(
        entry.get(&foreign).unwrap_err().not_found_kind(),
        Some(NotFoundKind::Property)
    );
    assert_eq!(
        entry.set_by_name("Nickname", Value::Null).unwrap_err().not_found_kind(),
        Some(NotFoundKind::Property)
    );
}

#[test]
fn create_rejects_instance_of_wrong_type() {
    let fx = Fixture::new();
    let err = fx
        .factory
        .create(&fx.entity_type("SomeEntity"), Box::new(ChangedOnlyEntity::default()))
        .unwrap_err();
    assert!(matches!(err, relmodel_core::Error::Type(_)));
}

#[test]
fn all_original_values_are_captured_eagerly_when_configured() {
    let fx = Fixture::with_model(build_model(false));
    let id = fx.property("FullNotificationEntity", "Id");
    let name = fx.property("FullNotificationEntity", "Name");
    let mut entry = fx.entry_from_values("FullNotificationEntity", kool());

    assert_eq!(entry.original_value(&id).unwrap(), Value::Int(1));
    assert_eq!(entry.original_value(&name).unwrap(), Value::from("Kool"));

    entry.set(&id, Value::Int(2)).unwrap();
    entry.set(&name, Value::from("Beans")).unwrap();
    assert_eq!(entry.original_value(&id).unwrap(), Value::Int(1));
    assert_eq!(entry.original_value(&name).unwrap(), Value::from("Kool"));
    assert_eq!(entry.get(&id).unwrap(), Value::Int(2));

    entry.set_original_value(&id, Value::Int(3)).unwrap();
    entry.set_original_value(&name, Value::from("Franks")).unwrap();
    assert_eq!(entry.original_value(&id).unwrap(), Value::Int(3));
    assert_eq!(entry.original_value(&name).unwrap(), Value::from("Franks"));
    assert_eq!(entry.get(&id).unwrap(), Value::Int(2));
    assert_eq!(entry.get(&name).unwrap(), Value::from("Beans"));
}

#[test]
fn required_original_values_are_captured_lazily() {
    let fx = Fixture::new();
    for entity_type in ["FullNotificationEntity", "ChangedOnlyEntity", "SomeEntity"] {
        let name = fx.property(entity_type, "Name");
        let mut entry = fx.entry_from_values(entity_type, kool());

        assert_eq!(entry.original_value(&name).unwrap(), Value::from("Kool"));

        entry.set(&name, Value::from("Beans")).unwrap();
        assert_eq!(entry.original_value(&name).unwrap(), Value::from("Kool"));
        assert_eq!(entry.get(&name).unwrap(), Value::from("Beans"));

        entry.set_original_value(&name, Value::from("Franks")).unwrap();
        assert_eq!(entry.original_value(&name).unwrap(), Value::from("Franks"));
        assert_eq!(entry.get(&name).unwrap(), Value::from("Beans"));
    }
}

#[test]
fn null_original_values_are_handled() {
    let fx = Fixture::new();
    for entity_type in ["FullNotificationEntity", "ChangedOnlyEntity", "SomeEntity"] {
        let name = fx.property(entity_type, "Name");
        let mut entry = fx.entry_from_values(entity_type, vec![Value::Int(1), Value::Null]);

        assert!(entry.original_value(&name).unwrap().is_null());
        assert!(entry.get(&name).unwrap().is_null());

        entry.set(&name, Value::from("Beans")).unwrap();
        assert!(entry.original_value(&name).unwrap().is_null());
        assert_eq!(entry.get(&name).unwrap(), Value::from("Beans"));

        entry.set_original_value(&name, Value::from("Franks")).unwrap();
        assert_eq!(entry.original_value(&name).unwrap(), Value::from("Franks"));

        entry.set_original_value(&name, Value::Null).unwrap();
        assert!(entry.original_value(&name).unwrap().is_null());
        assert_eq!(entry.get(&name).unwrap(), Value::from("Beans"));
    }
}

#[test]
fn setting_property_through_entry_marks_as_modified() {
    let fx = Fixture::new();
    for entity_type in ["FullNotificationEntity", "ChangedOnlyEntity", "SomeEntity"] {
        let id = fx.property(entity_type, "Id");
        let name = fx.property(entity_type, "Name");
        let mut entry = fx.entry_from_values(entity_type, kool());
        entry.set_entity_state(EntityState::Unchanged).unwrap();

        entry.set(&id, Value::Int(1)).unwrap();
        entry.set(&name, Value::from("Kool")).unwrap();
        assert!(!entry.is_property_modified(&id).unwrap());
        assert!(!entry.is_property_modified(&name).unwrap());
        assert_eq!(entry.state(), EntityState::Unchanged);

        entry.set(&id, Value::Int(2)).unwrap();
        entry.set(&name, Value::from("Beans")).unwrap();
        assert!(entry.is_property_modified(&id).unwrap());
        assert!(entry.is_property_modified(&name).unwrap());
        assert_eq!(entry.state(), EntityState::Modified);
    }
}

#[test]
fn native_mutation_is_found_by_detect_changes() {
    let fx = Fixture::with_model(build_model(false));
    let name = fx.property("FullNotificationEntity", "Name");
    let mut entry = fx.entry_from_values("FullNotificationEntity", kool());
    entry.set_entity_state(EntityState::Unchanged).unwrap();

    entry.entity_mut::<FullNotificationEntity>().unwrap().name = Some("Kool".to_string());
    assert!(!entry.detect_changes().unwrap());
    assert_eq!(entry.state(), EntityState::Unchanged);

    entry.entity_mut::<FullNotificationEntity>().unwrap().name = Some("Beans".to_string());
    assert!(!entry.is_property_modified(&name).unwrap());

    assert!(entry.detect_changes().unwrap());
    assert!(entry.is_property_modified(&name).unwrap());
    assert_eq!(entry.state(), EntityState::Modified);
}

#[test]
fn accept_changes_does_nothing_for_unchanged_or_unknown_entities() {
    let fx = Fixture::new();
    for state in [EntityState::Unchanged, EntityState::Unknown] {
        let mut entry = fx.entry_from_values("SomeEntity", kool());
        entry.set_entity_state(state).unwrap();
        entry.accept_changes().unwrap();
        assert_eq!(entry.state(), state);
    }
}

#[test]
fn accept_changes_makes_modified_and_added_entities_unchanged() {
    let fx = Fixture::new();
    let name = fx.property("SomeEntity", "Name");
    for state in [EntityState::Modified, EntityState::Added] {
        let mut entry = fx.entry_from_values("SomeEntity", kool());
        entry.set_entity_state(state).unwrap();

        entry.set(&name, Value::from("Pickle")).unwrap();
        entry.set_original_value(&name, Value::from("Cheese")).unwrap();

        entry.accept_changes().unwrap();

        assert_eq!(entry.state(), EntityState::Unchanged);
        assert_eq!(entry.get(&name).unwrap(), Value::from("Pickle"));
        assert_eq!(entry.original_value(&name).unwrap(), Value::from("Pickle"));
        assert!(entry.modified_properties().is_empty());
    }
}

#[test]
fn accept_changes_resets_unused_original_values() {
    let fx = Fixture::new();
    let name = fx.property("SomeEntity", "Name");
    let mut entry = fx.entry_from_values("SomeEntity", kool());
    entry.set_entity_state(EntityState::Modified).unwrap();
    entry.set(&name, Value::from("Pickle")).unwrap();

    entry.accept_changes().unwrap();

    assert_eq!(entry.state(), EntityState::Unchanged);
    assert_eq!(entry.original_value(&name).unwrap(), Value::from("Pickle"));
}

#[test]
fn accept_changes_detaches_deleted_entities() {
    let fx = Fixture::new();
    let mut entry = fx.entry_from_values("SomeEntity", kool());
    entry.set_entity_state(EntityState::Deleted).unwrap();
    assert!(fx.is_tracked(&entry));

    entry.accept_changes().unwrap();

    assert_eq!(entry.state(), EntityState::Unknown);
    assert!(!fx.is_tracked(&entry));
}

#[test]
fn can_add_and_remove_sidecars() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let mut entry = fx.entry_from_values("SomeEntity", kool());

    assert!(entry.entity_type().has_clr_type());
    assert!(entry.try_get_sidecar(ORIGINAL_VALUES).is_some());
    assert!(entry.try_get_sidecar("IMZ-Ural").is_none());
    assert!(entry.try_get_sidecar("GG Duetto").is_none());

    entry
        .add_sidecar(Sidecar::new("IMZ-Ural", &[]).with_auto_commit(true))
        .unwrap();
    entry.add_sidecar(Sidecar::new("GG Duetto", &[])).unwrap();
    assert!(entry.try_get_sidecar(ORIGINAL_VALUES).is_some());
    assert!(entry.try_get_sidecar("IMZ-Ural").unwrap().auto_commit());
    assert!(entry.try_get_sidecar("GG Duetto").is_some());

    assert!(entry.remove_sidecar("IMZ-Ural").is_some());
    assert!(entry.remove_sidecar("GG Duetto").is_some());
    assert!(entry.remove_sidecar("IMZ-Ural").is_none());
    assert!(entry.remove_sidecar("GG Duetto").is_none());
    assert!(entry.try_get_sidecar(ORIGINAL_VALUES).is_some());

    entry.remove_sidecar(ORIGINAL_VALUES);
    assert!(entry.try_get_sidecar(ORIGINAL_VALUES).is_none());
    assert_eq!(
        entry.sidecar(ORIGINAL_VALUES).unwrap_err().not_found_kind(),
        Some(NotFoundKind::Sidecar)
    );

    entry
        .add_sidecar(Sidecar::new("IMZ-Ural", std::slice::from_ref(&id)))
        .unwrap();
    assert!(entry.try_get_sidecar(ORIGINAL_VALUES).is_none());
    assert!(entry.try_get_sidecar("IMZ-Ural").is_some());
    assert!(entry.try_get_sidecar("GG Duetto").is_none());
}

#[test]
fn re_adding_a_sidecar_replaces_it_in_place() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let mut entry = fx.entry_from_values("SomeEntity", kool());

    entry.add_sidecar(Sidecar::new("A", std::slice::from_ref(&id))).unwrap();
    entry.add_sidecar(Sidecar::new("B", &[])).unwrap();
    entry
        .set_sidecar_value("A", &id, Value::Int(5))
        .unwrap();
    entry
        .add_sidecar(Sidecar::new("A", std::slice::from_ref(&id)).with_transparent_read(true))
        .unwrap();

    let names: Vec<&str> = entry.sidecars().iter().map(Sidecar::name).collect();
    assert_eq!(names, [ORIGINAL_VALUES, "A", "B"]);
    assert!(entry.sidecar("A").unwrap().transparent_read());
    assert!(entry.sidecar("A").unwrap().is_empty());
}

const THE_WASP: &str = "Wasp Motorcycles";

#[test]
fn non_transparent_sidecar_does_not_intercept_reads_or_writes() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let name = fx.property("SomeEntity", "Name");
    let mut entry = fx.entry_from_values("SomeEntity", kool());
    entry.add_sidecar(Sidecar::new(THE_WASP, std::slice::from_ref(&id))).unwrap();

    assert_eq!(entry.get(&id).unwrap(), Value::Int(1));

    entry.set_sidecar_value(THE_WASP, &id, Value::Int(7)).unwrap();
    assert_eq!(entry.get(&id).unwrap(), Value::Int(1));
    assert_eq!(entry.get(&name).unwrap(), Value::from("Kool"));

    entry.set(&id, Value::Int(77)).unwrap();
    assert_eq!(entry.get(&id).unwrap(), Value::Int(77));
    assert_eq!(entry.sidecar_value(THE_WASP, &id).unwrap(), Value::Int(7));
}

#[test]
fn can_read_values_from_sidecar_transparently() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let name = fx.property("SomeEntity", "Name");
    let mut entry = fx.entry_from_values("SomeEntity", kool());
    entry.add_sidecar(
        Sidecar::new(THE_WASP, std::slice::from_ref(&id)).with_transparent_read(true),
    ).unwrap();

    assert_eq!(entry.get(&id).unwrap(), Value::Int(1));
    assert_eq!(entry.sidecar_value(THE_WASP, &id).unwrap(), Value::Int(1));

    entry.set_sidecar_value(THE_WASP, &id, Value::Int(7)).unwrap();
    assert_eq!(entry.get(&id).unwrap(), Value::Int(7));
    assert_eq!(entry.sidecar_value(THE_WASP, &id).unwrap(), Value::Int(7));
    assert_eq!(entry.get(&name).unwrap(), Value::from("Kool"));

    entry.set(&id, Value::Int(77)).unwrap();
    assert_eq!(entry.get(&id).unwrap(), Value::Int(7));
    assert_eq!(entry.sidecar_value(THE_WASP, &id).unwrap(), Value::Int(7));

    entry.remove_sidecar(THE_WASP);
    assert_eq!(entry.get(&id).unwrap(), Value::Int(77));
    assert_eq!(entry.get(&name).unwrap(), Value::from("Kool"));
}

#[test]
fn can_write_values_to_sidecar_transparently() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let name = fx.property("SomeEntity", "Name");
    let mut entry = fx.entry_from_values("SomeEntity", kool());
    entry.add_sidecar(
        Sidecar::new(THE_WASP, std::slice::from_ref(&id)).with_transparent_write(true),
    ).unwrap();

    entry.set(&id, Value::Int(7)).unwrap();
    assert_eq!(entry.get(&id).unwrap(), Value::Int(1));
    assert_eq!(entry.sidecar_value(THE_WASP, &id).unwrap(), Value::Int(7));

    entry.set_sidecar_value(THE_WASP, &id, Value::Int(77)).unwrap();
    assert_eq!(entry.get(&id).unwrap(), Value::Int(1));
    assert_eq!(entry.sidecar_value(THE_WASP, &id).unwrap(), Value::Int(77));

    entry.remove_sidecar(THE_WASP);
    assert_eq!(entry.get(&id).unwrap(), Value::Int(1));
    assert_eq!(entry.get(&name).unwrap(), Value::from("Kool"));
}

#[test]
fn can_auto_commit_sidecars() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let name = fx.property("SomeEntity", "Name");
    let mut entry = fx.entry_from_values("SomeEntity", kool());
    entry
        .add_sidecar(Sidecar::new(THE_WASP, std::slice::from_ref(&id)).with_auto_commit(true))
        .unwrap();

    entry.set_sidecar_value(THE_WASP, &id, Value::Int(77)).unwrap();
    assert_eq!(entry.get(&id).unwrap(), Value::Int(1));
    assert_eq!(entry.get(&name).unwrap(), Value::from("Kool"));

    entry.auto_commit_sidecars().unwrap();

    assert_eq!(entry.get(&id).unwrap(), Value::Int(77));
    assert!(entry.try_get_sidecar(THE_WASP).is_none());
    assert!(entry.try_get_sidecar(ORIGINAL_VALUES).is_some());
}

#[test]
fn can_auto_rollback_sidecars() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let mut entry = fx.entry_from_values("SomeEntity", kool());
    entry
        .add_sidecar(Sidecar::new(THE_WASP, std::slice::from_ref(&id)).with_auto_commit(true))
        .unwrap();

    entry.set_sidecar_value(THE_WASP, &id, Value::Int(77)).unwrap();
    entry.auto_rollback_sidecars();

    assert_eq!(entry.get(&id).unwrap(), Value::Int(1));
    assert!(entry.try_get_sidecar(THE_WASP).is_none());
}

#[test]
fn sidecar_covering_another_entity_type_is_rejected() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let foreign = fx.property("SomeDependentEntity", "JustAProperty");
    let mut entry = fx.entry_from_values("SomeEntity", kool());

    let err = entry
        .add_sidecar(Sidecar::new(THE_WASP, &[id.clone(), foreign]).with_auto_commit(true))
        .unwrap_err();

    assert_eq!(err.not_found_kind(), Some(NotFoundKind::Property));
    assert!(entry.try_get_sidecar(THE_WASP).is_none());
    entry.auto_commit_sidecars().unwrap();
    assert_eq!(entry.get(&id).unwrap(), Value::Int(1));
}

#[test]
fn store_generated_values_sidecar_is_added_when_preparing_to_save() {
    let fx = Fixture::new();
    let id = fx.property("SomeEntity", "Id");
    let name = fx.property("SomeEntity", "Name");
    let mut entry = fx.entry_from_values("SomeEntity", kool());

    entry.prepare_to_save();

    let generated = entry.try_get_sidecar(STORE_GENERATED_VALUES).unwrap();
    assert!(generated.can_store_value(&id));
    assert!(!generated.can_store_value(&name));
    assert!(entry.is_prepared_to_save());
}

#[test]
fn shadow_only_entity_type_keeps_values_in_the_entry() {
    let mut audit = EntityType::new("AuditEntry");
    let id = audit.add_property(Property::typed::<i64>("Id")).unwrap();
    let message = audit
        .add_property(Property::typed::<Option<String>>("Message"))
        .unwrap();
    audit.set_key(vec![id.clone()]).unwrap();
    let mut model = build_model(true);
    let audit = model.add_entity_type(audit);
    let fx = Fixture::with_model(model);

    let mut entry = fx
        .factory
        .create_from_values(&audit, vec![Value::BigInt(9), Value::from("created")])
        .unwrap();
    assert!(entry.try_get_sidecar(ORIGINAL_VALUES).is_none());
    assert!(id.is_shadow());

    entry.set_entity_state(EntityState::Unchanged).unwrap();
    entry.set(&message, Value::from("updated")).unwrap();

    assert_eq!(entry.original_value(&message).unwrap(), Value::from("created"));
    assert_eq!(entry.state(), EntityState::Modified);
    assert_eq!(
        entry.primary_key_value().unwrap(),
        EntityKeyValue::Simple(Value::BigInt(9))
    );
}
