use std::any::Any;
use std::sync::Arc;

use fieldmap::{
    MapConfig, MapError, MapRegistry, MapRegistryBuilder, MethodInfo, MethodShape, Registration, TypeInfo,
    registry::PassMode,
};

use crate::utils::{OrderMaps, PrefixMaps, QueryMaps, SplitMaps, User, UserMaps, UserModel, builder};

/// Registering the same pair twice keeps the last function
#[test]
fn test_last_registration_wins() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder
        .register_simple_map(|from: &User, to: &mut UserModel| to.name = from.name.clone())
        .register_simple_map(|from: &User, to: &mut UserModel| to.name = from.email.clone());
    let registry = builder.build();

    let model: UserModel = registry.from(&User::new("ada", "ada@example.org", 36)).to()?;
    assert_eq!(model.name, "ada@example.org");
    assert_eq!(registry.registered_methods().count(), 2);
    Ok(())
}

/// The three slots of a pair are independent
#[test]
fn test_lookup_reports_registered_slots() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<UserMaps>()?;
    builder.register_set::<QueryMaps>()?;
    let registry = builder.build();

    let entry = registry.lookup_of::<User, UserModel>().expect("entry for User -> UserModel");
    assert!(entry.has_in_place());
    assert!(!entry.has_factory());
    assert!(entry.has_projection());
    assert!(registry.lookup_of::<UserModel, User>().is_none());
    Ok(())
}

/// Auto-registration picks up every accepted shape and skips the rest
#[test]
fn test_register_set_classifies_methods() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<OrderMaps>()?;
    builder.register_set::<SplitMaps>()?;
    let registry = builder.build();

    let shapes: Vec<(&str, MethodShape)> = registry
        .registered_methods()
        .map(|method| {
            let shape = MethodShape::classify(method).map(|c| c.shape);
            (method.name, shape.expect("registered methods are mapper-shaped"))
        })
        .collect();
    assert_eq!(
        shapes,
        vec![
            ("summary", MethodShape::Factory),
            ("user_model", MethodShape::SimpleFactory),
            ("map", MethodShape::SimpleMap),
        ]
    );

    // the private helper is known but not registered
    assert!(registry.registered_methods().all(|method| method.name != "contact"));
    Ok(())
}

/// Declarations without a callable are rejected
#[test]
fn test_null_function_is_rejected() {
    let method = MethodInfo::new("Maps", "missing")
        .with_param::<User>("from", PassMode::Ref)
        .with_param::<UserModel>("to", PassMode::RefMut);
    let declaration = Registration::declare(method).expect("mapper-shaped declaration");

    let mut builder = builder();
    let err = builder.register(declaration).err().expect("registration fails");
    assert!(matches!(err, MapError::NullFunction { .. }));
    assert!(err.to_string().contains("UserModel"));
}

/// Sets without a parameterless constructor need a factory override
#[test]
fn test_register_set_uses_factory_override() -> fieldmap::Result<()> {
    let mut plain = builder();
    assert!(matches!(
        plain.register_set::<PrefixMaps>().err(),
        Some(MapError::NoParameterlessConstructor { .. })
    ));

    let mut builder = builder();
    builder.install_factory(
        |info: &TypeInfo| -> anyhow::Result<Box<dyn Any + Send>> {
            anyhow::ensure!(info.name() == "PrefixMaps", "unexpected type {info}");
            Ok(Box::new(PrefixMaps {
                prefix: "Dr. ".to_string(),
            }))
        },
        false,
    );
    builder.register_set::<PrefixMaps>()?;
    let registry = builder.build();

    let model: UserModel = registry.from(&User::new("Who", "", 0)).to()?;
    assert_eq!(model.name, "Dr. Who");
    Ok(())
}

/// Existing instances can be registered directly
#[test]
fn test_register_instance() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_instance(Arc::new(PrefixMaps {
        prefix: "Prof. ".to_string(),
    }))?;
    let registry = builder.build();

    let mut model = UserModel::default();
    registry.from(&User::new("Moriarty", "", 0)).to_existing(&mut model)?;
    assert_eq!(model.name, "Prof. Moriarty");
    Ok(())
}

/// Override errors reach the caller unchanged
#[test]
fn test_factory_override_errors_propagate() {
    let mut builder = builder();
    builder.install_factory(
        |_: &TypeInfo| -> anyhow::Result<Box<dyn Any + Send>> { anyhow::bail!("container offline") },
        true,
    );
    let err = builder.register_set::<UserMaps>().err().expect("override fails");
    assert_eq!(err.to_string(), "container offline");
}

/// With collision rejection two mappers for one slot fail registration
#[test]
fn test_shape_collisions_are_rejected() {
    struct Twice;

    impl fieldmap::MappingSet for Twice {
        fn registrations(_: &Arc<Self>) -> Vec<Registration> {
            vec![
                Registration::simple_map(
                    MethodInfo::new("Twice", "first")
                        .with_param::<User>("from", PassMode::Ref)
                        .with_param::<UserModel>("to", PassMode::RefMut),
                    |_: &User, _: &mut UserModel| {},
                ),
                Registration::map(
                    MethodInfo::opaque(),
                    |_: &MapRegistry, _: &User, _: &mut UserModel| {},
                ),
            ]
        }
    }

    let mut lenient = builder();
    assert!(lenient.register_instance(Arc::new(Twice)).is_ok());

    let mut strict =
        MapRegistryBuilder::with_config(MapConfig::new().with_reject_shape_collisions(true));
    let err = strict.register_instance(Arc::new(Twice)).err().expect("collision");
    assert!(matches!(err, MapError::ShapeCollision { first: "first", .. }));

    // the first method of the rejected set was not registered either
    let registry = strict.build();
    assert!(registry.lookup_of::<User, UserModel>().is_none());
    assert_eq!(registry.registered_methods().count(), 0);
}
