use fieldmap::{MapError, MapRegistry};

use crate::utils::{Order, OrderMaps, OrderSummary, User, UserMaps, UserModel, builder, users};

fn registry() -> fieldmap::Result<MapRegistry> {
    let mut builder = builder();
    builder.register_set::<UserMaps>()?;
    builder.register_set::<OrderMaps>()?;
    Ok(builder.build())
}

/// A factory mapper wins over create + in-place
#[test]
fn test_factory_has_priority_over_in_place() -> fieldmap::Result<()> {
    let registry = registry()?;
    let user = User::new("ada", "ada@example.org", 36);

    let created: UserModel = registry.from(&user).to()?;
    assert_eq!(created.name, "ADA");

    let mut existing = UserModel {
        id: 7,
        ..UserModel::default()
    };
    registry.from(&user).to_existing(&mut existing)?;
    assert_eq!(existing.name, "ada");
    assert_eq!(existing.id, 7);
    Ok(())
}

/// Mappers can dispatch nested values through the registry
#[test]
fn test_nested_dispatch() -> fieldmap::Result<()> {
    let registry = registry()?;
    let order = Order {
        customer: User::new("grace", "grace@example.org", 45),
        total: 12.5,
    };

    let summary: OrderSummary = registry.from(&order).to()?;
    assert_eq!(summary.customer.name, "GRACE");
    assert_eq!(summary.customer.email, "grace@example.org");
    assert!((summary.total - 12.5).abs() < f64::EPSILON);
    Ok(())
}

/// Unregistered pairs fail with both type names
#[test]
fn test_mapping_not_found() -> fieldmap::Result<()> {
    let registry = registry()?;
    let err = registry
        .from(&UserModel::default())
        .to::<User>()
        .expect_err("no UserModel -> User mapper");

    assert!(matches!(err, MapError::MappingNotFound { .. }));
    let message = err.to_string();
    assert!(message.contains("UserModel"));
    assert!(message.contains("User"));
    Ok(())
}

/// Absent sources and destinations short-circuit
#[test]
fn test_nullable_values() -> fieldmap::Result<()> {
    let registry = registry()?;
    let user = User::new("linus", "linus@example.org", 28);

    assert_eq!(registry.from_nullable::<User>(None).to::<UserModel>()?, None);
    let mapped = registry.from_nullable(Some(&user)).to::<UserModel>()?;
    assert_eq!(mapped.map(|m| m.name), Some("LINUS".to_string()));

    assert!(registry.from(&user).to_nullable::<UserModel>(None)?.is_none());
    let mut target = UserModel::default();
    let same = registry.from(&user).to_nullable(Some(&mut target))?;
    assert_eq!(same.map(|m| m.age), Some(28));
    Ok(())
}

/// Iterators map every element in order
#[test]
fn test_iterators() -> fieldmap::Result<()> {
    let registry = registry()?;
    let users = users();

    let names: Vec<String> = registry
        .from_iter(&users)
        .to::<UserModel>()?
        .map(|model| model.map(|m| m.name))
        .collect::<fieldmap::Result<_>>()?;
    assert_eq!(names, vec!["ADA", "GRACE", "LINUS"]);

    let array = registry.from_iter(&users).to_array::<UserModel>()?;
    assert_eq!(array.len(), 3);

    let nullable = [Some(&users[0]), None, Some(&users[2])];
    let mapped = registry.from_nullable_iter(nullable).to_list::<UserModel>()?;
    assert_eq!(mapped.len(), 3);
    assert!(mapped[1].is_none());
    assert_eq!(mapped[2].as_ref().map(|m| m.age), Some(28));
    Ok(())
}

/// Mapping into an existing list reuses its elements
#[test]
fn test_to_list_into() -> fieldmap::Result<()> {
    let registry = registry()?;
    let users = users();

    let mut target = vec![UserModel {
        id: 1,
        ..UserModel::default()
    }];
    registry.from_iter(&users).to_list_into(&mut target)?;
    assert_eq!(target.len(), 3);
    assert_eq!(target[0].id, 1);
    assert_eq!(target[0].name, "ada");
    assert_eq!(target[2].name, "linus");

    let mut longer = vec![UserModel::default(); 5];
    registry.from_iter(&users[..1]).to_list_into(&mut longer)?;
    assert_eq!(longer.len(), 1);
    Ok(())
}

/// Bound callables; the factory is synthesised when only an in-place mapper exists
#[test]
fn test_bound_methods() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<UserMaps>()?;
    let registry = builder.build();
    let user = User::new("ada", "ada@example.org", 36);

    let map = registry.get_method::<User, UserModel>()?;
    let mut model = UserModel::default();
    map(&user, &mut model);
    assert_eq!(model.email, "ada@example.org");

    let create = registry.get_factory_method::<User, UserModel>()?;
    assert_eq!(create(&user)?.age, 36);

    assert!(registry.get_method::<UserModel, User>().is_err());
    Ok(())
}

/// The frozen registry is shared between threads
#[test]
fn test_concurrent_dispatch() -> fieldmap::Result<()> {
    let registry = std::sync::Arc::new(registry()?);

    let handles: Vec<_> = users()
        .into_iter()
        .map(|user| {
            let registry = std::sync::Arc::clone(&registry);
            std::thread::spawn(move || registry.from(&user).to::<UserModel>())
        })
        .collect();

    for handle in handles {
        let model = handle.join().expect("mapping thread panicked")?;
        assert!(!model.name.is_empty());
    }
    Ok(())
}
