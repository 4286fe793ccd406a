use std::cell::Cell;

use fieldmap::{MapError, Projection, Query};

use crate::utils::{QueryMaps, User, UserMaps, UserModel, builder, users};

/// Registered projections compose into the query plan
#[test]
fn test_query_uses_projection() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<QueryMaps>()?;
    let registry = builder.build();

    let query = Query::new(users()).filter("adults", |user: &User| user.age > 30);
    let projected = registry.from_query(query).to::<UserModel>()?;
    assert_eq!(projected.plan(), ["source(items)", "filter(adults)", "select(names)"]);

    let names: Vec<String> = projected.execute().map(|m| m.name).collect();
    assert_eq!(names, vec!["ada", "grace"]);
    Ok(())
}

/// Composing does not run the source
#[test]
fn test_query_is_not_executed_when_composed() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<QueryMaps>()?;
    let registry = builder.build();

    let pulls = Cell::new(0);
    let query = Query::deferred("users", || {
        pulls.set(pulls.get() + 1);
        users()
    });
    let projected = registry.from_query(query).to::<UserModel>()?;
    assert_eq!(pulls.get(), 0);
    assert_eq!(projected.plan()[0], "source(users)");

    let models = projected.to_list();
    assert_eq!(pulls.get(), 1);
    assert_eq!(models.len(), 3);
    assert!(models.iter().all(|m| m.email.is_empty()));
    Ok(())
}

/// In-place mappers are never used for queries
#[test]
fn test_query_requires_projection() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<UserMaps>()?;
    let registry = builder.build();

    let err = registry
        .from_query(Query::new(users()))
        .to_array::<UserModel>()
        .expect_err("no projection registered");
    assert!(matches!(err, MapError::MappingNotFound { .. }));
    Ok(())
}

/// Projections chain with `then`
#[test]
fn test_projection_chaining() -> fieldmap::Result<()> {
    let mut builder = builder();
    let names = Projection::new("names", |user: &User| user.name.clone());
    let lengths = Projection::new("len", |name: &String| name.len());
    builder.register_projection(names.then(&lengths));
    let registry = builder.build();

    let lengths = registry.from_query(Query::new(users())).to_list::<usize>()?;
    assert_eq!(lengths, vec![3, 5, 5]);
    Ok(())
}
