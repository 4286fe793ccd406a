use std::sync::Arc;

use fieldmap::{MapError, MapRegistry};
use futures::future::join_all;
use futures::{StreamExt, stream};

use crate::utils::{OrderMaps, User, UserMaps, UserModel, builder, users};

fn registry() -> fieldmap::Result<MapRegistry> {
    let mut builder = builder();
    builder.register_set::<UserMaps>()?;
    Ok(builder.build())
}

/// Stream elements are mapped in source order
#[tokio::test]
async fn test_stream_to_list() -> fieldmap::Result<()> {
    let registry = registry()?;
    let models = registry
        .from_stream(stream::iter(users()))
        .to_list::<UserModel>()
        .await?;

    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["ada", "grace", "linus"]);
    Ok(())
}

/// The mapped stream is lazy and can be consumed element by element
#[tokio::test]
async fn test_stream_is_lazy() -> fieldmap::Result<()> {
    let registry = registry()?;
    let mapped = registry.from_stream(stream::iter(users())).to::<UserModel>()?;
    let mut mapped = Box::pin(mapped);

    let first = mapped.next().await.transpose()?;
    assert_eq!(first.map(|m| m.age), Some(36));
    assert_eq!(mapped.count().await, 2);
    Ok(())
}

/// Absent elements pass through untouched
#[tokio::test]
async fn test_nullable_stream() -> fieldmap::Result<()> {
    let registry = registry()?;
    let source = vec![None, Some(User::new("ada", "ada@example.org", 36)), None];

    let mapped = registry
        .from_nullable_stream(stream::iter(source))
        .to_list::<UserModel>()
        .await?;
    assert_eq!(mapped.len(), 3);
    assert!(mapped[0].is_none());
    assert_eq!(mapped[1].as_ref().map(|m| m.email.as_str()), Some("ada@example.org"));
    assert!(mapped[2].is_none());
    Ok(())
}

/// A missing mapper is reported before the stream is polled
#[tokio::test]
async fn test_stream_without_mapper() -> fieldmap::Result<()> {
    let registry = registry()?;
    let result = registry
        .from_stream(stream::iter(vec![UserModel::default()]))
        .to_array::<User>()
        .await;
    assert!(matches!(result, Err(MapError::MappingNotFound { .. })));
    Ok(())
}

/// Several tasks share one registry
#[tokio::test]
async fn test_concurrent_streams() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<UserMaps>()?;
    builder.register_set::<OrderMaps>()?;
    let registry = Arc::new(builder.build());

    let tasks = (0..4).map(|_| {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            registry
                .from_stream(stream::iter(users()))
                .to_array::<UserModel>()
                .await
        })
    });

    for result in join_all(tasks).await {
        let models = result.expect("mapping task panicked")?;
        assert_eq!(models.len(), 3);
        assert_eq!(models[1].name, "GRACE");
    }
    Ok(())
}
