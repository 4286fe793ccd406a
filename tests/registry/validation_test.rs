use std::any::type_name;

use fieldmap::{MapConfig, MapError, MapRegistryBuilder, Shape, TypeInfo, ValidationMode, mapper};

use crate::utils::{
    AuditMaps, ContactCard, ContactMaps, CycleMaps, OrderMaps, PartialMaps, PrefixMaps, SplitMaps,
    User, UserMaps, UserModel, builder, init_logging,
};

/// A mapper writing every writable field passes
#[test]
fn test_complete_mapping_passes() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<UserMaps>()?;
    builder.register_set::<OrderMaps>()?;
    builder.build().validate()
}

/// Missing fields produce the diagnostic text
#[test]
fn test_incomplete_mapping_reports_fields_and_suggestions() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<PartialMaps>()?;
    let err = builder.build().validate().expect_err("email and age are not mapped");

    let expected = format!(
        "Method PartialMaps::map(from: &{}, to: &mut {}) does not map the following fields:\n\
         \temail\n\
         \tage\n\
         \n\
         Suggestion:\n\
         \tto.email = from.email.clone();\n\
         \tto.age = from.age.clone();\n\
         \n",
        type_name::<User>(),
        type_name::<UserModel>()
    );
    assert_eq!(err.to_string(), expected);
    assert!(matches!(err, MapError::IncompleteMapping(_)));
    Ok(())
}

/// Calls into private helpers of the same pair count, including their ignore sets
#[test]
fn test_helpers_are_followed() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<SplitMaps>()?;
    builder.build().validate()
}

/// Mappers calling each other are walked once and cover both bodies
#[test]
fn test_mutually_recursive_helpers() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<CycleMaps>()?;
    let registry = builder.build();

    assert!(registry.validation_report()?.is_empty());
    let model: UserModel = registry.from(&User::new("ada", "ada@example.org", 36)).to()?;
    assert_eq!(model.email, "ada@example.org");
    Ok(())
}

/// Literals and locals are matched by identifier, not by the display name
#[test]
fn test_renamed_shape_is_matched_by_identifier() -> fieldmap::Result<()> {
    let info = TypeInfo::of::<ContactCard>();
    assert_eq!(ContactCard::NAME, "Contact");
    assert_eq!(info.ident(), "ContactCard");

    let mut builder = builder();
    builder.register_set::<ContactMaps>()?;
    let registry = builder.build();
    registry.validate()?;

    let card: ContactCard = registry.from(&User::new("ada", "ada@example.org", 36)).to()?;
    assert_eq!(card.email, "ada@example.org");
    Ok(())
}

/// `#[map_ignore]` removes fields from the report
#[test]
fn test_ignored_fields_are_not_reported() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_instance(std::sync::Arc::new(PrefixMaps {
        prefix: String::new(),
    }))?;
    builder.build().validate()
}

/// Source mode checks that every readable source field is read
#[test]
fn test_source_mode() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<AuditMaps>()?;
    let err = builder.build().validate().expect_err("age and id are never read");

    let report = err.report().expect("incomplete mapping report");
    let block = &report.blocks()[0];
    assert_eq!(block.mode, ValidationMode::Source);
    assert_eq!(block.unmapped, vec!["age", "id"]);
    assert_eq!(
        block.suggestions,
        vec!["to.age = from.age.clone();", "#[map_ignore(id)]"]
    );
    Ok(())
}

/// Closures wrapped in `mapper!` are inspectable
#[test]
fn test_mapper_closures_are_validated() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register(mapper!(
        #[map_ignore(age)]
        |from: &User, to: &mut UserModel| {
            to.name = from.name.to_uppercase();
            to.email = from.email.clone();
        }
    ))?;
    builder.register(mapper!(|from: &UserModel| -> User {
        User {
            name: from.name.clone(),
            email: from.email.clone(),
            age: from.age,
        }
    }))?;
    builder.build().validate()
}

/// Plain closures have no body and cover nothing
#[test]
fn test_opaque_closures_cover_nothing() {
    let mut builder = builder();
    builder.register_simple_factory(|from: &User| UserModel {
        name: from.name.clone(),
        ..UserModel::default()
    });
    let err = builder.build().validate().expect_err("opaque closure");

    let block = &err.report().expect("report").blocks()[0];
    assert_eq!(block.unmapped, vec!["name", "email", "age"]);
    assert_eq!(
        block.suggestions,
        vec![
            "name: from.name.clone(),",
            "email: from.email.clone(),",
            "age: from.age.clone(),"
        ]
    );
}

/// Functions marked ignore-method are skipped
#[test]
fn test_ignore_method_is_skipped() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register(
        mapper!(|from: &User, to: &mut UserModel| {
            to.name = from.name.clone();
        })
        .ignore_method(),
    )?;
    builder.build().validate()
}

/// Overwritten functions stay in the validation log
#[test]
fn test_overwritten_functions_are_still_validated() -> fieldmap::Result<()> {
    let mut builder = builder();
    builder.register_set::<PartialMaps>()?;
    builder.register_set::<UserMaps>()?;
    let registry = builder.build();

    let report = registry.validation_report()?;
    assert_eq!(report.blocks().len(), 1);
    assert!(report.blocks()[0].method.starts_with("PartialMaps::map"));
    Ok(())
}

/// Parallel validation reports in registration order
#[test]
fn test_parallel_validation_keeps_order() -> fieldmap::Result<()> {
    init_logging();
    let mut builder =
        MapRegistryBuilder::with_config(MapConfig::new().with_parallel_validation(true));
    builder.register_set::<PartialMaps>()?;
    builder.register_set::<UserMaps>()?;
    builder.register_set::<AuditMaps>()?;
    let report = builder.build().validation_report()?;

    let owners: Vec<&str> = report
        .blocks()
        .iter()
        .map(|block| block.method.split("::").next().unwrap_or_default())
        .collect();
    assert_eq!(owners, vec!["PartialMaps", "AuditMaps"]);

    let json = report.to_json().expect("report serializes");
    assert!(json.contains("\"mode\": \"source\""));
    Ok(())
}
