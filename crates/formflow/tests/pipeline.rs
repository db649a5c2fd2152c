// Integration tests: raw submission through validation into storage

use formflow::{
    database::ModelStore, ColumnSpec, FieldSpec, Form, FormMeta, ModelSpec, RawInput,
    RecordSchema, StoredValue, Value,
};
use pretty_assertions::assert_eq;

fn student_model() -> ModelSpec {
    ModelSpec::new(
        "student_profile",
        vec![
            FieldSpec::text("name").max_length(255).into(),
            ColumnSpec::new(FieldSpec::email("email").max_length(254)).unique(),
            ColumnSpec::new(FieldSpec::secret("password").max_length(255)).hashed(),
        ],
    )
    .unwrap()
}

fn registration_form() -> Form {
    let schema = RecordSchema::new(
        "registration",
        vec![
            FieldSpec::text("name"),
            FieldSpec::email("email"),
            FieldSpec::secret("password"),
        ],
    )
    .unwrap();

    Form::new(schema)
        .clean_field("name", |value| match value.as_str() {
            Some(name) if name.chars().count() < 4 => {
                Err("Enter more than or equal 4 char".to_string())
            }
            _ => Ok(value),
        })
        .unwrap()
}

async fn store() -> ModelStore {
    let store = ModelStore::connect("sqlite::memory:", 1).await.unwrap();
    store.migrate(&[&student_model()]).await.unwrap();
    store
}

#[test]
fn test_short_name_is_rejected() {
    let raw = RawInput::new()
        .with("name", "Sam")
        .with("email", "sam@example.com")
        .with("password", "longenough");

    let errors = registration_form().run(&raw).unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.get_error("name"), Some("Enter more than or equal 4 char"));
}

#[tokio::test]
async fn test_valid_registration_is_persisted() {
    let raw = RawInput::new()
        .with("name", "Samuel")
        .with("email", "sam@example.com")
        .with("password", "longenough");

    let record = registration_form().run(&raw).unwrap();
    assert_eq!(
        record.field_names().collect::<Vec<_>>(),
        vec!["name", "email", "password"]
    );

    let store = store().await;
    let model = student_model();
    let first = store.create(&model, &record).await.unwrap();
    assert!(first.id > 0);
    assert_eq!(first.text("name"), Some("Samuel"));

    let stored = first.text("password").unwrap();
    assert_ne!(stored, "longenough");
    assert!(formflow::hasher::verify_password("longenough", stored));

    let other = RawInput::new()
        .with("name", "Samantha")
        .with("email", "samantha@example.com")
        .with("password", "longenough");
    let second = store
        .create(&model, &registration_form().run(&other).unwrap())
        .await
        .unwrap();
    assert!(second.id > first.id);
    assert_eq!(store.count(&model).await.unwrap(), 2);
}

#[tokio::test]
async fn test_duplicate_email_conflicts_without_partial_row() {
    let raw = RawInput::new()
        .with("name", "Samuel")
        .with("email", "sam@example.com")
        .with("password", "longenough");
    let record = registration_form().run(&raw).unwrap();

    let store = store().await;
    let model = student_model();
    store.create(&model, &record).await.unwrap();

    let result = store.create(&model, &record).await;
    assert!(matches!(result, Err(formflow::PersistenceError::Conflict { .. })));
    assert_eq!(store.count(&model).await.unwrap(), 1);
}

#[test]
fn test_rating_above_maximum() {
    let schema = RecordSchema::new(
        "review",
        vec![FieldSpec::integer("rating").min_value(0.0).max_value(10.0)],
    )
    .unwrap();

    let errors = formflow::run(&schema, &RawInput::new().with("rating", "15")).unwrap_err();
    assert!(errors.get_error("rating").unwrap().starts_with("value too large"));

    let record = formflow::run(&schema, &RawInput::new().with("rating", "7")).unwrap();
    assert_eq!(record.get("rating"), Some(&Value::Integer(7)));
}

#[test]
fn test_missing_required_field_is_reported() {
    let errors = registration_form()
        .run(&RawInput::new().with("name", "Samuel"))
        .unwrap_err();
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email", "password"]);
}

#[test]
fn test_too_long_value_never_yields_record() {
    let schema = RecordSchema::new("profile", vec![FieldSpec::text("city").max_length(5)]).unwrap();
    let errors = formflow::run(&schema, &RawInput::new().with("city", "Amsterdam")).unwrap_err();
    assert!(errors.get_error("city").unwrap().starts_with("too long"));
}

#[tokio::test]
async fn test_model_form_update_keeps_password_when_blank() {
    let model = student_model();
    let meta = FormMeta::new(&["name", "email", "password"])
        .label("name", "Enter Name")
        .error_message("email", "required", "Email is required");
    let schema = RecordSchema::from_model(&model, &meta, vec![]).unwrap();
    assert_eq!(schema.field("name").unwrap().display_label(), "Enter Name");

    let errors = formflow::run(&schema, &RawInput::new().with("name", "Samuel")).unwrap_err();
    assert_eq!(errors.get_error("email"), Some("Email is required"));

    let store = store().await;
    let raw = RawInput::new()
        .with("name", "Samuel")
        .with("email", "sam@example.com")
        .with("password", "longenough");
    let created = store
        .create(&model, &formflow::run(&schema, &raw).unwrap())
        .await
        .unwrap();

    let edit_schema = RecordSchema::from_model(
        &model,
        &meta,
        vec![FieldSpec::secret("password").optional()],
    )
    .unwrap();
    let edit = RawInput::new()
        .with("name", "Samuel L")
        .with("email", "sam@example.com");
    let updated = store
        .update(&model, created.id, &formflow::run(&edit_schema, &edit).unwrap())
        .await
        .unwrap();

    assert_eq!(updated.get("name"), Some(&StoredValue::Text("Samuel L".into())));
    assert_eq!(updated.text("password"), created.text("password"));
}
