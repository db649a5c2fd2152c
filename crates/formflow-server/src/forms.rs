// File: src/forms.rs
// Purpose: The student forms and models served by this binary, and the registry holding them

use formflow::accounts::{self, USER_MODEL};
use formflow::validators::IpProtocol;
use formflow::{
    AdminSpec, Choice, ColumnSpec, DefinitionError, FieldSpec, Form, FormMeta, ModelSpec,
    RecordSchema, Registry, Widget,
};

pub const STUDENT_REGISTRATION: &str = "student_registration";
pub const DEMO_FORM: &str = "demo";
pub const PROFILE_MODEL: &str = "student_profile";
pub const RESULT_MODEL: &str = "student_result";

pub fn profile_model() -> Result<ModelSpec, DefinitionError> {
    ModelSpec::new(
        PROFILE_MODEL,
        vec![
            FieldSpec::text("name").max_length(255).into(),
            ColumnSpec::new(FieldSpec::email("email").max_length(254)).unique(),
            ColumnSpec::new(FieldSpec::secret("password").max_length(255)).hashed(),
        ],
    )
}

pub fn result_model() -> Result<ModelSpec, DefinitionError> {
    ModelSpec::new(
        RESULT_MODEL,
        vec![
            FieldSpec::text("stud_class").max_length(70).into(),
            FieldSpec::integer("marks").into(),
        ],
    )
}

/// Profile form: name needs at least four characters
pub fn student_registration(profile: &ModelSpec) -> Result<Form, DefinitionError> {
    let meta = FormMeta::new(&["name", "email", "password"])
        .label("name", "Enter Name")
        .label("email", "Enter Email")
        .label("password", "Password")
        .error_message("email", "required", "Email is required")
        .widget("password", Widget::PasswordInput);

    let schema = RecordSchema::from_model(profile, &meta, Vec::new())?;
    let schema = RecordSchema::new(STUDENT_REGISTRATION, schema.fields().to_vec())?;

    Form::new(schema).clean_field("name", |value| match value.as_str() {
        Some(name) if name.chars().count() < 4 => Err("Enter more than or equal 4 char".to_string()),
        _ => Ok(value),
    })
}

/// One field of every kind
///
/// Uploads are optional here: request bodies are urlencoded or JSON and
/// cannot carry files.
pub fn demo_form() -> Result<Form, DefinitionError> {
    let schema = RecordSchema::new(
        DEMO_FORM,
        vec![
            FieldSpec::text("name"),
            FieldSpec::email("email"),
            FieldSpec::integer("pin_code"),
            FieldSpec::float("age"),
            FieldSpec::time("date_of_birth"),
            FieldSpec::datetime("appointment_datetime").widget(Widget::DateTimeLocalInput),
            FieldSpec::boolean("is_subscribed"),
            FieldSpec::tri_state("agree_terms"),
            FieldSpec::choice(
                "gender",
                vec![
                    Choice::new("M", "Male"),
                    Choice::new("F", "Female"),
                    Choice::new("O", "other"),
                ],
            ),
            FieldSpec::multi_choice(
                "interests",
                vec![
                    Choice::new("tech", "Technology"),
                    Choice::new("art", "Art"),
                    Choice::new("sports", "Sports"),
                ],
            ),
            FieldSpec::image("profile_image").optional(),
            FieldSpec::file("resume").optional().allowed_extensions(&["pdf", "doc", "docx"]),
            FieldSpec::url("website"),
            FieldSpec::pattern("phone_number", r"\+?1?\d{9,15}")?
                .pattern_message("Phone number must be 9 to 15 digits"),
            FieldSpec::secret("password"),
            FieldSpec::slug("slug"),
            FieldSpec::ip_address("ip_address", IpProtocol::Both),
            FieldSpec::decimal("rating")
                .precision(3, 1)
                .min_value(0.0)
                .max_value(10.0),
        ],
    )?;

    Ok(Form::new(schema))
}

/// Everything the handlers look up by name
pub fn build_registry() -> Result<Registry, DefinitionError> {
    let profile = profile_model()?;
    let users = accounts::user_model()?;

    Registry::new()
        .with_form(student_registration(&profile)?)
        .with_form(demo_form()?)
        .with_model(profile)
        .with_model(result_model()?)
        .with_model(users)
        .with_admin(
            PROFILE_MODEL,
            AdminSpec::new()
                .list_display(&["id", "name", "email"])
                .search_fields(&["name", "email"]),
        )?
        .with_admin(
            RESULT_MODEL,
            AdminSpec::new()
                .list_display(&["id", "stud_class", "marks"])
                .list_filter(&["stud_class"]),
        )?
        .with_admin(USER_MODEL, accounts::user_admin())
}
