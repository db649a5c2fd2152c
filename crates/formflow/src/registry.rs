// File: src/registry.rs
// Purpose: Named forms, models and admin registrations, built once at startup

use crate::admin::AdminSpec;
use crate::error::DefinitionError;
use crate::form::Form;
use crate::model::ModelSpec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Everything the request handlers look up by name
///
/// Built with the `with_*` methods and then shared read-only (wrap it in an
/// `Arc`). There is no global registry.
#[derive(Debug, Default)]
pub struct Registry {
    forms: HashMap<String, Arc<Form>>,
    models: HashMap<String, Arc<ModelSpec>>,
    admins: HashMap<String, AdminSpec>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a form under its schema name
    pub fn with_form(mut self, form: Form) -> Self {
        let name = form.name().to_string();
        if self.forms.insert(name.clone(), Arc::new(form)).is_some() {
            warn!(form = %name, "form registered twice; keeping the latest");
        }
        self
    }

    /// Register a model under its name
    pub fn with_model(mut self, model: ModelSpec) -> Self {
        let name = model.name().to_string();
        if self.models.insert(name.clone(), Arc::new(model)).is_some() {
            warn!(model = %name, "model registered twice; keeping the latest");
        }
        self
    }

    /// Register admin options for an already registered model
    pub fn with_admin(mut self, model: &str, admin: AdminSpec) -> Result<Self, DefinitionError> {
        let spec = self
            .models
            .get(model)
            .ok_or_else(|| DefinitionError::UnknownModel {
                name: model.to_string(),
            })?;
        admin.validate(spec)?;

        if self.admins.insert(model.to_string(), admin).is_some() {
            warn!(model = %model, "admin registered twice; keeping the latest");
        }
        Ok(self)
    }

    pub fn form(&self, name: &str) -> Option<Arc<Form>> {
        self.forms.get(name).cloned()
    }

    pub fn model(&self, name: &str) -> Option<Arc<ModelSpec>> {
        self.models.get(name).cloned()
    }

    /// The model and its admin options, if both are registered
    pub fn admin(&self, model: &str) -> Option<(Arc<ModelSpec>, &AdminSpec)> {
        let admin = self.admins.get(model)?;
        Some((self.model(model)?, admin))
    }

    /// Registered models, sorted by name
    pub fn models(&self) -> Vec<Arc<ModelSpec>> {
        let mut models: Vec<_> = self.models.values().cloned().collect();
        models.sort_by(|a, b| a.name().cmp(b.name()));
        models
    }

    pub fn form_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.forms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSpec;
    use crate::schema::RecordSchema;

    fn result_model() -> ModelSpec {
        ModelSpec::new(
            "student_result",
            vec![FieldSpec::text("stud_class").into(), FieldSpec::integer("marks").into()],
        )
        .unwrap()
    }

    #[test]
    fn test_registry_builder() {
        let schema = RecordSchema::new("login", vec![FieldSpec::email("email")]).unwrap();
        let registry = Registry::new()
            .with_form(Form::new(schema))
            .with_model(result_model())
            .with_admin(
                "student_result",
                AdminSpec::new().list_display(&["id", "stud_class", "marks"]),
            )
            .unwrap();

        assert!(registry.form("login").is_some());
        assert!(registry.form("missing").is_none());
        assert_eq!(registry.form_names(), vec!["login"]);
        let (model, admin) = registry.admin("student_result").unwrap();
        assert_eq!(model.name(), "student_result");
        assert_eq!(admin.list_display.len(), 3);
    }

    #[test]
    fn test_admin_requires_model() {
        let result = Registry::new().with_admin("student_result", AdminSpec::new());
        assert_eq!(
            result.unwrap_err(),
            DefinitionError::UnknownModel {
                name: "student_result".into()
            }
        );
    }

    #[test]
    fn test_admin_is_validated() {
        let result = Registry::new()
            .with_model(result_model())
            .with_admin("student_result", AdminSpec::new().list_filter(&["city"]));
        assert!(matches!(result, Err(DefinitionError::UnknownColumn { .. })));
    }

    #[test]
    fn test_replacing_keeps_latest() {
        let registry = Registry::new().with_model(result_model()).with_model(result_model());
        assert_eq!(registry.models().len(), 1);
    }
}
