// File: src/accounts.rs
// Purpose: User accounts: registration, activation, login and password reset

use crate::admin::AdminSpec;
use crate::config::AccountsConfig;
use crate::database::ModelStore;
use crate::error::{AccountError, AccountResult, DefinitionError, PersistenceError};
use crate::field::{FieldSpec, Widget};
use crate::form::{Form, Submission};
use crate::form_context::FormContext;
use crate::hasher;
use crate::model::{ColumnSpec, Entity, ModelSpec, StoredValue};
use crate::raw_input::RawInput;
use crate::record::{CleanRecord, ValidationErrors};
use crate::schema::{FormMeta, RecordSchema};
use crate::value::Value;
use chrono::{Duration, Utc};
use formflow_validation::{normalize_email, PasswordPolicy};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const USER_MODEL: &str = "account_user";
pub const RESET_TOKEN_MODEL: &str = "account_password_reset";

const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
const EMAIL_TAKEN: &str = "User with this Email already exists.";

// ============================================================================
// MODELS AND FORMS
// ============================================================================

fn flag(name: &str) -> ColumnSpec {
    ColumnSpec::new(FieldSpec::boolean(name).optional()).default(StoredValue::Integer(0))
}

/// The custom user model: email login, hashed password, role flags
pub fn user_model() -> Result<ModelSpec, DefinitionError> {
    ModelSpec::new(
        USER_MODEL,
        vec![
            ColumnSpec::new(FieldSpec::email("email").max_length(255).label("Email")).unique(),
            FieldSpec::text("name").max_length(200).into(),
            ColumnSpec::new(FieldSpec::text("city").max_length(70)).nullable(),
            ColumnSpec::new(FieldSpec::secret("password")).hashed(),
            flag("is_active"),
            flag("is_staff"),
            flag("is_superuser"),
            flag("is_customer"),
            flag("is_seller"),
        ],
    )
}

/// Issued reset tokens, stored as digests
pub fn reset_token_model() -> Result<ModelSpec, DefinitionError> {
    ModelSpec::new(
        RESET_TOKEN_MODEL,
        vec![
            FieldSpec::integer("user_id").into(),
            ColumnSpec::new(FieldSpec::text("token_hash")).unique(),
            FieldSpec::integer("expires_at").into(),
            flag("used"),
        ],
    )
}

/// Change-list options for users
pub fn user_admin() -> AdminSpec {
    AdminSpec::new()
        .list_display(&[
            "id",
            "email",
            "name",
            "is_active",
            "is_superuser",
            "is_staff",
            "is_customer",
            "is_seller",
        ])
        .list_filter(&["is_superuser"])
        .fieldset(Some("User Credentials"), &["email", "password"])
        .fieldset(Some("Personal Information"), &["name", "city"])
        .fieldset(
            Some("Permissions"),
            &["is_active", "is_staff", "is_superuser", "is_customer", "is_seller"],
        )
        .search_fields(&["email"])
        .ordering(&["email", "id"])
}

fn normalized_email(value: Value) -> Result<Value, String> {
    match value {
        Value::Text(email) => Ok(Value::Text(normalize_email(&email))),
        other => Ok(other),
    }
}

fn policy_cleaner(policy: PasswordPolicy) -> impl Fn(Value) -> Result<Value, String> + Send + Sync {
    move |value| {
        let plain = value.as_secret().map(|s| s.expose()).unwrap_or_default();
        match policy.check(plain) {
            Ok(()) => Ok(value),
            Err(violations) => Err(violations.join(" ")),
        }
    }
}

fn passwords_match(first: &'static str, second: &'static str) -> impl Fn(&CleanRecord, &mut ValidationErrors) + Send + Sync {
    move |record, errors| {
        let a = record.get(first).and_then(Value::as_secret);
        let b = record.get(second).and_then(Value::as_secret);
        if let (Some(a), Some(b)) = (a, b) {
            if !hasher::constant_time_eq(a.expose(), b.expose()) {
                errors.add(second, PASSWORD_MISMATCH);
            }
        }
    }
}

/// email, name, password, confirm_password
pub fn registration_form(model: &ModelSpec, policy: &PasswordPolicy) -> Result<Form, DefinitionError> {
    let meta = FormMeta::new(&["email", "name", "password", "confirm_password"])
        .widget("password", Widget::PasswordInput);
    let declared = vec![
        FieldSpec::secret("password"),
        FieldSpec::secret("confirm_password").label("Confirm Password"),
    ];

    let schema = RecordSchema::from_model(model, &meta, declared)?;
    Ok(Form::new(schema)
        .clean_field("email", normalized_email)?
        .clean_field("password", policy_cleaner(policy.clone()))?
        .clean(passwords_match("password", "confirm_password")))
}

pub fn login_form() -> Result<Form, DefinitionError> {
    let schema = RecordSchema::new(
        "login",
        vec![FieldSpec::email("email"), FieldSpec::secret("password")],
    )?;
    Form::new(schema).clean_field("email", normalized_email)
}

pub fn password_reset_form() -> Result<Form, DefinitionError> {
    let schema = RecordSchema::new("password_reset", vec![FieldSpec::email("email").max_length(254)])?;
    Form::new(schema).clean_field("email", normalized_email)
}

/// new_password1 and new_password2
pub fn set_password_form(policy: &PasswordPolicy) -> Result<Form, DefinitionError> {
    let schema = RecordSchema::new(
        "password_reset_confirm",
        vec![
            FieldSpec::secret("new_password1").label("New password"),
            FieldSpec::secret("new_password2").label("New password confirmation"),
        ],
    )?;
    Ok(Form::new(schema)
        .clean_field("new_password1", policy_cleaner(policy.clone()))?
        .clean(passwords_match("new_password1", "new_password2")))
}

// ============================================================================
// REGISTRATION STATE
// ============================================================================

/// Where a registration is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unsubmitted,
    Submitted,
    Valid,
    Invalid,
    Persisted,
    /// Stored, waiting for external activation
    Inactive,
    Active,
}

impl RegistrationState {
    pub fn name(self) -> &'static str {
        match self {
            RegistrationState::Unsubmitted => "unsubmitted",
            RegistrationState::Submitted => "submitted",
            RegistrationState::Valid => "valid",
            RegistrationState::Invalid => "invalid",
            RegistrationState::Persisted => "persisted",
            RegistrationState::Inactive => "inactive",
            RegistrationState::Active => "active",
        }
    }

    pub fn can_advance(self, to: RegistrationState) -> bool {
        use RegistrationState::*;
        matches!(
            (self, to),
            (Unsubmitted, Submitted)
                | (Submitted, Valid)
                | (Submitted, Invalid)
                | (Invalid, Submitted)
                | (Valid, Persisted)
                | (Persisted, Inactive)
                | (Inactive, Active)
        )
    }

    pub fn advance(self, to: RegistrationState) -> AccountResult<RegistrationState> {
        if self.can_advance(to) {
            Ok(to)
        } else {
            Err(AccountError::InvalidTransition {
                from: self.name(),
                to: to.name(),
            })
        }
    }

    /// State of a stored user
    pub fn of_user(user: &Entity) -> RegistrationState {
        if user.flag("is_active") {
            RegistrationState::Active
        } else {
            RegistrationState::Inactive
        }
    }
}

/// A freshly stored registration
#[derive(Debug, Clone)]
pub struct Registered {
    pub user: Entity,
    pub state: RegistrationState,
}

/// What the caller delivers to the user to reset a password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetLink {
    pub uidb64: String,
    pub token: String,
    /// Unix timestamp (seconds)
    pub expires_at: i64,
}

impl ResetLink {
    /// Path of the confirm endpoint for this link
    pub fn path(&self) -> String {
        format!("/account/password_reset_confirm/{}/{}", self.uidb64, self.token)
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// Account flows over a model store
#[derive(Debug)]
pub struct Accounts {
    store: ModelStore,
    users: Arc<ModelSpec>,
    tokens: ModelSpec,
    registration: Form,
    login: Form,
    reset: Form,
    set_password: Form,
    token_ttl: Duration,
}

impl Accounts {
    pub fn new(store: ModelStore, config: &AccountsConfig) -> Result<Self, DefinitionError> {
        let policy = PasswordPolicy::min_length(config.password_min_length);
        let users = user_model()?;

        Ok(Self {
            registration: registration_form(&users, &policy)?,
            login: login_form()?,
            reset: password_reset_form()?,
            set_password: set_password_form(&policy)?,
            users: Arc::new(users),
            tokens: reset_token_model()?,
            store,
            token_ttl: Duration::minutes(config.reset_token_ttl_minutes),
        })
    }

    /// Override how long reset tokens stay valid
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Create the account tables if they do not exist
    pub async fn migrate(&self) -> AccountResult<()> {
        self.store.migrate(&[self.users.as_ref(), &self.tokens]).await?;
        Ok(())
    }

    pub fn user_model(&self) -> Arc<ModelSpec> {
        Arc::clone(&self.users)
    }

    pub fn registration_form(&self) -> &Form {
        &self.registration
    }

    /// Validate a registration and store the user as inactive
    ///
    /// A taken email is reported as a field error, not a failure.
    pub async fn register(&self, raw: &RawInput) -> AccountResult<Submission<Registered>> {
        let state = RegistrationState::Unsubmitted.advance(RegistrationState::Submitted)?;

        let record = match self.registration.run(raw) {
            Ok(record) => record,
            Err(errors) => {
                state.advance(RegistrationState::Invalid)?;
                return Ok(Submission::Invalid(FormContext::new(
                    self.registration.schema(),
                    raw,
                    errors,
                )));
            }
        };
        let state = state.advance(RegistrationState::Valid)?;

        let user = match self.store.create(&self.users, &record).await {
            Ok(user) => user,
            Err(PersistenceError::Conflict { .. }) => {
                let mut errors = ValidationErrors::new();
                errors.add("email", EMAIL_TAKEN);
                return Ok(Submission::Invalid(FormContext::new(
                    self.registration.schema(),
                    raw,
                    errors,
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let state = state
            .advance(RegistrationState::Persisted)?
            .advance(RegistrationState::Inactive)?;

        info!(user_id = user.id, "user registered, awaiting activation");
        Ok(Submission::Valid(Registered { user, state }))
    }

    /// Mark a user active; called by the external activation step
    pub async fn activate(&self, user_id: i64) -> AccountResult<Entity> {
        let user = self.user(user_id).await?;
        RegistrationState::of_user(&user).advance(RegistrationState::Active)?;

        self.store
            .set_column(&self.users, user_id, "is_active", StoredValue::Integer(1))
            .await?;
        info!(user_id, "user activated");
        self.user(user_id).await
    }

    /// Check email and password of an active user
    ///
    /// Unknown email, wrong password and inactive account all give
    /// [`AccountError::InvalidCredentials`].
    pub async fn login(&self, raw: &RawInput) -> AccountResult<Submission<Entity>> {
        let record = match self.login.run_with_context(raw) {
            Ok(record) => record,
            Err(context) => return Ok(Submission::Invalid(context)),
        };

        let email = record.text("email").unwrap_or_default();
        let password = record
            .get("password")
            .and_then(Value::as_secret)
            .map(|s| s.expose())
            .unwrap_or_default();

        let user = self
            .store
            .find_by(&self.users, "email", StoredValue::Text(email.to_string()))
            .await?;

        // Unknown emails pay for a hash check too
        let verified = match &user {
            Some(user) => hasher::verify_password(password, user.text("password").unwrap_or_default()),
            None => hasher::verify_password_against_dummy(password),
        };

        match user {
            Some(user) if verified && user.flag("is_active") => {
                info!(user_id = user.id, "login succeeded");
                Ok(Submission::Valid(user))
            }
            _ => {
                warn!("login rejected");
                Err(AccountError::InvalidCredentials)
            }
        }
    }

    /// Issue a reset link for an active user's email
    ///
    /// `None` when no active user has that email; callers answer the same
    /// way in both cases.
    pub async fn request_password_reset(
        &self,
        raw: &RawInput,
    ) -> AccountResult<Submission<Option<ResetLink>>> {
        let record = match self.reset.run_with_context(raw) {
            Ok(record) => record,
            Err(context) => return Ok(Submission::Invalid(context)),
        };
        let email = record.text("email").unwrap_or_default();

        let user = self
            .store
            .find_by(&self.users, "email", StoredValue::Text(email.to_string()))
            .await?
            .filter(|user| user.flag("is_active"));

        let Some(user) = user else {
            info!("password reset requested for unknown or inactive email");
            return Ok(Submission::Valid(None));
        };

        let token = hasher::generate_token();
        let expires_at = (Utc::now() + self.token_ttl).timestamp();
        let row = vec![
            ("user_id".to_string(), StoredValue::Integer(user.id)),
            ("token_hash".to_string(), StoredValue::Text(hasher::hash_token(&token))),
            ("expires_at".to_string(), StoredValue::Integer(expires_at)),
            ("used".to_string(), StoredValue::Integer(0)),
        ];
        self.store.insert_row(&self.tokens, row).await?;

        info!(user_id = user.id, "password reset token issued");
        Ok(Submission::Valid(Some(ResetLink {
            uidb64: hasher::encode_uid(user.id),
            token,
            expires_at,
        })))
    }

    /// Set a new password using a reset link
    ///
    /// The token is consumed along with every other outstanding token of the user.
    pub async fn confirm_password_reset(
        &self,
        uidb64: &str,
        token: &str,
        raw: &RawInput,
    ) -> AccountResult<Submission<Entity>> {
        let user_id = hasher::decode_uid(uidb64).ok_or(AccountError::InvalidResetToken)?;
        let issued = self.live_token(user_id, token).await?;

        let record = match self.set_password.run_with_context(raw) {
            Ok(record) => record,
            Err(context) => return Ok(Submission::Invalid(context)),
        };
        let new_password = record
            .get("new_password1")
            .and_then(Value::as_secret)
            .map(|s| s.expose())
            .unwrap_or_default();

        let hash = hasher::hash_password(new_password)?;

        // Claim the token atomically; a concurrent confirm loses here
        let claimed = self
            .store
            .update_where(
                &self.tokens,
                &[("used".to_string(), StoredValue::Integer(1))],
                &[("id", StoredValue::Integer(issued.id)), ("used", StoredValue::Integer(0))],
            )
            .await?;
        if claimed == 0 {
            warn!(user_id, "password reset token already used");
            return Err(AccountError::InvalidResetToken);
        }

        let updated = self
            .store
            .set_column(&self.users, user_id, "password", StoredValue::Text(hash))
            .await?;
        if !updated {
            return Err(AccountError::InvalidResetToken);
        }

        // Older links die with the password they were meant to replace
        let revoked = self
            .store
            .update_where(
                &self.tokens,
                &[("used".to_string(), StoredValue::Integer(1))],
                &[("user_id", StoredValue::Integer(user_id)), ("used", StoredValue::Integer(0))],
            )
            .await?;
        if revoked > 0 {
            debug!(user_id, revoked, "revoked outstanding reset tokens");
        }

        info!(user_id, "password reset completed");
        Ok(Submission::Valid(self.user(user_id).await?))
    }

    /// The unused, unexpired token row matching `token` for `user_id`
    async fn live_token(&self, user_id: i64, token: &str) -> AccountResult<Entity> {
        let digest = hasher::hash_token(token);
        let issued = self
            .store
            .find_by(&self.tokens, "token_hash", StoredValue::Text(digest.clone()))
            .await?
            .ok_or(AccountError::InvalidResetToken)?;

        let stored = issued.text("token_hash").unwrap_or_default();
        let live = hasher::constant_time_eq(stored, &digest)
            && issued.integer("user_id") == Some(user_id)
            && !issued.flag("used")
            && issued.integer("expires_at").unwrap_or(0) > Utc::now().timestamp();

        if live {
            Ok(issued)
        } else {
            warn!(user_id, "rejected password reset token");
            Err(AccountError::InvalidResetToken)
        }
    }

    async fn user(&self, user_id: i64) -> AccountResult<Entity> {
        self.store
            .get(&self.users, user_id)
            .await?
            .ok_or_else(|| {
                PersistenceError::NotFound {
                    model: USER_MODEL.to_string(),
                    id: user_id,
                }
                .into()
            })
    }
}
