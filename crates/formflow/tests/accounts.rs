// Integration tests for registration, login and password reset

use chrono::Duration;
use formflow::accounts::{Accounts, RegistrationState};
use formflow::config::AccountsConfig;
use formflow::{AccountError, ModelStore, RawInput};
use pretty_assertions::assert_eq;

async fn accounts() -> Accounts {
    let store = ModelStore::connect("sqlite::memory:", 1).await.unwrap();
    let accounts = Accounts::new(store, &AccountsConfig::default()).unwrap();
    accounts.migrate().await.unwrap();
    accounts
}

fn registration(email: &str, password: &str) -> RawInput {
    RawInput::new()
        .with("email", email)
        .with("name", "Samuel")
        .with("password", password)
        .with("confirm_password", password)
}

fn login(email: &str, password: &str) -> RawInput {
    RawInput::new().with("email", email).with("password", password)
}

async fn active_user(accounts: &Accounts, email: &str, password: &str) -> i64 {
    let registered = accounts
        .register(&registration(email, password))
        .await
        .unwrap()
        .ok()
        .unwrap();
    accounts.activate(registered.user.id).await.unwrap();
    registered.user.id
}

#[tokio::test]
async fn test_registration_stores_inactive_user() {
    let accounts = accounts().await;

    let registered = accounts
        .register(&registration("Sam@Example.com", "longenough"))
        .await
        .unwrap()
        .ok()
        .unwrap();

    assert_eq!(registered.state, RegistrationState::Inactive);
    assert_eq!(registered.user.text("email"), Some("Sam@example.com"));
    assert!(registered.user.text("password").unwrap().starts_with("$argon2id$"));
    assert!(!registered.user.flag("is_superuser"));
}

#[tokio::test]
async fn test_registration_errors_are_returned_as_context() {
    let accounts = accounts().await;

    let raw = RawInput::new()
        .with("email", "not-an-email")
        .with("name", "Samuel")
        .with("password", "longenough")
        .with("confirm_password", "different!");
    let context = accounts.register(&raw).await.unwrap().err().unwrap();

    assert!(context.has_error("email"));
    assert!(context.has_error("confirm_password"));
    assert_eq!(context.get_value("email"), Some("not-an-email"));
    assert_eq!(context.get_value("password"), Some(""));
}

#[tokio::test]
async fn test_duplicate_email_is_a_field_error() {
    let accounts = accounts().await;
    accounts
        .register(&registration("sam@example.com", "longenough"))
        .await
        .unwrap();

    let context = accounts
        .register(&registration("sam@example.com", "longenough"))
        .await
        .unwrap()
        .err()
        .unwrap();
    assert_eq!(context.get_error("email"), Some("User with this Email already exists."));
}

#[tokio::test]
async fn test_login_requires_active_user_and_right_password() {
    let accounts = accounts().await;
    let registered = accounts
        .register(&registration("sam@example.com", "longenough"))
        .await
        .unwrap()
        .ok()
        .unwrap();

    assert!(matches!(
        accounts.login(&login("sam@example.com", "longenough")).await,
        Err(AccountError::InvalidCredentials)
    ));

    accounts.activate(registered.user.id).await.unwrap();

    let user = accounts
        .login(&login("sam@example.com", "longenough"))
        .await
        .unwrap()
        .ok()
        .unwrap();
    assert_eq!(user.id, registered.user.id);

    assert!(matches!(
        accounts.login(&login("sam@example.com", "wrong-password")).await,
        Err(AccountError::InvalidCredentials)
    ));
    assert!(matches!(
        accounts.login(&login("nobody@example.com", "longenough")).await,
        Err(AccountError::InvalidCredentials)
    ));

    let invalid = accounts.login(&login("", "")).await.unwrap();
    assert!(invalid.is_invalid());
}

#[tokio::test]
async fn test_password_reset_round() {
    let accounts = accounts().await;
    let id = active_user(&accounts, "sam@example.com", "longenough").await;

    let link = accounts
        .request_password_reset(&RawInput::new().with("email", "sam@example.com"))
        .await
        .unwrap()
        .ok()
        .flatten()
        .unwrap();
    assert_eq!(formflow::hasher::decode_uid(&link.uidb64), Some(id));

    let new_password = RawInput::new()
        .with("new_password1", "brand-new-pass")
        .with("new_password2", "brand-new-pass");
    let user = accounts
        .confirm_password_reset(&link.uidb64, &link.token, &new_password)
        .await
        .unwrap()
        .ok()
        .unwrap();
    assert_eq!(user.id, id);

    assert!(accounts
        .login(&login("sam@example.com", "brand-new-pass"))
        .await
        .unwrap()
        .is_valid());
    assert!(accounts.login(&login("sam@example.com", "longenough")).await.is_err());

    // consumed
    assert!(matches!(
        accounts
            .confirm_password_reset(&link.uidb64, &link.token, &new_password)
            .await,
        Err(AccountError::InvalidResetToken)
    ));
}

#[tokio::test]
async fn test_reset_for_unknown_email_reveals_nothing() {
    let accounts = accounts().await;
    let link = accounts
        .request_password_reset(&RawInput::new().with("email", "nobody@example.com"))
        .await
        .unwrap()
        .ok()
        .unwrap();
    assert_eq!(link, None);
}

#[tokio::test]
async fn test_reset_rejects_bad_links() {
    let accounts = accounts().await;
    let id = active_user(&accounts, "sam@example.com", "longenough").await;
    let other = active_user(&accounts, "kim@example.com", "longenough").await;

    let link = accounts
        .request_password_reset(&RawInput::new().with("email", "sam@example.com"))
        .await
        .unwrap()
        .ok()
        .flatten()
        .unwrap();
    let raw = RawInput::new()
        .with("new_password1", "brand-new-pass")
        .with("new_password2", "brand-new-pass");

    for (uid, token) in [
        ("!!!".to_string(), link.token.clone()),
        (link.uidb64.clone(), "forged".to_string()),
        (formflow::hasher::encode_uid(other), link.token.clone()),
    ] {
        assert!(matches!(
            accounts.confirm_password_reset(&uid, &token, &raw).await,
            Err(AccountError::InvalidResetToken)
        ));
    }

    let mismatch = RawInput::new()
        .with("new_password1", "brand-new-pass")
        .with("new_password2", "other-new-pass");
    let context = accounts
        .confirm_password_reset(&link.uidb64, &link.token, &mismatch)
        .await
        .unwrap()
        .err()
        .unwrap();
    assert!(context.has_error("new_password2"));

    // the token survives a failed form
    assert!(accounts
        .confirm_password_reset(&link.uidb64, &link.token, &raw)
        .await
        .unwrap()
        .is_valid());
    assert_eq!(formflow::hasher::decode_uid(&link.uidb64), Some(id));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let store = ModelStore::connect("sqlite::memory:", 1).await.unwrap();
    let accounts = Accounts::new(store, &AccountsConfig::default())
        .unwrap()
        .with_token_ttl(Duration::seconds(-1));
    accounts.migrate().await.unwrap();
    active_user(&accounts, "sam@example.com", "longenough").await;

    let link = accounts
        .request_password_reset(&RawInput::new().with("email", "sam@example.com"))
        .await
        .unwrap()
        .ok()
        .flatten()
        .unwrap();

    let raw = RawInput::new()
        .with("new_password1", "brand-new-pass")
        .with("new_password2", "brand-new-pass");
    assert!(matches!(
        accounts.confirm_password_reset(&link.uidb64, &link.token, &raw).await,
        Err(AccountError::InvalidResetToken)
    ));
}

fn new_password(password: &str) -> RawInput {
    RawInput::new()
        .with("new_password1", password)
        .with("new_password2", password)
}

async fn reset_link(accounts: &Accounts, email: &str) -> formflow::accounts::ResetLink {
    accounts
        .request_password_reset(&RawInput::new().with("email", email))
        .await
        .unwrap()
        .ok()
        .flatten()
        .unwrap()
}

#[tokio::test]
async fn test_confirm_revokes_older_links() {
    let accounts = accounts().await;
    active_user(&accounts, "sam@example.com", "longenough").await;

    let first = reset_link(&accounts, "sam@example.com").await;
    let second = reset_link(&accounts, "sam@example.com").await;

    assert!(accounts
        .confirm_password_reset(&second.uidb64, &second.token, &new_password("brand-new-pass"))
        .await
        .unwrap()
        .is_valid());

    assert!(matches!(
        accounts
            .confirm_password_reset(&first.uidb64, &first.token, &new_password("attacker-pass"))
            .await,
        Err(AccountError::InvalidResetToken)
    ));
    assert!(accounts
        .login(&login("sam@example.com", "brand-new-pass"))
        .await
        .unwrap()
        .is_valid());
}

#[tokio::test]
async fn test_concurrent_confirms_use_the_token_once() {
    let accounts = accounts().await;
    active_user(&accounts, "sam@example.com", "longenough").await;
    let link = reset_link(&accounts, "sam@example.com").await;

    let first_raw = new_password("first-new-pass");
    let second_raw = new_password("second-new-pass");
    let (first, second) = tokio::join!(
        accounts.confirm_password_reset(&link.uidb64, &link.token, &first_raw),
        accounts.confirm_password_reset(&link.uidb64, &link.token, &second_raw),
    );

    let outcomes = [first, second];
    let succeeded = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Ok(submission) if submission.is_valid()))
        .count();
    let rejected = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Err(AccountError::InvalidResetToken)))
        .count();
    assert_eq!((succeeded, rejected), (1, 1));
}

#[tokio::test]
async fn test_login_rejects_unknown_and_inactive_alike() {
    let accounts = accounts().await;
    accounts
        .register(&registration("idle@example.com", "longenough"))
        .await
        .unwrap();

    for (email, password) in [
        ("nobody@example.com", "longenough"),
        ("idle@example.com", "longenough"),
    ] {
        assert!(matches!(
            accounts.login(&login(email, password)).await,
            Err(AccountError::InvalidCredentials)
        ));
    }
}
