//! Password policy checks
//!
//! The policy only judges the shape of a secret; hashing happens in the
//! persistence layer.

/// Password requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
        }
    }
}

impl PasswordPolicy {
    /// Policy with only a minimum length
    pub fn min_length(min_length: usize) -> Self {
        Self {
            min_length,
            ..Self::default()
        }
    }

    /// Every rule the password breaks, in a stable order
    pub fn violations(&self, password: &str) -> Vec<String> {
        let checks = [
            (
                password.chars().count() >= self.min_length,
                format!("Password must be at least {} characters", self.min_length),
            ),
            (
                !self.require_uppercase || password.chars().any(char::is_uppercase),
                "Password must contain an uppercase letter".to_string(),
            ),
            (
                !self.require_lowercase || password.chars().any(char::is_lowercase),
                "Password must contain a lowercase letter".to_string(),
            ),
            (
                !self.require_digit || password.chars().any(|c| c.is_ascii_digit()),
                "Password must contain a digit".to_string(),
            ),
            (
                !self.require_special || password.chars().any(|c| !c.is_alphanumeric()),
                "Password must contain a special character".to_string(),
            ),
        ];

        checks
            .into_iter()
            .filter(|(passed, _)| !passed)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn check(&self, password: &str) -> Result<(), Vec<String>> {
        let violations = self.violations(password);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
