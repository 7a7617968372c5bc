use serde::{Deserialize, Serialize};

/// Client-side configuration of the hosted identity provider.
///
/// Loaded once at startup and served read-only to the front-end; the API
/// itself never talks to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderConfig {
    #[serde(default, alias = "user_pool_id")]
    pub user_pool_id: String,
    #[serde(default, alias = "user_pool_client_id")]
    pub user_pool_client_id: String,
    #[serde(default, alias = "identity_pool_id")]
    pub identity_pool_id: String,
    #[serde(default = "default_true", alias = "login_with_email")]
    pub login_with_email: bool,
    #[serde(default, alias = "sign_up_verification_method")]
    pub sign_up_verification_method: VerificationMethod,
    #[serde(default = "default_true", alias = "email_required")]
    pub email_required: bool,
    #[serde(default = "default_true", alias = "allow_guest_access")]
    pub allow_guest_access: bool,
    #[serde(default, alias = "password_policy")]
    pub password_policy: PasswordPolicy,
}

impl Default for IdentityProviderConfig {
    fn default() -> Self {
        Self {
            user_pool_id: String::new(),
            user_pool_client_id: String::new(),
            identity_pool_id: String::new(),
            login_with_email: true,
            sign_up_verification_method: VerificationMethod::default(),
            email_required: true,
            allow_guest_access: true,
            password_policy: PasswordPolicy::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    #[default]
    Code,
    Link,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordPolicy {
    #[serde(default = "default_min_length", alias = "min_length")]
    pub min_length: usize,
    #[serde(default = "default_true", alias = "require_lowercase")]
    pub require_lowercase: bool,
    #[serde(default = "default_true", alias = "require_uppercase")]
    pub require_uppercase: bool,
    #[serde(default = "default_true", alias = "require_numbers")]
    pub require_numbers: bool,
    #[serde(default = "default_true", alias = "require_special_characters")]
    pub require_special_characters: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            require_lowercase: true,
            require_uppercase: true,
            require_numbers: true,
            require_special_characters: true,
        }
    }
}

fn default_min_length() -> usize {
    8
}

/// Characters the hosted provider counts as "special".
const SPECIAL_CHARACTERS: &str = "^$*.[]{}()?\"!@#%&/\\,><':;|_~`=+- ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordViolation {
    TooShort,
    MissingLowercase,
    MissingUppercase,
    MissingNumber,
    MissingSpecialCharacter,
}

impl PasswordPolicy {
    /// Returns every rule the password breaks, empty when it is acceptable.
    pub fn check(&self, password: &str) -> Vec<PasswordViolation> {
        let mut violations = Vec::new();

        if password.chars().count() < self.min_length {
            violations.push(PasswordViolation::TooShort);
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            violations.push(PasswordViolation::MissingLowercase);
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            violations.push(PasswordViolation::MissingUppercase);
        }
        if self.require_numbers && !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push(PasswordViolation::MissingNumber);
        }
        if self.require_special_characters && !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c))
        {
            violations.push(PasswordViolation::MissingSpecialCharacter);
        }

        violations
    }
}

#[derive(Debug, Deserialize)]
pub struct PasswordCheckRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordCheckResponse {
    pub valid: bool,
    pub violations: Vec<PasswordViolation>,
}
