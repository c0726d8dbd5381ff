//! User accounts: registration, profile edits and admin lifecycle.
//!
//! Uniqueness of usernames and emails spans all accounts and is enforced by
//! the caller against the account store; everything else is checked here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dreambook_core::{DomainError, DomainResult, UserId, impl_entity};

use crate::password::validate_password_strength;
use crate::roles::{AccountRole, Role};

pub const MAX_USERNAME_LENGTH: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    /// Lower-cased.
    pub email: String,
    pub phone_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: AccountRole,
    pub is_active: bool,
    pub is_staff: bool,
    /// PHC-formatted argon2 hash.
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl_entity!(UserAccount, UserId);

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<AccountRole>,
}

impl RegisterUser {
    /// Field-level checks. Self-service registration may not pick `admin`.
    pub fn validate(&self, allow_admin: bool) -> DomainResult<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        if self.password != self.password2 {
            return Err(DomainError::validation("password fields didn't match"));
        }
        validate_password_strength(&self.password)?;
        if !allow_admin && self.role == Some(AccountRole::Admin) {
            return Err(DomainError::validation(
                "role must be guest or landlord",
            ));
        }
        Ok(())
    }
}

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

fn validate_username(username: &str) -> DomainResult<()> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DomainError::validation("username cannot be empty"));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(DomainError::validation(format!(
            "username cannot exceed {MAX_USERNAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::validation("invalid email format")),
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserAccount {
    /// Build a new account from a validated registration.
    pub fn register(
        cmd: &RegisterUser,
        password_hash: String,
        allow_admin: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        cmd.validate(allow_admin)?;
        let role = cmd.role.unwrap_or_default();

        Ok(Self {
            id: UserId::new(),
            username: cmd.username.trim().to_string(),
            email: normalize_email(&cmd.email),
            phone_number: cmd.phone_number.clone().filter(|p| !p.trim().is_empty()),
            first_name: cmd.first_name.trim().to_string(),
            last_name: cmd.last_name.trim().to_string(),
            role,
            is_active: true,
            is_staff: role == AccountRole::Admin,
            password_hash,
            date_joined: now,
            last_login: None,
        })
    }

    /// `"first last"` when both names are set, otherwise the username.
    pub fn display_name(&self) -> String {
        if !self.first_name.is_empty() && !self.last_name.is_empty() {
            format!("{} {}", self.first_name, self.last_name)
        } else {
            self.username.clone()
        }
    }

    pub fn roles(&self) -> Vec<Role> {
        vec![self.role.role()]
    }

    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }

    pub fn apply_profile(&mut self, update: &UpdateProfile) -> DomainResult<()> {
        if let Some(email) = &update.email {
            validate_email(email)?;
            self.email = normalize_email(email);
        }
        if let Some(phone) = &update.phone_number {
            let phone = phone.trim();
            self.phone_number = (!phone.is_empty()).then(|| phone.to_string());
        }
        if let Some(first) = &update.first_name {
            self.first_name = first.trim().to_string();
        }
        if let Some(last) = &update.last_name {
            self.last_name = last.trim().to_string();
        }
        Ok(())
    }

    /// Changing to `admin` also grants staff status; leaving it revokes it.
    pub fn change_role(&mut self, role: AccountRole) {
        self.role = role;
        self.is_staff = role == AccountRole::Admin;
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login = Some(now);
    }
}
