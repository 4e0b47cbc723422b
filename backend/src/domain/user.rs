//! User collection schema and roles.
//!
//! Stored users carry a password hash, never the plaintext. Inactive users
//! are invisible to every find, so a deactivated account behaves as if it
//! had been deleted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::ports::{CollectionSchema, FieldKind, WriteKind};
use crate::domain::schema_rules as rules;
use crate::domain::{Collection, Document, ValidationErrors};

/// Field holding the password hash.
pub const PASSWORD_FIELD: &str = "password";

/// Field recording when the password last changed.
pub const PASSWORD_CHANGED_AT_FIELD: &str = "passwordChangedAt";

/// Photo assigned to users that never uploaded one.
pub const DEFAULT_PHOTO: &str = "default.jpg";

/// Authorisation role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Regular customer.
    User,
    /// Tour guide.
    Guide,
    /// Lead guide; manages tours.
    LeadGuide,
    /// Administrator.
    Admin,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Guide => "guide",
            Self::LeadGuide => "lead-guide",
            Self::Admin => "admin",
        }
    }

    /// Read the role stored on a user document.
    #[must_use]
    pub fn of(document: &Document) -> Option<Self> {
        document
            .get("role")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "guide" => Ok(Self::Guide),
            "lead-guide" => Ok(Self::LeadGuide),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

const ROLE_NAMES: [&str; 4] = [
    Role::User.as_str(),
    Role::Guide.as_str(),
    Role::LeadGuide.as_str(),
    Role::Admin.as_str(),
];

/// Loose address check: one `@` with non-empty local part and a dotted
/// domain, no whitespace.
#[must_use]
pub fn is_valid_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !raw.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Schema hooks for [`Collection::Users`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UserSchema;

impl UserSchema {
    fn validate(document: &Document) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        rules::required_text(document, "name", "Please tell us your name!", &mut errors);
        let email =
            rules::required_text(document, "email", "Please provide your email", &mut errors);
        if email.is_some_and(|email| !is_valid_email(email)) {
            errors.push("email", "Please provide a valid email");
        }
        rules::text(document, "photo", &mut errors);
        rules::one_of(
            document,
            "role",
            &ROLE_NAMES,
            "Role is either: user, guide, lead-guide or admin",
            &mut errors,
        );
        rules::required_text(
            document,
            PASSWORD_FIELD,
            "Please provide a password",
            &mut errors,
        );
        rules::timestamp(document, PASSWORD_CHANGED_AT_FIELD, &mut errors);
        rules::boolean(document, "active", &mut errors);
        errors
    }
}

impl CollectionSchema for UserSchema {
    fn collection(&self) -> Collection {
        Collection::Users
    }

    fn prepare(
        &self,
        document: &mut Document,
        write: WriteKind<'_>,
        _now: DateTime<Utc>,
    ) -> Result<(), ValidationErrors> {
        if write == WriteKind::Create {
            rules::set_default(document, "photo", json!(DEFAULT_PHOTO));
            rules::set_default(document, "role", json!(Role::User.as_str()));
            rules::set_default(document, "active", json!(true));
        }
        rules::trim_text(document, "name");
        if let Some(Value::String(email)) = document.get_mut("email") {
            *email = email.trim().to_lowercase();
        }
        rules::canonical_timestamp(document, PASSWORD_CHANGED_AT_FIELD);
        Self::validate(document).into_result()
    }

    fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        &[&["email"]]
    }

    fn field_kind(&self, field: &str) -> FieldKind {
        match field {
            "active" => FieldKind::Boolean,
            PASSWORD_CHANGED_AT_FIELD => FieldKind::Timestamp,
            _ => FieldKind::Text,
        }
    }

    fn hidden_fields(&self) -> &'static [&'static str] {
        &[PASSWORD_FIELD, PASSWORD_CHANGED_AT_FIELD, "active"]
    }

    fn is_visible(&self, document: &Document) -> bool {
        document.get("active").and_then(Value::as_bool) != Some(false)
    }
}
