//! Authentication and account self-service.
//!
//! Sessions are represented by a [`SessionGrant`]: the authenticated user id
//! and the instant the grant was issued. Grants older than the configured
//! time-to-live are refused, as are grants issued before the user last
//! changed their password.

use std::sync::Arc;

use api_query::Filter;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;
use zeroize::Zeroizing;

use crate::domain::ports::{DocumentStore, PasswordHashError, PasswordHasher};
use crate::domain::user::{PASSWORD_CHANGED_AT_FIELD, PASSWORD_FIELD, Role};
use crate::domain::{
    Collection, Document, DocumentId, Error, ID_FIELD, ValidationErrors, format_timestamp,
    parse_timestamp,
};

/// Minimum number of characters in a password.
pub const PASSWORD_MIN_CHARS: usize = 8;

const PASSWORD_UPDATE_REDIRECT: &str =
    "This route is not for password updates. Please use /updateMyPassword.";

impl From<PasswordHashError> for Error {
    fn from(err: PasswordHashError) -> Self {
        Self::internal("Password hashing failed").with_cause(&err)
    }
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed, lower-cased and non-empty.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use tour_booking::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(Some(" Laura@Example.com "), Some("pass1234"))
///     .expect("credentials");
/// assert_eq!(creds.email(), "laura@example.com");
/// assert_eq!(creds.password(), "pass1234");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from optional raw inputs.
    ///
    /// # Errors
    /// Returns `invalid_request` when either value is missing or blank.
    pub fn try_from_parts(email: Option<&str>, password: Option<&str>) -> Result<Self, Error> {
        let email = email.map(str::trim).filter(|email| !email.is_empty());
        let password = password.filter(|password| !password.is_empty());
        match (email, password) {
            (Some(email), Some(password)) => Ok(Self {
                email: email.to_lowercase(),
                password: Zeroizing::new(password.to_owned()),
            }),
            _ => Err(Error::invalid_request("Please provide email and password!")),
        }
    }

    /// Normalised e-mail address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// A new password and its confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPassword {
    password: Zeroizing<String>,
}

impl NewPassword {
    /// Check the password policy.
    ///
    /// # Errors
    /// Returns `validation_failed` listing every broken rule.
    pub fn try_new(password: Option<&str>, confirm: Option<&str>) -> Result<Self, Error> {
        let mut errors = ValidationErrors::default();
        let password = password.unwrap_or_default();
        if password.is_empty() {
            errors.push(PASSWORD_FIELD, "Please provide a password");
        } else if password.chars().count() < PASSWORD_MIN_CHARS {
            errors.push(PASSWORD_FIELD, "Password must have at least 8 characters");
        }
        match confirm {
            None => errors.push("passwordConfirm", "Please confirm your password"),
            Some(confirm) if confirm != password => {
                errors.push("passwordConfirm", "Passwords are not the same!");
            }
            Some(_) => {}
        }
        if errors.is_empty() {
            Ok(Self {
                password: Zeroizing::new(password.to_owned()),
            })
        } else {
            Err(Error::validation_failed(errors.to_string()).with_details(errors.to_details()))
        }
    }

    /// The accepted plaintext.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.password.as_str()
    }
}

/// Sign-up payload. Roles cannot be chosen at sign-up.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    /// Display name.
    pub name: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
    /// Checked password.
    pub password: NewPassword,
}

/// Proof of a successful authentication, stored in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    /// Authenticated user.
    pub user_id: DocumentId,
    /// Instant the grant was issued.
    pub issued_at: DateTime<Utc>,
}

/// A user whose session grant passed every check.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    /// User identifier.
    pub id: DocumentId,
    /// Authorisation role.
    pub role: Role,
    /// Client-facing user document.
    pub profile: Document,
}

/// Outcome of a sign-up, login or password change.
#[derive(Debug, Clone, PartialEq)]
pub struct Authenticated {
    /// Client-facing user document.
    pub user: Document,
    /// Grant to persist in the session.
    pub grant: SessionGrant,
}

/// Authentication use-cases over the user collection.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn DocumentStore>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
    session_ttl: TimeDelta,
}

impl AuthService {
    /// Create the service.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
        session_ttl: TimeDelta,
    ) -> Self {
        Self {
            store,
            hasher,
            clock,
            session_ttl,
        }
    }

    fn grant(&self, user: &Document) -> Result<SessionGrant, Error> {
        let user_id = DocumentId::of(user)
            .ok_or_else(|| Error::internal("stored user has no identifier"))?;
        Ok(SessionGrant {
            user_id,
            issued_at: self.clock.utc(),
        })
    }

    fn conceal(mut user: Document) -> Document {
        user.remove(PASSWORD_FIELD);
        user.remove(PASSWORD_CHANGED_AT_FIELD);
        user
    }

    async fn find_user(&self, id: DocumentId, reveal: &[&'static str]) -> Result<Option<Document>, Error> {
        Ok(self
            .store
            .find_one(Collection::Users, &Filter::by(ID_FIELD, id.to_string()), reveal)
            .await?)
    }

    async fn patch_user(&self, id: DocumentId, patch: Value) -> Result<Document, Error> {
        let Value::Object(patch) = patch else {
            return Err(Error::internal("user patch is not an object"));
        };
        self.store
            .update_by_id(Collection::Users, id, patch)
            .await?
            .ok_or_else(|| Error::not_found("No user found with that ID"))
    }

    /// Register a new user with the `user` role.
    ///
    /// # Errors
    /// Returns validation and conflict failures from the store.
    pub async fn signup(&self, request: SignupRequest) -> Result<Authenticated, Error> {
        let hash = self.hasher.hash(request.password.as_str())?;
        let body = json!({
            "name": request.name,
            "email": request.email,
            "password": hash,
        });
        let Value::Object(body) = body else {
            return Err(Error::internal("sign-up body is not an object"));
        };
        let user = self.store.insert(Collection::Users, body).await?;
        let grant = self.grant(&user)?;
        info!(user_id = %grant.user_id, "user signed up");
        Ok(Authenticated {
            user: Self::conceal(user),
            grant,
        })
    }

    /// Check credentials against the stored hash.
    ///
    /// # Errors
    /// Returns `unauthorized` without saying which part was wrong.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Authenticated, Error> {
        let incorrect = || Error::unauthorized("Incorrect email or password");
        let user = self
            .store
            .find_one(
                Collection::Users,
                &Filter::by("email", credentials.email()),
                &[PASSWORD_FIELD],
            )
            .await?
            .ok_or_else(incorrect)?;
        let hash = user
            .get(PASSWORD_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(incorrect)?;
        if !self.hasher.verify(credentials.password(), hash)? {
            return Err(incorrect());
        }
        let grant = self.grant(&user)?;
        info!(user_id = %grant.user_id, "user logged in");
        Ok(Authenticated {
            user: Self::conceal(user),
            grant,
        })
    }

    /// Resolve the user behind a session grant.
    ///
    /// # Errors
    /// Returns `unauthorized` when there is no grant, the user is gone or
    /// changed their password after the grant, and `credentials_expired`
    /// when the grant outlived the session time-to-live.
    pub async fn authorize(&self, grant: Option<SessionGrant>) -> Result<AuthenticatedUser, Error> {
        let grant = grant.ok_or_else(|| {
            Error::unauthorized("You are not logged in! Please log in to get access.")
        })?;
        if grant.issued_at + self.session_ttl < self.clock.utc() {
            return Err(Error::credentials_expired(
                "Your token has been expired! Please log in again",
            ));
        }
        let user = self
            .find_user(grant.user_id, &[PASSWORD_CHANGED_AT_FIELD])
            .await?
            .ok_or_else(|| {
                Error::unauthorized("The user belonging to this token does no longer exist.")
            })?;
        let changed_at = user
            .get(PASSWORD_CHANGED_AT_FIELD)
            .and_then(Value::as_str)
            .and_then(parse_timestamp);
        if changed_at.is_some_and(|changed| changed > grant.issued_at) {
            return Err(Error::unauthorized(
                "User recently changed password! Please log in again.",
            ));
        }
        let role = Role::of(&user).unwrap_or(Role::User);
        Ok(AuthenticatedUser {
            id: grant.user_id,
            role,
            profile: Self::conceal(user),
        })
    }

    /// Require one of `roles`.
    ///
    /// # Errors
    /// Returns `forbidden` when the user's role is not listed.
    pub fn restrict_to(user: &AuthenticatedUser, roles: &[Role]) -> Result<(), Error> {
        if roles.contains(&user.role) {
            Ok(())
        } else {
            Err(Error::forbidden(
                "You do not have permission to perform this action",
            ))
        }
    }

    /// Change the password of a logged-in user after checking the current
    /// one, issuing a fresh grant.
    ///
    /// # Errors
    /// Returns `unauthorized` when the current password is wrong.
    pub async fn update_password(
        &self,
        user: &AuthenticatedUser,
        current: Option<&str>,
        new_password: NewPassword,
    ) -> Result<Authenticated, Error> {
        let stored = self
            .find_user(user.id, &[PASSWORD_FIELD])
            .await?
            .ok_or_else(|| {
                Error::unauthorized("The user belonging to this token does no longer exist.")
            })?;
        let hash = stored
            .get(PASSWORD_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !self.hasher.verify(current.unwrap_or_default(), hash)? {
            return Err(Error::unauthorized("Your current password is wrong."));
        }
        let changed_at = self.clock.utc() - TimeDelta::seconds(1);
        let updated = self
            .patch_user(
                user.id,
                json!({
                    PASSWORD_FIELD: self.hasher.hash(new_password.as_str())?,
                    PASSWORD_CHANGED_AT_FIELD: format_timestamp(changed_at),
                }),
            )
            .await?;
        let grant = self.grant(&updated)?;
        info!(user_id = %user.id, "password changed");
        Ok(Authenticated {
            user: Self::conceal(updated),
            grant,
        })
    }

    /// Update the name and e-mail of a logged-in user. Other fields in
    /// `body` are ignored.
    ///
    /// # Errors
    /// Rejects password fields; returns validation and conflict failures.
    pub async fn update_me(&self, user: &AuthenticatedUser, body: &Document) -> Result<Document, Error> {
        if body.contains_key(PASSWORD_FIELD) || body.contains_key("passwordConfirm") {
            return Err(Error::invalid_request(PASSWORD_UPDATE_REDIRECT));
        }
        let patch: Document = body
            .iter()
            .filter(|(field, _)| matches!(field.as_str(), "name" | "email"))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        self.patch_user(user.id, Value::Object(patch)).await
    }

    /// Deactivate a logged-in user; inactive users disappear from finds.
    ///
    /// # Errors
    /// Returns store failures.
    pub async fn deactivate(&self, user: &AuthenticatedUser) -> Result<(), Error> {
        self.patch_user(user.id, json!({ "active": false })).await?;
        info!(user_id = %user.id, "user deactivated");
        Ok(())
    }
}
