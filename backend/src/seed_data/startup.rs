//! Startup seeding orchestration.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::{ambient_authority, fs::Dir};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

use crate::domain::NewPassword;
use crate::domain::ports::{DocumentStore, PasswordHasher};
use crate::domain::review::reviewed_tour;
use crate::domain::user::PASSWORD_FIELD;
use crate::domain::{Collection, Document, Error, RatingsAggregator};
use crate::seed_data::config::DevDataSettings;

const TOURS_FILE: &str = "tours.json";
const USERS_FILE: &str = "users.json";
const REVIEWS_FILE: &str = "reviews.json";

/// Errors returned while executing startup seeding.
#[derive(Debug, Error)]
pub enum StartupSeedingError {
    /// A fixture file could not be read.
    #[error("failed to read fixture at {path}: {source}")]
    FileRead {
        /// Path to the fixture file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A fixture file is not a JSON array of objects.
    #[error("fixture at {path} is not a list of documents: {source}")]
    Parse {
        /// Path to the fixture file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// A fixture document was rejected.
    #[error("dev data seeding error: {0}")]
    Seeding(#[from] Error),
}

/// Documents written by one seeding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOutcome {
    /// Tours inserted.
    pub tours: usize,
    /// Users inserted.
    pub users: usize,
    /// Reviews inserted.
    pub reviews: usize,
}

/// Load the development fixtures into `store` when enabled.
///
/// Tours go in first, then users with hashed passwords, then reviews. The
/// rating aggregates of every reviewed tour are recomputed at the end.
///
/// # Errors
/// Fails on unreadable fixtures, malformed JSON or rejected documents.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use mockable::DefaultClock;
/// use tour_booking::outbound::persistence::InMemoryDocumentStore;
/// use tour_booking::outbound::security::Argon2PasswordHasher;
/// use tour_booking::seed_data::{DevDataSettings, seed_dev_data_on_startup};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = DevDataSettings {
///     enabled: false,
///     data_dir: None,
/// };
/// let store = Arc::new(InMemoryDocumentStore::with_default_schemas(Arc::new(DefaultClock)));
/// let outcome = seed_dev_data_on_startup(&settings, store, &Argon2PasswordHasher::new()).await?;
/// assert!(outcome.is_none());
/// # Ok(())
/// # }
/// ```
pub async fn seed_dev_data_on_startup(
    settings: &DevDataSettings,
    store: Arc<dyn DocumentStore>,
    hasher: &dyn PasswordHasher,
) -> Result<Option<SeedOutcome>, StartupSeedingError> {
    if !settings.enabled {
        info!(reason = "disabled", "dev data seeding skipped");
        return Ok(None);
    }

    let data_dir = settings.data_dir();
    let dir = Dir::open_ambient_dir(&data_dir, ambient_authority()).map_err(|source| {
        StartupSeedingError::FileRead {
            path: data_dir.clone(),
            source,
        }
    })?;
    let tours = load_documents(&dir, &data_dir, TOURS_FILE)?;
    let users = load_documents(&dir, &data_dir, USERS_FILE)?;
    let reviews = load_documents(&dir, &data_dir, REVIEWS_FILE)?;

    let outcome = SeedOutcome {
        tours: tours.len(),
        users: users.len(),
        reviews: reviews.len(),
    };
    insert_all(store.as_ref(), Collection::Tours, tours).await?;
    let users = users
        .into_iter()
        .map(|user| with_hashed_password(user, hasher))
        .collect::<Result<Vec<_>, _>>()?;
    insert_all(store.as_ref(), Collection::Users, users).await?;

    let reviewed: BTreeSet<_> = reviews.iter().filter_map(reviewed_tour).collect();
    insert_all(store.as_ref(), Collection::Reviews, reviews).await?;
    let aggregator = RatingsAggregator::new(store);
    for tour in reviewed {
        aggregator.recalculate(tour).await?;
    }

    info!(
        data_dir = %data_dir.display(),
        tours = outcome.tours,
        users = outcome.users,
        reviews = outcome.reviews,
        "dev data seeding applied"
    );
    Ok(Some(outcome))
}

fn load_documents(
    dir: &Dir,
    data_dir: &Path,
    file_name: &str,
) -> Result<Vec<Document>, StartupSeedingError> {
    let path = data_dir.join(file_name);
    let payload = dir
        .read(Path::new(file_name))
        .map_err(|source| StartupSeedingError::FileRead {
            path: path.clone(),
            source,
        })?;
    serde_json::from_slice(&payload).map_err(|source| StartupSeedingError::Parse { path, source })
}

fn with_hashed_password(
    mut user: Document,
    hasher: &dyn PasswordHasher,
) -> Result<Document, Error> {
    let password = NewPassword::try_new(
        user.get(PASSWORD_FIELD).and_then(Value::as_str),
        user.get("passwordConfirm").and_then(Value::as_str),
    )?;
    let hash = hasher.hash(password.as_str())?;
    user.remove("passwordConfirm");
    user.insert(PASSWORD_FIELD.to_owned(), json!(hash));
    Ok(user)
}

async fn insert_all(
    store: &dyn DocumentStore,
    collection: Collection,
    documents: Vec<Document>,
) -> Result<(), Error> {
    for document in documents {
        store.insert(collection, document).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Coverage for fixture loading and ordering.

    use super::*;
    use crate::domain::ErrorCode;
    use crate::outbound::persistence::InMemoryDocumentStore;
    use crate::test_support::PlainTextHasher;
    use crate::test_support::cap_fs::write_file;
    use api_query::Filter;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> Arc<InMemoryDocumentStore> {
        Arc::new(InMemoryDocumentStore::with_default_schemas(Arc::new(
            DefaultClock,
        )))
    }

    fn enabled(data_dir: Option<PathBuf>) -> DevDataSettings {
        DevDataSettings {
            enabled: true,
            data_dir,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn disabled_seeding_leaves_the_store_empty(store: Arc<InMemoryDocumentStore>) {
        let settings = DevDataSettings {
            enabled: false,
            data_dir: Some(PathBuf::from("/nonexistent")),
        };
        let outcome = seed_dev_data_on_startup(&settings, store.clone(), &PlainTextHasher)
            .await
            .expect("skipped");
        assert!(outcome.is_none());
        let tours = store
            .count(Collection::Tours, &Filter::all())
            .await
            .expect("count");
        assert_eq!(tours, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn bundled_fixtures_seed_every_collection(store: Arc<InMemoryDocumentStore>) {
        let outcome = seed_dev_data_on_startup(&enabled(None), store.clone(), &PlainTextHasher)
            .await
            .expect("seeded")
            .expect("enabled");
        assert_eq!(
            outcome,
            SeedOutcome {
                tours: 4,
                users: 5,
                reviews: 3
            }
        );

        let forest = store
            .find_one(
                Collection::Tours,
                &Filter::by("name", "The Forest Hiker"),
                &[],
            )
            .await
            .expect("find")
            .expect("tour present");
        assert_eq!(forest["ratingsQuantity"], json!(2));
        assert_eq!(forest["ratingsAverage"], json!(4.5));

        let admin = store
            .find_one(
                Collection::Users,
                &Filter::by("email", "admin@natours.io"),
                &[PASSWORD_FIELD],
            )
            .await
            .expect("find")
            .expect("admin present");
        assert_eq!(admin[PASSWORD_FIELD], json!("plain$test1234"));
        assert!(admin.get("passwordConfirm").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn missing_fixture_files_are_reported(store: Arc<InMemoryDocumentStore>) {
        let dir = tempfile::tempdir().expect("temp dir");
        write_file(dir.path(), TOURS_FILE, b"[]").expect("write tours");

        let err = seed_dev_data_on_startup(
            &enabled(Some(dir.path().to_path_buf())),
            store,
            &PlainTextHasher,
        )
        .await
        .expect_err("users.json is missing");
        assert!(
            matches!(err, StartupSeedingError::FileRead { ref path, .. } if path.ends_with(USERS_FILE))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn non_list_fixtures_fail_to_parse(store: Arc<InMemoryDocumentStore>) {
        let dir = tempfile::tempdir().expect("temp dir");
        write_file(dir.path(), TOURS_FILE, br#"{"name": "not a list"}"#).expect("write tours");
        write_file(dir.path(), USERS_FILE, b"[]").expect("write users");
        write_file(dir.path(), REVIEWS_FILE, b"[]").expect("write reviews");

        let err = seed_dev_data_on_startup(
            &enabled(Some(dir.path().to_path_buf())),
            store,
            &PlainTextHasher,
        )
        .await
        .expect_err("object instead of list");
        assert!(matches!(err, StartupSeedingError::Parse { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn mismatched_password_confirmation_is_rejected(store: Arc<InMemoryDocumentStore>) {
        let dir = tempfile::tempdir().expect("temp dir");
        let users = json!([{
            "name": "Laura Wilson",
            "email": "laura@example.com",
            "password": "pass1234",
            "passwordConfirm": "pass4321",
        }]);
        write_file(dir.path(), TOURS_FILE, b"[]").expect("write tours");
        write_file(dir.path(), USERS_FILE, users.to_string().as_bytes()).expect("write users");
        write_file(dir.path(), REVIEWS_FILE, b"[]").expect("write reviews");

        let err = seed_dev_data_on_startup(
            &enabled(Some(dir.path().to_path_buf())),
            store,
            &PlainTextHasher,
        )
        .await
        .expect_err("confirmation differs");
        let StartupSeedingError::Seeding(error) = err else {
            panic!("expected a seeding error, got {err:?}");
        };
        assert_eq!(error.code(), ErrorCode::ValidationFailed);
    }
}
