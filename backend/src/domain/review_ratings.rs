//! Keeps a tour's rating aggregates in step with its reviews.

use std::sync::Arc;

use api_query::{Filter, ListQuery};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::domain::ports::DocumentStore;
use crate::domain::resource::WriteHook;
use crate::domain::review::reviewed_tour;
use crate::domain::tour::{DEFAULT_RATING, round_rating};
use crate::domain::{Collection, Document, DocumentId, Error};

/// Rating aggregates of one tour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    /// Number of reviews.
    pub quantity: u64,
    /// Mean rating rounded to one decimal, or the default when unreviewed.
    pub average: f64,
}

impl RatingSummary {
    /// Summarise the `rating` fields of `reviews`.
    #[must_use]
    pub fn of(reviews: &[Document]) -> Self {
        let ratings: Vec<f64> = reviews
            .iter()
            .filter_map(|review| review.get("rating").and_then(Value::as_f64))
            .collect();
        if ratings.is_empty() {
            return Self {
                quantity: 0,
                average: DEFAULT_RATING,
            };
        }
        let sum: f64 = ratings.iter().sum();
        let mean = sum / ratings.len() as f64;
        Self {
            quantity: ratings.len() as u64,
            average: round_rating(mean),
        }
    }
}

/// Recomputes `ratingsQuantity` and `ratingsAverage` on tours.
#[derive(Clone)]
pub struct RatingsAggregator {
    store: Arc<dyn DocumentStore>,
}

impl RatingsAggregator {
    /// Create an aggregator over `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Recompute and store the aggregates of `tour`.
    ///
    /// # Errors
    /// Returns store failures.
    pub async fn recalculate(&self, tour: DocumentId) -> Result<RatingSummary, Error> {
        let reviews = self
            .store
            .find(
                Collection::Reviews,
                &ListQuery::matching(Filter::by("tour", tour.to_string())),
                &[],
            )
            .await?;
        let summary = RatingSummary::of(&reviews);
        let patch = json!({
            "ratingsQuantity": summary.quantity,
            "ratingsAverage": summary.average,
        });
        let Value::Object(patch) = patch else {
            return Err(Error::internal("rating patch is not an object"));
        };
        let updated = self
            .store
            .update_by_id(Collection::Tours, tour, patch)
            .await?;
        if updated.is_some() {
            info!(%tour, quantity = summary.quantity, average = summary.average, "tour ratings recalculated");
        } else {
            debug!(%tour, "reviewed tour not found; ratings left untouched");
        }
        Ok(summary)
    }
}

#[async_trait]
impl WriteHook for RatingsAggregator {
    async fn after_write(&self, document: &Document) -> Result<(), Error> {
        match reviewed_tour(document) {
            Some(tour) => self.recalculate(tour).await.map(|_| ()),
            None => Ok(()),
        }
    }
}
