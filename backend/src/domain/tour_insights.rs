//! Read-only tour aggregations and geospatial queries.
//!
//! Distances use the haversine formula on a spherical Earth. Radii follow
//! the conventional equatorial figures: 3963.2 miles, 6378.1 kilometres.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use api_query::{ComparisonOp, Condition, Filter, FilterValue, ListQuery};
use chrono::Datelike;
use serde::Serialize;
use serde_json::Value;

use crate::domain::ports::DocumentStore;
use crate::domain::schema_rules::point_coordinates;
use crate::domain::tour::DEFAULT_RATING;
use crate::domain::{Collection, Document, Error, ID_FIELD, parse_timestamp};

const EARTH_RADIUS_MILES: f64 = 3963.2;
const EARTH_RADIUS_KM: f64 = 6378.1;
const EARTH_RADIUS_METRES: f64 = 6_378_100.0;
const METRES_TO_MILES: f64 = 0.000_621_371;
const METRES_TO_KM: f64 = 0.001;
const MONTHS_IN_PLAN: usize = 12;

/// Unit for geospatial distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    /// Statute miles (`mi`).
    Miles,
    /// Kilometres; any unit other than `mi`.
    Kilometres,
}

impl DistanceUnit {
    /// Interpret a unit path segment.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == "mi" {
            Self::Miles
        } else {
            Self::Kilometres
        }
    }

    const fn earth_radius(self) -> f64 {
        match self {
            Self::Miles => EARTH_RADIUS_MILES,
            Self::Kilometres => EARTH_RADIUS_KM,
        }
    }

    const fn from_metres(self) -> f64 {
        match self {
            Self::Miles => METRES_TO_MILES,
            Self::Kilometres => METRES_TO_KM,
        }
    }
}

/// Latitude/longitude pair parsed from a `lat,lng` path segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Degrees north.
    pub lat: f64,
    /// Degrees east.
    pub lng: f64,
}

impl GeoPoint {
    fn bad_format() -> Error {
        Error::invalid_request("Please provide latitude and longitude in the format lat,lng.")
    }

    /// Central angle to `other`, in radians.
    #[must_use]
    pub fn angle_to(self, other: Self) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();
        let hav = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * hav.sqrt().min(1.0).asin()
    }

    fn start_of(tour: &Document) -> Option<Self> {
        let coordinates = tour.get("startLocation")?.get("coordinates")?;
        point_coordinates(coordinates).map(|(lng, lat)| Self { lat, lng })
    }
}

impl FromStr for GeoPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s.split_once(',').ok_or_else(Self::bad_format)?;
        let lat: f64 = lat.trim().parse().map_err(|_| Self::bad_format())?;
        let lng: f64 = lng.trim().parse().map_err(|_| Self::bad_format())?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(Self::bad_format());
        }
        Ok(Self { lat, lng })
    }
}

/// Aggregates of highly rated tours for one difficulty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyStats {
    /// Upper-cased difficulty.
    #[serde(rename = "_id")]
    pub difficulty: String,
    /// Number of tours.
    pub num_tours: u64,
    /// Sum of `ratingsQuantity`.
    pub num_ratings: f64,
    /// Mean `ratingsAverage`.
    pub avg_rating: f64,
    /// Mean price.
    pub avg_price: f64,
    /// Lowest price.
    pub min_price: f64,
    /// Highest price.
    pub max_price: f64,
}

/// Tour starts in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStarts {
    /// Month number, 1 to 12.
    pub month: u32,
    /// Number of tour starts in the month.
    pub num_tour_starts: u64,
    /// Names of the starting tours, one entry per start.
    pub tours: Vec<String>,
}

/// Distance from a reference point to a tour's start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourDistance {
    /// Tour identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Tour name.
    pub name: String,
    /// Distance in the requested unit.
    pub distance: f64,
}

fn number(tour: &Document, field: &str) -> Option<f64> {
    tour.get(field).and_then(Value::as_f64)
}

fn text(tour: &Document, field: &str) -> String {
    tour.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

#[derive(Default)]
struct Accumulator {
    count: u64,
    ratings: f64,
    rating_sum: f64,
    price_sum: f64,
    min_price: Option<f64>,
    max_price: Option<f64>,
}

impl Accumulator {
    fn add(&mut self, tour: &Document) {
        self.count += 1;
        self.ratings += number(tour, "ratingsQuantity").unwrap_or_default();
        self.rating_sum += number(tour, "ratingsAverage").unwrap_or(DEFAULT_RATING);
        if let Some(price) = number(tour, "price") {
            self.price_sum += price;
            self.min_price = Some(self.min_price.map_or(price, |min| min.min(price)));
            self.max_price = Some(self.max_price.map_or(price, |max| max.max(price)));
        }
    }

    fn finish(self, difficulty: String) -> DifficultyStats {
        let count = self.count as f64;
        DifficultyStats {
            difficulty,
            num_tours: self.count,
            num_ratings: self.ratings,
            avg_rating: self.rating_sum / count,
            avg_price: self.price_sum / count,
            min_price: self.min_price.unwrap_or_default(),
            max_price: self.max_price.unwrap_or_default(),
        }
    }
}

/// Aggregation and geo queries over visible tours.
#[derive(Clone)]
pub struct TourInsights {
    store: Arc<dyn DocumentStore>,
}

impl TourInsights {
    /// Create the service over `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn tours(&self, filter: Filter) -> Result<Vec<Document>, Error> {
        Ok(self
            .store
            .find(Collection::Tours, &ListQuery::matching(filter), &[])
            .await?)
    }

    /// Per-difficulty statistics of tours rated 4.5 or higher, cheapest
    /// average price first.
    ///
    /// # Errors
    /// Returns store failures.
    pub async fn stats(&self) -> Result<Vec<DifficultyStats>, Error> {
        let highly_rated = Filter::all().and(Condition {
            field: "ratingsAverage".to_owned(),
            op: ComparisonOp::Gte,
            value: FilterValue::Single(DEFAULT_RATING.to_string()),
        });
        let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
        for tour in self.tours(highly_rated).await? {
            groups
                .entry(text(&tour, "difficulty").to_uppercase())
                .or_default()
                .add(&tour);
        }
        let mut stats: Vec<DifficultyStats> = groups
            .into_iter()
            .map(|(difficulty, acc)| acc.finish(difficulty))
            .collect();
        stats.sort_by(|a, b| a.avg_price.total_cmp(&b.avg_price));
        Ok(stats)
    }

    /// Tour starts per month of `year`, busiest month first.
    ///
    /// # Errors
    /// Returns store failures.
    pub async fn monthly_plan(&self, year: i32) -> Result<Vec<MonthlyStarts>, Error> {
        let mut months: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for tour in self.tours(Filter::all()).await? {
            let starts = tour
                .get("startDates")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for start in starts.iter().filter_map(Value::as_str).filter_map(parse_timestamp) {
                if start.year() == year {
                    months
                        .entry(start.month())
                        .or_default()
                        .push(text(&tour, "name"));
                }
            }
        }
        let mut plan: Vec<MonthlyStarts> = months
            .into_iter()
            .map(|(month, tours)| MonthlyStarts {
                month,
                num_tour_starts: tours.len() as u64,
                tours,
            })
            .collect();
        plan.sort_by(|a, b| b.num_tour_starts.cmp(&a.num_tour_starts));
        plan.truncate(MONTHS_IN_PLAN);
        Ok(plan)
    }

    /// Tours starting within `distance` of `center`.
    ///
    /// # Errors
    /// Rejects negative or non-finite distances; returns store failures.
    pub async fn within(
        &self,
        distance: f64,
        center: GeoPoint,
        unit: DistanceUnit,
    ) -> Result<Vec<Document>, Error> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(Error::invalid_request("Please provide a valid distance."));
        }
        let radius = distance / unit.earth_radius();
        Ok(self
            .tours(Filter::all())
            .await?
            .into_iter()
            .filter(|tour| GeoPoint::start_of(tour).is_some_and(|start| center.angle_to(start) <= radius))
            .collect())
    }

    /// Distance from `center` to every tour start, nearest first.
    ///
    /// # Errors
    /// Returns store failures.
    pub async fn distances(
        &self,
        center: GeoPoint,
        unit: DistanceUnit,
    ) -> Result<Vec<TourDistance>, Error> {
        let mut distances: Vec<TourDistance> = self
            .tours(Filter::all())
            .await?
            .iter()
            .filter_map(|tour| {
                let start = GeoPoint::start_of(tour)?;
                Some(TourDistance {
                    id: text(tour, ID_FIELD),
                    name: text(tour, "name"),
                    distance: center.angle_to(start) * EARTH_RADIUS_METRES * unit.from_metres(),
                })
            })
            .collect();
        distances.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(distances)
    }
}
