//! Shared HTTP adapter state.
//!
//! HTTP handlers accept services via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use actix_web::web;
use chrono::TimeDelta;
use mockable::Clock;

use crate::domain::ports::{DocumentStore, PasswordHasher};
use crate::domain::{
    AuthService, BookingResource, RatingsAggregator, ResourceService, ReviewResource,
    TourInsights, TourResource, UserResource,
};

/// Parameter object bundling the port implementations handlers depend on.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub store: Arc<dyn DocumentStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub tours: ResourceService<TourResource>,
    pub users: ResourceService<UserResource>,
    pub reviews: ResourceService<ReviewResource>,
    pub bookings: ResourceService<BookingResource>,
    pub insights: TourInsights,
    pub auth: AuthService,
}

impl HttpState {
    /// Build every service over the given ports.
    pub fn new(ports: HttpStatePorts, session_ttl: TimeDelta) -> Self {
        let HttpStatePorts {
            store,
            hasher,
            clock,
        } = ports;
        let ratings = Arc::new(RatingsAggregator::new(Arc::clone(&store)));
        Self {
            tours: ResourceService::new(Arc::clone(&store)),
            users: ResourceService::new(Arc::clone(&store)),
            reviews: ResourceService::new(Arc::clone(&store)).with_hook(ratings),
            bookings: ResourceService::new(Arc::clone(&store)),
            insights: TourInsights::new(Arc::clone(&store)),
            auth: AuthService::new(store, hasher, clock, session_ttl),
        }
    }

    /// Register every service as application data.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.tours.clone()))
            .app_data(web::Data::new(self.users.clone()))
            .app_data(web::Data::new(self.reviews.clone()))
            .app_data(web::Data::new(self.bookings.clone()))
            .app_data(web::Data::new(self.insights.clone()))
            .app_data(web::Data::new(self.auth.clone()));
    }
}
