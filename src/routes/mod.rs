use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod applications;
pub mod auth;
pub mod candidates;
pub mod companies;
pub mod favorites;
pub mod health;
pub mod offers;
pub mod profile;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/change-password", post(auth::change_password))
        .route("/me", get(auth::me));

    let profile_routes = Router::new()
        .route("/user", patch(profile::update_user_info))
        .route("/candidate", patch(profile::update_candidate_profile))
        .route("/preferences", patch(profile::update_job_preferences))
        .route("/availability", patch(profile::update_availability))
        .route("/photo", post(profile::upload_photo))
        .route("/cv", post(profile::upload_cv).delete(profile::delete_cv))
        .route("/cvs", get(profile::list_cvs));

    // The public listing lives inside this nest, so the nest cannot carry
    // the auth layer; every other offer handler authenticates through its
    // extractor argument instead.
    let offers_routes = Router::new()
        .route("/", get(offers::list_offers).post(offers::create_offer))
        .route("/public", get(offers::list_public_offers))
        .route("/mine", get(offers::list_my_offers))
        .route("/recommended", get(offers::recommended_offers))
        .route(
            "/:id",
            get(offers::get_offer)
                .patch(offers::update_offer)
                .delete(offers::delete_offer),
        );

    let companies_routes = Router::new()
        .route("/", get(companies::list_companies))
        .route("/:id", get(companies::get_company));

    let applications_routes = Router::new()
        .route(
            "/",
            get(applications::list_applications).post(applications::apply),
        )
        .route(
            "/:id",
            get(applications::get_application).patch(applications::update_application),
        );

    let favorites_routes = Router::new()
        .route("/", get(favorites::list_favorites))
        .route(
            "/:offer_id",
            post(favorites::add_favorite).delete(favorites::remove_favorite),
        );

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/profile", profile_routes)
        .nest("/api/companies", companies_routes)
        .nest("/api/candidates", Router::new().route("/", get(candidates::list_candidates)))
        .nest("/api/applications", applications_routes)
        .nest("/api/favorites", favorites_routes)
        .route("/api/recruiter/stats", get(offers::recruiter_stats))
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .nest("/api/offers", offers_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 32))
}
