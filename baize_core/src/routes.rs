use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

use baize_lib::levels::Level;
use baize_sdk::{
    api::{
        FinalizeRequest, InitializeTournamentRequest, LevelInitRequest, NextRoundRequest,
        PositionsRequest,
    },
    ServiceError, TournamentStore,
};

use crate::state::AppState;

/// The algorithm surface, mounted where the original backend served it
pub fn create_router<S: TournamentStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .nest(
            "/api/algorithm",
            Router::new()
                .route("/initialize-tournament", post(initialize_tournament::<S>))
                .route("/community/next-round", post(community_next_round::<S>))
                .route("/county/initialize", post(county_initialize::<S>))
                .route("/county/next-round", post(county_next_round::<S>))
                .route("/regional/initialize", post(regional_initialize::<S>))
                .route("/regional/next-round", post(regional_next_round::<S>))
                .route("/national/initialize", post(national_initialize::<S>))
                .route("/national/next-round", post(national_next_round::<S>))
                .route("/community/finalize-winners", post(community_finalize::<S>))
                .route("/finalize", post(finalize::<S>))
                .route("/tournament/positions", post(positions::<S>))
                .route("/test-connection", get(test_connection::<S>)),
        )
        .with_state(state)
}

/// JSON extraction that answers malformed bodies with a 400 in the same
/// `{success:false}` shape every other failure uses
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(bad_request(&rejection.body_text())),
        }
    }
}

fn bad_request(detail: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": "InvalidInput", "detail": detail})),
    )
        .into_response()
}

/// Domain outcomes (including refusals) are 200s; only an unreachable store
/// or an unexpected fault surfaces as a 500
fn respond<T: Serialize>(result: Result<T, ServiceError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "request failed against the store");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": err.kind(), "detail": err.to_string()})),
            )
                .into_response()
        }
    }
}

async fn initialize_tournament<S: TournamentStore>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<InitializeTournamentRequest>,
) -> Response {
    if req.tournament_id.is_empty() {
        return bad_request("tournamentId is required");
    }
    respond(state.coordinator.initialize_tournament(&req).await)
}

async fn community_next_round<S: TournamentStore>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<NextRoundRequest>,
) -> Response {
    let Some(entity) = req.community_id.as_deref() else {
        return bad_request("communityId is required");
    };
    respond(
        state
            .coordinator
            .next_round(&req.tournament_id, Level::Community, entity)
            .await,
    )
}

async fn county_initialize<S: TournamentStore>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<LevelInitRequest>,
) -> Response {
    respond(
        state
            .coordinator
            .initialize_level(&req.tournament_id, Level::County, req.county_ids)
            .await,
    )
}

async fn county_next_round<S: TournamentStore>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<NextRoundRequest>,
) -> Response {
    let Some(entity) = req.county_id.as_deref() else {
        return bad_request("countyId is required");
    };
    respond(
        state
            .coordinator
            .next_round(&req.tournament_id, Level::County, entity)
            .await,
    )
}

async fn regional_initialize<S: TournamentStore>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<LevelInitRequest>,
) -> Response {
    respond(
        state
            .coordinator
            .initialize_level(&req.tournament_id, Level::Regional, req.region_ids)
            .await,
    )
}

async fn regional_next_round<S: TournamentStore>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<NextRoundRequest>,
) -> Response {
    let Some(entity) = req.region_id.as_deref() else {
        return bad_request("regionId is required");
    };
    respond(
        state
            .coordinator
            .next_round(&req.tournament_id, Level::Regional, entity)
            .await,
    )
}

async fn national_initialize<S: TournamentStore>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<LevelInitRequest>,
) -> Response {
    respond(
        state
            .coordinator
            .initialize_level(&req.tournament_id, Level::National, None)
            .await,
    )
}

async fn national_next_round<S: TournamentStore>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<NextRoundRequest>,
) -> Response {
    respond(state.coordinator.next_round_top(&req.tournament_id).await)
}

async fn community_finalize<S: TournamentStore>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<FinalizeRequest>,
) -> Response {
    let Some(entity) = req.community_id.as_deref() else {
        return bad_request("communityId is required");
    };
    respond(
        state
            .coordinator
            .finalize_entity(&req.tournament_id, Level::Community, entity)
            .await,
    )
}

async fn finalize<S: TournamentStore>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<FinalizeRequest>,
) -> Response {
    match req.target() {
        Some((Level::National | Level::Special, _)) => {
            respond(state.coordinator.finalize_top(&req.tournament_id).await)
        }
        Some((level, entity)) => respond(
            state
                .coordinator
                .finalize_entity(&req.tournament_id, level, &entity)
                .await,
        ),
        None => bad_request("one of communityId, countyId, regionId, or level is required"),
    }
}

async fn positions<S: TournamentStore>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<PositionsRequest>,
) -> Response {
    respond(
        state
            .coordinator
            .entity_positions(&req.tournament_id, req.level, &req.entity_id)
            .await,
    )
}

async fn test_connection<S: TournamentStore>(State(state): State<AppState<S>>) -> Response {
    let body = state.coordinator.test_connection().await;
    (StatusCode::OK, Json(body)).into_response()
}
