use axum::{
    extract::{Query, State},
    Extension, Json,
};
use grocer_core::{StoreDetails, StoreDiscovery};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_discovery_error, non_blank, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct StoreQuery {
    pub location: Option<String>,
    /// Accepted in place of `location`.
    pub zipcode: Option<String>,
    /// Comma-separated `store_id` filter.
    pub chains: Option<String>,
}

fn parse_chains(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

pub(super) async fn discover_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<ApiResponse<StoreDiscovery>>, ApiError> {
    let Some(location) =
        non_blank(query.location.as_deref()).or_else(|| non_blank(query.zipcode.as_deref()))
    else {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "location or zipcode is required",
        ));
    };

    let mut data = state
        .discovery
        .discover_stores(location)
        .await
        .map_err(|e| map_discovery_error(req_id.0.clone(), &e))?;

    let chains = parse_chains(query.chains.as_deref());
    if !chains.is_empty() {
        data = data.retain_store_ids(&chains);
    }

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct StoreDetailsQuery {
    pub store_name: Option<String>,
    pub location: Option<String>,
    /// Accepted in place of `location`.
    pub zipcode: Option<String>,
}

pub(super) async fn store_details(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<StoreDetailsQuery>,
) -> Result<Json<ApiResponse<StoreDetails>>, ApiError> {
    let store_name = non_blank(query.store_name.as_deref());
    let location =
        non_blank(query.location.as_deref()).or_else(|| non_blank(query.zipcode.as_deref()));

    let (Some(store_name), Some(location)) = (store_name, location) else {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "store_name and location (or zipcode) are required",
        ));
    };

    let data = state
        .discovery
        .store_details(store_name, location)
        .await
        .map_err(|e| map_discovery_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
