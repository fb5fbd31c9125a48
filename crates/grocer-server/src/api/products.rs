use axum::{
    extract::{Query, State},
    Extension, Json,
};
use grocer_core::{ProductAggregate, ProductSearch};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_discovery_error, non_blank, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub query: Option<String>,
    pub store_name: Option<String>,
    pub location: Option<String>,
    /// Accepted in place of `location`.
    pub zipcode: Option<String>,
}

pub(super) async fn search_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ProductQuery>,
) -> Result<Json<ApiResponse<ProductSearch>>, ApiError> {
    let query = non_blank(params.query.as_deref());
    let store_name = non_blank(params.store_name.as_deref());
    let location =
        non_blank(params.location.as_deref()).or_else(|| non_blank(params.zipcode.as_deref()));

    let (Some(query), Some(store_name), Some(location)) = (query, store_name, location) else {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "query, store_name, and location (or zipcode) are required",
        ));
    };

    let data = state
        .discovery
        .search_products(query, store_name, location)
        .await
        .map_err(|e| map_discovery_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct AggregateQuery {
    pub query: Option<String>,
    pub location: Option<String>,
    /// Accepted in place of `location`.
    pub zipcode: Option<String>,
    /// Comma-separated store names; stores near `location` when absent.
    pub stores: Option<String>,
}

fn parse_store_names(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

pub(super) async fn aggregate_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<AggregateQuery>,
) -> Result<Json<ApiResponse<ProductAggregate>>, ApiError> {
    let query = non_blank(params.query.as_deref());
    let location =
        non_blank(params.location.as_deref()).or_else(|| non_blank(params.zipcode.as_deref()));

    let (Some(query), Some(location)) = (query, location) else {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "query and location (or zipcode) are required",
        ));
    };

    let stores = parse_store_names(params.stores.as_deref());
    let data = state
        .discovery
        .aggregate_products(query, location, &stores)
        .await
        .map_err(|e| map_discovery_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
