use crate::errors::ServiceError;
use crate::ml::ForecastResult;
use crate::repositories::{MovementFilter, ProductMovementStats};
use crate::services::forecasting::{ForecastingService, ShopOptions, ShopOverview};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

/// Trait for handler state that provides access to the forecasting service
pub trait ForecastingHandlerState: Clone + Send + Sync + 'static {
    fn forecasting_service(&self) -> &ForecastingService;
}

/// Filters for the inventory trend forecast. Both are optional integer IDs.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TrendsQuery {
    /// Restrict movements to one shop
    pub shop_id: Option<String>,
    /// Restrict movements to one product
    pub product_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ShopSummaryQuery {
    /// Shop to summarise (required)
    pub shop_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductTrend {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub movement_count: i64,
    /// Signed sum of all movements of the product
    pub net_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductTrendsResponse {
    pub products: Vec<ProductTrend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShopRef {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductOption {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub current_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShopOption {
    pub shop: ShopRef,
    pub products: Vec<ProductOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AvailableOptionsResponse {
    pub shops: Vec<ShopOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShopStatistics {
    pub total_products: u64,
    pub products_in_stock: u64,
    pub total_stock: Option<i64>,
    pub last_inventory_update: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShopInfo {
    pub name: String,
    pub statistics: ShopStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TopShopProduct {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub current_stock: i64,
    pub movement_count: i64,
    pub last_movement: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShopSummaryResponse {
    pub shop: ShopInfo,
    pub top_products: Vec<TopShopProduct>,
}

impl From<ProductMovementStats> for ProductTrend {
    fn from(stats: ProductMovementStats) -> Self {
        Self {
            id: stats.id,
            name: stats.name,
            price: stats.price,
            movement_count: stats.movement_count,
            net_quantity: stats.current_stock,
        }
    }
}

impl From<ProductMovementStats> for ProductOption {
    fn from(stats: ProductMovementStats) -> Self {
        Self {
            id: stats.id,
            name: stats.name,
            price: stats.price,
            current_stock: stats.current_stock,
        }
    }
}

impl From<ProductMovementStats> for TopShopProduct {
    fn from(stats: ProductMovementStats) -> Self {
        Self {
            id: stats.id,
            name: stats.name,
            price: stats.price,
            current_stock: stats.current_stock,
            movement_count: stats.movement_count,
            last_movement: stats.last_movement,
        }
    }
}

impl From<ShopOptions> for ShopOption {
    fn from(options: ShopOptions) -> Self {
        Self {
            shop: ShopRef {
                id: options.shop.id,
                name: options.shop.name,
            },
            products: options.products.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ShopOverview> for ShopSummaryResponse {
    fn from(overview: ShopOverview) -> Self {
        let summary = overview.summary;
        Self {
            shop: ShopInfo {
                name: summary.name,
                statistics: ShopStatistics {
                    total_products: summary.total_products,
                    products_in_stock: summary.products_in_stock,
                    total_stock: summary.total_stock,
                    last_inventory_update: summary.last_inventory_update,
                },
            },
            top_products: overview.top_products.into_iter().map(Into::into).collect(),
        }
    }
}

/// Blank values count as absent.
fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_trends_filter(query: &TrendsQuery) -> Result<MovementFilter, ServiceError> {
    let parse = |raw: Option<&str>| -> Result<Option<i32>, ServiceError> {
        non_blank(raw)
            .map(|v| {
                v.parse::<i32>().map_err(|_| {
                    ServiceError::invalid_parameter(
                        "Invalid parameter format",
                        "Shop ID and Product ID must be valid integers",
                    )
                })
            })
            .transpose()
    };

    Ok(MovementFilter::new(
        parse(query.shop_id.as_deref())?,
        parse(query.product_id.as_deref())?,
    ))
}

fn parse_required_shop_id(query: &ShopSummaryQuery) -> Result<i32, ServiceError> {
    let raw = non_blank(query.shop_id.as_deref()).ok_or_else(|| {
        ServiceError::invalid_parameter("Missing parameter", "shopId is required")
    })?;
    raw.parse::<i32>().map_err(|_| {
        ServiceError::invalid_parameter("Invalid parameter", "shopId must be a valid integer")
    })
}

/// Creates the forecasting router
pub fn forecasting_router<S>() -> Router<S>
where
    S: ForecastingHandlerState,
{
    Router::new()
        .route("/inventory-trends", get(get_inventory_trends::<S>))
        .route("/product-trends", get(get_product_trends::<S>))
        .route("/available-options", get(get_available_options::<S>))
        .route("/shop-summary", get(get_shop_summary::<S>))
}

/// Forecast cumulative stock 90 days ahead for a shop/product filter
#[utoipa::path(
    get,
    path = "/api/forecasting/inventory-trends",
    params(TrendsQuery),
    responses(
        (status = 200, description = "Historical series, forecast and metrics", body = ForecastResult,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Malformed parameter or not enough data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Shop or product not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Forecast model failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Forecasting"
)]
pub async fn get_inventory_trends<S>(
    State(state): State<S>,
    Query(query): Query<TrendsQuery>,
) -> Result<Json<ForecastResult>, ServiceError>
where
    S: ForecastingHandlerState,
{
    info!(
        shop_id = ?query.shop_id,
        product_id = ?query.product_id,
        "Received inventory trends request"
    );
    let filter = parse_trends_filter(&query)?;
    let result = state.forecasting_service().inventory_trends(filter).await?;
    Ok(Json(result))
}

/// Top products by movement count
#[utoipa::path(
    get,
    path = "/api/forecasting/product-trends",
    responses(
        (status = 200, description = "Products with the most movements", body = ProductTrendsResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "Forecasting"
)]
pub async fn get_product_trends<S>(
    State(state): State<S>,
) -> Result<Json<ProductTrendsResponse>, ServiceError>
where
    S: ForecastingHandlerState,
{
    let products = state.forecasting_service().product_trends().await?;
    Ok(Json(ProductTrendsResponse {
        products: products.into_iter().map(Into::into).collect(),
    }))
}

/// Shops and the products that can be forecast for each
#[utoipa::path(
    get,
    path = "/api/forecasting/available-options",
    responses(
        (status = 200, description = "Shops with their stocked products", body = AvailableOptionsResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "Forecasting"
)]
pub async fn get_available_options<S>(
    State(state): State<S>,
) -> Result<Json<AvailableOptionsResponse>, ServiceError>
where
    S: ForecastingHandlerState,
{
    let shops = state.forecasting_service().available_options().await?;
    Ok(Json(AvailableOptionsResponse {
        shops: shops.into_iter().map(Into::into).collect(),
    }))
}

/// Stock statistics for one shop
#[utoipa::path(
    get,
    path = "/api/forecasting/shop-summary",
    params(ShopSummaryQuery),
    responses(
        (status = 200, description = "Shop statistics and top moving products", body = ShopSummaryResponse),
        (status = 400, description = "Missing or malformed shopId", body = crate::errors::ErrorResponse),
        (status = 404, description = "Shop not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "Forecasting"
)]
pub async fn get_shop_summary<S>(
    State(state): State<S>,
    Query(query): Query<ShopSummaryQuery>,
) -> Result<Json<ShopSummaryResponse>, ServiceError>
where
    S: ForecastingHandlerState,
{
    let shop_id = parse_required_shop_id(&query)?;
    let overview = state.forecasting_service().shop_summary(shop_id).await?;
    Ok(Json(overview.into()))
}
