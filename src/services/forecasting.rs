use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::entities::shop;
use crate::errors::ServiceError;
use crate::ml::{forecast_inventory, ForecastResult};
use crate::repositories::{
    InventoryRepository, MovementFilter, MovementSource, ProductMovementStats, ShopSummary,
};
use crate::tracing::with_metrics;

/// Number of products listed by the product trends endpoint
pub const TOP_PRODUCTS_LIMIT: u64 = 10;

/// Number of in-stock products listed in a shop summary
pub const SHOP_TOP_PRODUCTS_LIMIT: usize = 5;

/// A shop together with the products that have moved through it
#[derive(Debug, Clone, PartialEq)]
pub struct ShopOptions {
    pub shop: shop::Model,
    pub products: Vec<ProductMovementStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShopOverview {
    pub summary: ShopSummary,
    pub top_products: Vec<ProductMovementStats>,
}

/// Fetches the movements for `filter` and runs the forecasting pipeline on them.
pub async fn forecast_from_source<S>(
    source: &S,
    filter: MovementFilter,
) -> Result<ForecastResult, ServiceError>
where
    S: MovementSource + ?Sized,
{
    let movements = source
        .fetch_movements(filter.shop_id, filter.product_id)
        .await?;
    info!(%filter, rows = movements.len(), "Loaded movements for forecasting");

    forecast_inventory(&movements).map_err(ServiceError::from)
}

/// Service for inventory trend forecasts and the lookups that feed them
#[derive(Debug, Clone)]
pub struct ForecastingService {
    repository: Arc<InventoryRepository>,
}

impl ForecastingService {
    pub fn new(repository: Arc<InventoryRepository>) -> Self {
        Self { repository }
    }

    /// Forecasts cumulative stock for the filter.
    ///
    /// Unknown identifiers are rejected before any movement is read. An empty
    /// result set is reported with store-wide statistics so callers can tell
    /// a wrong filter from an empty database.
    #[instrument(skip(self, filter), fields(filter = %filter))]
    pub async fn inventory_trends(
        &self,
        filter: MovementFilter,
    ) -> Result<ForecastResult, ServiceError> {
        with_metrics("inventory_trends", || self.forecast_checked(filter)).await
    }

    async fn forecast_checked(&self, filter: MovementFilter) -> Result<ForecastResult, ServiceError> {
        if let Some(product_id) = filter.product_id {
            if !self.repository.product_exists(product_id).await? {
                return Err(ServiceError::product_not_found(product_id));
            }
        }
        if let Some(shop_id) = filter.shop_id {
            if !self.repository.shop_exists(shop_id).await? {
                return Err(ServiceError::shop_not_found(shop_id));
            }
        }

        match forecast_from_source(self.repository.as_ref(), filter).await {
            Err(ServiceError::NoData { .. }) => Err(self.no_data_error(filter).await?),
            other => other,
        }
    }

    async fn no_data_error(&self, filter: MovementFilter) -> Result<ServiceError, ServiceError> {
        let total_matching_records = self.repository.count_matching(filter).await?;
        let stats = self.repository.database_stats().await?;
        warn!(
            %filter,
            total_records = stats.total_records,
            "No inventory movements for forecast filter"
        );

        Ok(ServiceError::NoData {
            details: Some(json!({
                "message": "No inventory movements found for the specified criteria",
                "shop_id": filter.shop_id,
                "product_id": filter.product_id,
                "total_matching_records": total_matching_records,
                "database_stats": {
                    "total_records": stats.total_records,
                    "unique_products": stats.unique_products,
                    "unique_shops": stats.unique_shops,
                    "date_range": {
                        "start": stats.earliest_date,
                        "end": stats.latest_date,
                    }
                }
            })),
        })
    }

    /// Products with the most movements across all shops
    #[instrument(skip(self))]
    pub async fn product_trends(&self) -> Result<Vec<ProductMovementStats>, ServiceError> {
        with_metrics("product_trends", || {
            self.repository.top_products(TOP_PRODUCTS_LIMIT)
        })
        .await
    }

    /// Every shop with the products that have movements there
    #[instrument(skip(self))]
    pub async fn available_options(&self) -> Result<Vec<ShopOptions>, ServiceError> {
        with_metrics("available_options", || self.collect_shop_options()).await
    }

    async fn collect_shop_options(&self) -> Result<Vec<ShopOptions>, ServiceError> {
        let shops = self.repository.shops().await?;
        let mut options = Vec::with_capacity(shops.len());
        for shop in shops {
            let products = self.repository.shop_products(shop.id).await?;
            options.push(ShopOptions { shop, products });
        }
        Ok(options)
    }

    /// Stock statistics and best-moving in-stock products of one shop
    #[instrument(skip(self))]
    pub async fn shop_summary(&self, shop_id: i32) -> Result<ShopOverview, ServiceError> {
        with_metrics("shop_summary", || self.collect_shop_overview(shop_id)).await
    }

    async fn collect_shop_overview(&self, shop_id: i32) -> Result<ShopOverview, ServiceError> {
        let summary = self
            .repository
            .shop_summary(shop_id)
            .await?
            .ok_or_else(|| ServiceError::shop_not_found(shop_id))?;
        let top_products = self
            .repository
            .top_moving_products(shop_id, SHOP_TOP_PRODUCTS_LIMIT)
            .await?;

        Ok(ShopOverview {
            summary,
            top_products,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::ml::Movement;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct StaticSource(Vec<Movement>);

    #[async_trait]
    impl MovementSource for StaticSource {
        async fn fetch_movements(
            &self,
            shop_id: Option<i32>,
            product_id: Option<i32>,
        ) -> Result<Vec<Movement>, AppError> {
            Ok(self
                .0
                .iter()
                .filter(|m| shop_id.map_or(true, |id| m.shop_id == id))
                .filter(|m| product_id.map_or(true, |id| m.product_id == id))
                .cloned()
                .collect())
        }
    }

    fn movement(day: u32, quantity: i64, shop_id: i32, product_id: i32) -> Movement {
        Movement {
            timestamp: NaiveDate::from_ymd_opt(2024, 2, day)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .unwrap(),
            quantity,
            shop_id,
            product_id,
        }
    }

    fn source() -> StaticSource {
        StaticSource(vec![
            movement(1, 10, 1, 1),
            movement(2, 5, 2, 1),
            movement(11, 20, 1, 1),
            movement(12, -3, 1, 2),
        ])
    }

    #[tokio::test]
    async fn forecasts_only_the_filtered_movements() {
        let result = forecast_from_source(&source(), MovementFilter::new(Some(1), Some(1)))
            .await
            .unwrap();
        assert_eq!(result.historical.values, vec![10.0, 30.0]);
        assert_eq!(result.forecast.values[10], 50.0);
    }

    #[tokio::test]
    async fn empty_filter_result_is_no_data() {
        let err = forecast_from_source(&source(), MovementFilter::new(Some(3), None))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::NoData { details: None });
    }

    #[tokio::test]
    async fn single_movement_is_insufficient() {
        let err = forecast_from_source(&source(), MovementFilter::new(Some(1), Some(2)))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InsufficientData { points } if points.len() == 1 && points[0].value == -3.0);
    }
}
