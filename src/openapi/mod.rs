use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory Forecast API",
        version = "0.1.0",
        description = r#"
# Inventory Forecast API

Read-only service over shop inventory movements.

- **Inventory trends**: cumulative stock history per shop/product with a 90-day
  trend forecast, confidence band and stock recommendation
- **Product trends**: products with the most movements
- **Available options**: shops and the products stocked at each
- **Shop summary**: stock statistics and top moving products of one shop

## Error Handling

Errors share one body format:

```json
{
  "error": "Shop not found",
  "message": "No shop found with ID 9",
  "details": null,
  "request_id": "3f1c8e9a-4a7b-4b8e-9a51-6c0f0b7c9d11",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:5001", description = "Local development")
    ),
    tags(
        (name = "Forecasting", description = "Inventory trend and forecasting endpoints")
    ),
    paths(
        crate::handlers::forecasting::get_inventory_trends,
        crate::handlers::forecasting::get_product_trends,
        crate::handlers::forecasting::get_available_options,
        crate::handlers::forecasting::get_shop_summary,
    ),
    components(
        schemas(
            crate::ml::ForecastResult,
            crate::ml::HistoricalSeries,
            crate::ml::ForecastSeries,
            crate::ml::ForecastMetrics,
            crate::ml::SeriesPoint,
            crate::handlers::forecasting::ProductTrendsResponse,
            crate::handlers::forecasting::ProductTrend,
            crate::handlers::forecasting::AvailableOptionsResponse,
            crate::handlers::forecasting::ShopOption,
            crate::handlers::forecasting::ShopRef,
            crate::handlers::forecasting::ProductOption,
            crate::handlers::forecasting::ShopSummaryResponse,
            crate::handlers::forecasting::ShopInfo,
            crate::handlers::forecasting::ShopStatistics,
            crate::handlers::forecasting::TopShopProduct,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
