use async_trait::async_trait;
use chrono::NaiveDateTime;
use sea_orm::{
    sea_query::{Alias, Expr, Func, SimpleExpr},
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

use crate::entities::{product, product_in, shop, MOVEMENT_TYPE_IN};
use crate::errors::AppError;
use crate::ml::Movement;
use crate::repositories::{BaseRepository, Repository};

/// Optional shop/product restriction applied to movement queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    pub shop_id: Option<i32>,
    pub product_id: Option<i32>,
}

impl MovementFilter {
    pub fn new(shop_id: Option<i32>, product_id: Option<i32>) -> Self {
        Self {
            shop_id,
            product_id,
        }
    }

    fn apply(&self, query: Select<product_in::Entity>) -> Select<product_in::Entity> {
        let mut query = query;
        if let Some(shop_id) = self.shop_id {
            query = query.filter(product_in::Column::ShopId.eq(shop_id));
        }
        if let Some(product_id) = self.product_id {
            query = query.filter(product_in::Column::ProdId.eq(product_id));
        }
        query
    }
}

impl fmt::Display for MovementFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |id: Option<i32>| id.map_or_else(|| "any".to_string(), |v| v.to_string());
        write!(
            f,
            "shop_id={} product_id={}",
            show(self.shop_id),
            show(self.product_id)
        )
    }
}

/// Source of polarity-adjusted movements in timestamp order.
#[async_trait]
pub trait MovementSource: Send + Sync {
    async fn fetch_movements(
        &self,
        shop_id: Option<i32>,
        product_id: Option<i32>,
    ) -> Result<Vec<Movement>, AppError>;
}

/// Store-wide movement statistics, reported when a filter matches nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DatabaseStats {
    pub total_records: u64,
    pub unique_products: u64,
    pub unique_shops: u64,
    pub earliest_date: Option<NaiveDateTime>,
    pub latest_date: Option<NaiveDateTime>,
}

/// Per-product movement aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct ProductMovementStats {
    pub id: i32,
    pub name: String,
    pub price: f64,
    /// Signed sum of all movements, i.e. the on-hand stock
    pub current_stock: i64,
    pub movement_count: i64,
    pub last_movement: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShopSummary {
    pub name: String,
    pub total_products: u64,
    pub products_in_stock: u64,
    /// `None` when the shop has no movements at all
    pub total_stock: Option<i64>,
    pub last_inventory_update: Option<NaiveDateTime>,
}

/// Read-only queries over shops, products and their movements
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    base: Arc<BaseRepository>,
}

impl InventoryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: Arc::new(BaseRepository::new(db)),
        }
    }

    pub async fn product_exists(&self, product_id: i32) -> Result<bool, AppError> {
        let found = product::Entity::find_by_id(product_id)
            .one(self.base.get_db())
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(found.is_some())
    }

    pub async fn shop_exists(&self, shop_id: i32) -> Result<bool, AppError> {
        let found = shop::Entity::find_by_id(shop_id)
            .one(self.base.get_db())
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(found.is_some())
    }

    /// Totals and date range over the whole movement table
    pub async fn database_stats(&self) -> Result<DatabaseStats, AppError> {
        let db = self.base.get_db();

        let total_records = product_in::Entity::find().count(db).await?;
        let unique_products = product_in::Entity::find()
            .select_only()
            .column(product_in::Column::ProdId)
            .distinct()
            .count(db)
            .await?;
        let unique_shops = product_in::Entity::find()
            .select_only()
            .column(product_in::Column::ShopId)
            .distinct()
            .count(db)
            .await?;
        let earliest = product_in::Entity::find()
            .order_by_asc(product_in::Column::CreatedAt)
            .one(db)
            .await?;
        let latest = product_in::Entity::find()
            .order_by_desc(product_in::Column::CreatedAt)
            .one(db)
            .await?;

        let stats = DatabaseStats {
            total_records,
            unique_products,
            unique_shops,
            earliest_date: earliest.map(|m| m.created_at),
            latest_date: latest.map(|m| m.created_at),
        };
        debug!(?stats, "Collected movement statistics");
        Ok(stats)
    }

    /// Number of movement rows matching `filter`
    pub async fn count_matching(&self, filter: MovementFilter) -> Result<u64, AppError> {
        filter
            .apply(product_in::Entity::find())
            .count(self.base.get_db())
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Products with the most movements across all shops
    pub async fn top_products(&self, limit: u64) -> Result<Vec<ProductMovementStats>, AppError> {
        product_stats_query(None)
            .order_by_desc(Expr::col(Alias::new("movement_count")))
            .order_by_asc(product::Column::Id)
            .limit(limit)
            .into_model::<ProductMovementStats>()
            .all(self.base.get_db())
            .await
            .map_err(AppError::DatabaseError)
    }

    /// All shops ordered by name
    pub async fn shops(&self) -> Result<Vec<shop::Model>, AppError> {
        shop::Entity::find()
            .order_by_asc(shop::Column::Name)
            .order_by_asc(shop::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Products with at least one movement at `shop_id`, ordered by name
    pub async fn shop_products(&self, shop_id: i32) -> Result<Vec<ProductMovementStats>, AppError> {
        product_stats_query(Some(shop_id))
            .order_by_asc(product::Column::Name)
            .order_by_asc(product::Column::Id)
            .into_model::<ProductMovementStats>()
            .all(self.base.get_db())
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Stock statistics for one shop, `None` if the shop does not exist
    pub async fn shop_summary(&self, shop_id: i32) -> Result<Option<ShopSummary>, AppError> {
        let Some(shop) = shop::Entity::find_by_id(shop_id)
            .one(self.base.get_db())
            .await?
        else {
            return Ok(None);
        };

        let products = self.shop_products(shop_id).await?;
        let total_stock = if products.is_empty() {
            None
        } else {
            Some(products.iter().map(|p| p.current_stock).sum())
        };

        Ok(Some(ShopSummary {
            name: shop.name,
            total_products: products.len() as u64,
            products_in_stock: products.iter().filter(|p| p.current_stock > 0).count() as u64,
            total_stock,
            last_inventory_update: products.iter().filter_map(|p| p.last_movement).max(),
        }))
    }

    /// In-stock products at `shop_id` with the most movements
    pub async fn top_moving_products(
        &self,
        shop_id: i32,
        limit: usize,
    ) -> Result<Vec<ProductMovementStats>, AppError> {
        let mut products: Vec<ProductMovementStats> = self
            .shop_products(shop_id)
            .await?
            .into_iter()
            .filter(|p| p.current_stock > 0)
            .collect();
        products.sort_by(|a, b| {
            b.movement_count
                .cmp(&a.movement_count)
                .then_with(|| a.id.cmp(&b.id))
        });
        products.truncate(limit);
        Ok(products)
    }
}

#[async_trait]
impl MovementSource for InventoryRepository {
    async fn fetch_movements(
        &self,
        shop_id: Option<i32>,
        product_id: Option<i32>,
    ) -> Result<Vec<Movement>, AppError> {
        let filter = MovementFilter::new(shop_id, product_id);
        let rows = filter
            .apply(product_in::Entity::find())
            .order_by_asc(product_in::Column::CreatedAt)
            .order_by_asc(product_in::Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(AppError::DatabaseError)?;

        debug!(%filter, rows = rows.len(), "Fetched inventory movements");

        Ok(rows
            .into_iter()
            .map(|row| Movement {
                timestamp: row.created_at,
                quantity: row.signed_quantity(),
                shop_id: row.shop_id,
                product_id: row.prod_id,
            })
            .collect())
    }
}

/// `SUM(CASE WHEN type = 'IN' THEN quantity ELSE -quantity END)`
fn signed_quantity_sum() -> SimpleExpr {
    let quantity = Expr::col((product_in::Entity, product_in::Column::Quantity));
    let signed = Expr::case(
        Expr::col((product_in::Entity, product_in::Column::MovementType)).eq(MOVEMENT_TYPE_IN),
        quantity.clone(),
    )
    .finally(quantity.mul(-1));
    Func::sum(signed).into()
}

fn product_stats_query(shop_id: Option<i32>) -> Select<product::Entity> {
    let mut query = product::Entity::find()
        .select_only()
        .column(product::Column::Id)
        .column(product::Column::Name)
        .column(product::Column::Price)
        .column_as(signed_quantity_sum(), "current_stock")
        .column_as(
            Expr::col((product_in::Entity, product_in::Column::Id)).count(),
            "movement_count",
        )
        .column_as(
            Expr::col((product_in::Entity, product_in::Column::CreatedAt)).max(),
            "last_movement",
        )
        .inner_join(product_in::Entity)
        .group_by(product::Column::Id)
        .group_by(product::Column::Name)
        .group_by(product::Column::Price);

    if let Some(shop_id) = shop_id {
        query = query.filter(product_in::Column::ShopId.eq(shop_id));
    }
    query
}
