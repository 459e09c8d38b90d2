use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inventory movement entity. Rows are written by the inventory service; this
/// crate only reads them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_in")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub shop_id: i32,
    pub prod_id: i32,
    pub ven_id: Option<i32>,
    /// `IN` for inbound stock, anything else for outbound
    #[sea_orm(column_name = "type")]
    pub movement_type: String,
    pub quantity: i32,
    #[sea_orm(column_type = "Double", nullable)]
    pub price: Option<f64>,
    pub created_at: NaiveDateTime,
}

impl Model {
    /// Quantity with its sign adjusted for the movement direction.
    pub fn signed_quantity(&self) -> i64 {
        if self.movement_type == super::MOVEMENT_TYPE_IN {
            i64::from(self.quantity)
        } else {
            -i64::from(self.quantity)
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shop::Entity",
        from = "Column::ShopId",
        to = "super::shop::Column::Id"
    )]
    Shop,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProdId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::shop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shop.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
