use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shop entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shop")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_in::Entity")]
    ProductIn,
}

impl Related<super::product_in::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductIn.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
