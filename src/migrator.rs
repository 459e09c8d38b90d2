use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_shop_table::Migration),
            Box::new(m20240101_000002_create_product_table::Migration),
            Box::new(m20240101_000003_create_product_in_table::Migration),
        ]
    }
}

mod m20240101_000001_create_shop_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_shop_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Shop::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Shop::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Shop::Name).string().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Shop::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(crate) enum Shop {
        Table,
        Id,
        Name,
    }
}

mod m20240101_000002_create_product_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_product_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Product::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Product::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Product::Name).string().not_null())
                        .col(
                            ColumnDef::new(Product::Price)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Product::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(crate) enum Product {
        Table,
        Id,
        Name,
        Price,
    }
}

mod m20240101_000003_create_product_in_table {

    use super::m20240101_000001_create_shop_table::Shop;
    use super::m20240101_000002_create_product_table::Product;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_product_in_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductIn::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductIn::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ProductIn::ShopId).integer().not_null())
                        .col(ColumnDef::new(ProductIn::ProdId).integer().not_null())
                        .col(ColumnDef::new(ProductIn::VenId).integer().null())
                        .col(ColumnDef::new(ProductIn::Type).string().not_null())
                        .col(ColumnDef::new(ProductIn::Quantity).integer().not_null())
                        .col(ColumnDef::new(ProductIn::Price).double().null())
                        .col(ColumnDef::new(ProductIn::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_in_shop_id")
                                .from(ProductIn::Table, ProductIn::ShopId)
                                .to(Shop::Table, Shop::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_in_prod_id")
                                .from(ProductIn::Table, ProductIn::ProdId)
                                .to(Product::Table, Product::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_in_shop_prod")
                        .table(ProductIn::Table)
                        .col(ProductIn::ShopId)
                        .col(ProductIn::ProdId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_in_created_at")
                        .table(ProductIn::Table)
                        .col(ProductIn::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductIn::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProductIn {
        Table,
        Id,
        ShopId,
        ProdId,
        VenId,
        Type,
        Quantity,
        Price,
        CreatedAt,
    }
}
