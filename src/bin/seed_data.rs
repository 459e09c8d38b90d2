//! Seed data script - populates the database with demo inventory movements
//!
//! Run with: cargo run --bin seed-data -- --migrate
//!
//! Existing rows are kept unless `--reset` is passed, which deletes every
//! shop, product and movement before seeding.
//!
//! This creates:
//! - 5 shops
//! - 10 products
//! - 3 to 7 random movements per day over the requested number of days
//! - weekly replenishments for the first three products at every shop

use chrono::{Duration, NaiveDateTime, Timelike, Utc};
use clap::Parser;
use rand::Rng;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::info;

use inventory_forecast_api::{
    config::DEFAULT_DATABASE_URL,
    db,
    entities::{product, product_in, shop, MOVEMENT_TYPE_IN, MOVEMENT_TYPE_OUT},
};

const SHOP_NAMES: [&str; 5] = [
    "Main Street Store",
    "Downtown Branch",
    "Shopping Mall Outlet",
    "Express Corner",
    "Wholesale Center",
];

const PRODUCTS: [(&str, f64); 10] = [
    ("Laptop Pro X", 1299.99),
    ("Smartphone Y20", 699.99),
    ("Wireless Earbuds", 129.99),
    ("Smart Watch Elite", 249.99),
    ("Tablet Air", 449.99),
    ("Gaming Console X", 499.99),
    ("4K Monitor", 399.99),
    ("Wireless Keyboard", 79.99),
    ("Bluetooth Speaker", 89.99),
    ("Power Bank 20000mAh", 49.99),
];

/// Products that receive a weekly replenishment at every shop
const REPLENISHED_PRODUCTS: usize = 3;
const REPLENISHMENT_QUANTITY: i32 = 10;
const REPLENISHMENT_PROBABILITY: f64 = 0.9;
const INBOUND_PROBABILITY: f64 = 0.6;

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Populate the database with demo inventory movements")]
struct Args {
    /// Database to seed; falls back to APP__DATABASE_URL
    #[arg(long, env = "APP__DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    /// Number of days of movement history to generate
    #[arg(long, default_value_t = 90)]
    days: u32,

    /// Apply migrations before seeding
    #[arg(long)]
    migrate: bool,

    /// Delete existing shops, products and movements before seeding
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    info!("=== Inventory Forecast Seed Data ===");
    let db = db::establish_connection(&args.database_url).await?;
    info!("Connected!");

    if args.migrate {
        db::run_migrations(&db).await?;
    }

    if args.reset {
        let cleared = clear_existing(&db).await?;
        info!("  Removed {} existing movements", cleared);
    }

    let shops = create_shops(&db).await?;
    info!("  Created {} shops", shops.len());

    let products = create_products(&db).await?;
    info!("  Created {} products", products.len());

    let now = Utc::now().naive_utc();
    let mut rng = rand::thread_rng();

    let random_count = create_random_movements(&db, &mut rng, now, args.days, &shops, &products)
        .await?;
    info!("  Created {} random movements", random_count);

    let replenishments =
        create_replenishments(&db, &mut rng, now, args.days, &shops, &products).await?;
    info!("  Created {} weekly replenishments", replenishments);

    info!("=== Seed Data Complete ===");
    if let Some(first) = shops.first() {
        info!(
            "Try: curl 'http://localhost:5001/api/forecasting/inventory-trends?shopId={}'",
            first.id
        );
    }

    db::close_pool(db).await?;
    Ok(())
}

async fn clear_existing(db: &DatabaseConnection) -> anyhow::Result<u64> {
    let movements = product_in::Entity::delete_many().exec(db).await?;
    product::Entity::delete_many().exec(db).await?;
    shop::Entity::delete_many().exec(db).await?;
    Ok(movements.rows_affected)
}

async fn create_shops(db: &DatabaseConnection) -> anyhow::Result<Vec<shop::Model>> {
    let mut shops = Vec::with_capacity(SHOP_NAMES.len());
    for name in SHOP_NAMES {
        let shop = shop::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        shops.push(shop);
    }
    Ok(shops)
}

async fn create_products(db: &DatabaseConnection) -> anyhow::Result<Vec<product::Model>> {
    let mut products = Vec::with_capacity(PRODUCTS.len());
    for (name, price) in PRODUCTS {
        let product = product::ActiveModel {
            name: Set(name.to_string()),
            price: Set(price),
            ..Default::default()
        }
        .insert(db)
        .await?;
        products.push(product);
    }
    Ok(products)
}

async fn insert_movement(
    db: &DatabaseConnection,
    shop: &shop::Model,
    product: &product::Model,
    movement_type: &str,
    quantity: i32,
    created_at: NaiveDateTime,
) -> anyhow::Result<()> {
    product_in::ActiveModel {
        shop_id: Set(shop.id),
        prod_id: Set(product.id),
        ven_id: Set(None),
        movement_type: Set(movement_type.to_string()),
        quantity: Set(quantity),
        price: Set(Some(product.price)),
        created_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn create_random_movements(
    db: &DatabaseConnection,
    rng: &mut impl Rng,
    now: NaiveDateTime,
    days: u32,
    shops: &[shop::Model],
    products: &[product::Model],
) -> anyhow::Result<usize> {
    let start = now - Duration::days(i64::from(days));
    let mut created = 0;

    for day in 0..days {
        let date = start + Duration::days(i64::from(day));
        let movements_per_day = rng.gen_range(3..=7);

        for _ in 0..movements_per_day {
            let shop = &shops[rng.gen_range(0..shops.len())];
            let product = &products[rng.gen_range(0..products.len())];
            let movement_type = if rng.gen_bool(INBOUND_PROBABILITY) {
                MOVEMENT_TYPE_IN
            } else {
                MOVEMENT_TYPE_OUT
            };
            let quantity = rng.gen_range(1..20);
            let timestamp = date.with_hour(rng.gen_range(0..24)).unwrap_or(date);

            insert_movement(db, shop, product, movement_type, quantity, timestamp).await?;
            created += 1;
        }
    }

    Ok(created)
}

async fn create_replenishments(
    db: &DatabaseConnection,
    rng: &mut impl Rng,
    now: NaiveDateTime,
    days: u32,
    shops: &[shop::Model],
    products: &[product::Model],
) -> anyhow::Result<usize> {
    let weeks = i64::from(days / 7);
    let mut created = 0;

    for shop in shops {
        for product in products.iter().take(REPLENISHED_PRODUCTS) {
            for week in 1..=weeks {
                if rng.gen_bool(REPLENISHMENT_PROBABILITY) {
                    let date = now - Duration::days(week * 7);
                    insert_movement(
                        db,
                        shop,
                        product,
                        MOVEMENT_TYPE_IN,
                        REPLENISHMENT_QUANTITY,
                        date,
                    )
                    .await?;
                    created += 1;
                }
            }
        }
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_data_is_kept_by_default() {
        let args = Args::try_parse_from(["seed-data", "--migrate"]).expect("valid arguments");
        assert!(args.migrate);
        assert!(!args.reset);
        assert_eq!(args.days, 90);
    }

    #[test]
    fn reset_must_be_requested_explicitly() {
        let args = Args::try_parse_from(["seed-data", "--reset", "--days", "30"])
            .expect("valid arguments");
        assert!(args.reset);
        assert_eq!(args.days, 30);
    }
}
