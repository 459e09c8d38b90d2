pub mod product;
pub mod product_in;
pub mod shop;

/// `product_in.type` value marking an inbound movement. Any other value is outbound.
pub const MOVEMENT_TYPE_IN: &str = "IN";
pub const MOVEMENT_TYPE_OUT: &str = "OUT";
