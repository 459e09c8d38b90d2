pub mod forecasting;

pub use forecasting::{forecasting_router, ForecastingHandlerState};
