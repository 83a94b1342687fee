pub mod address_service;
pub mod auth_service;
pub mod cart_service;
pub mod category_service;
pub mod image_service;
pub mod order_service;
pub mod payment_gateway;
pub mod payment_service;
pub mod product_service;
pub mod user_service;

pub use auth_service::Claims;
pub use payment_gateway::{PaymentGateway, SimulatedGateway};
