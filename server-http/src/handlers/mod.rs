mod cars;
mod health;
mod listings;
mod purge;

pub use cars::{car_statistics, list_cars, show_car};
pub use health::health_check;
pub use listings::{create_listing, delete_listing, restore_listing, update_listing};
pub use purge::{cache_status, purge_cache};
