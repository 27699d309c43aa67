pub mod manager;
pub mod models;
pub mod query_builder;
pub mod repository;
pub mod users;

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{Entity, Repository};
pub use users::UserRepository;
