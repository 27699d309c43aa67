pub mod body;

pub use body::{parse_id, JsonBody};
