pub mod error;
pub mod pool;
pub mod store;
pub mod task;

pub use error::DbError;
pub use pool::Pool;
pub use store::{Query, Store};
pub use task::Task;
