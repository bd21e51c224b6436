pub mod req_manager;
pub use req_manager::{ReqManager, ReqManagerConfig};
