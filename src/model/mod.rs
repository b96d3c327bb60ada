pub mod common;
pub mod page;
pub mod representation;
pub mod request;
pub mod user_context;

pub use common::*;
pub use page::*;
pub use representation::*;
pub use request::*;
pub use user_context::*;
