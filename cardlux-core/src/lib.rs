pub mod checker;
pub mod errors;
pub mod filters;
pub mod models;
pub mod options;
pub mod progress;
pub mod scheduler;
pub mod selector;
pub mod session;
pub mod stats;
pub mod store;

pub use checker::*;
pub use errors::*;
pub use filters::*;
pub use models::*;
pub use options::*;
pub use progress::*;
pub use scheduler::*;
pub use selector::*;
pub use session::*;
pub use stats::*;
pub use store::*;
