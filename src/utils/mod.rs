pub mod handle;
pub mod scope;

pub use handle::{Handle, Pool};
pub use scope::Scope;
