pub mod utils;

pub mod gpu;

pub use gpu::*;
pub use utils::{Handle, Pool, Scope};
