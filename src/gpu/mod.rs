mod commands;
mod context;
mod conversions;
mod descriptors;
mod error;
pub mod instance;
mod image;
mod memory;
mod pipelines;
mod render_pass;
mod structs;
mod submit;
mod timing;
mod translate;

pub use commands::*;
pub use context::Context;
pub use descriptors::ResourcePool;
pub use error::*;
pub use image::Image;
pub use instance::{enumerate_devices, finalize, initialize};
pub use memory::Buffer;
pub use pipelines::Task;
pub use render_pass::RenderPass;
pub use structs::*;
pub use submit::{CommandDrain, Transaction};
pub use timing::Timestamp;

pub(crate) use context::select_memory_type;
pub(crate) use conversions::*;
