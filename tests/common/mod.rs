use koji::{Context, ContextInfo};
use std::sync::Once;

static LOG_INIT: Once = Once::new();

/// Creates a context for a device test, or returns `None` (after printing a
/// skip notice) when no Vulkan implementation is available.
pub fn test_context(name: &str) -> Option<Context> {
    LOG_INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
    match Context::new(&ContextInfo {
        debug_name: name,
        device_index: 0,
    }) {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            eprintln!(
                "Skipping {} test: Vulkan initialization unavailable: {:?}",
                name, err
            );
            None
        }
    }
}
