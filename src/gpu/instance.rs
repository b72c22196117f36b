use super::{GPUError, Result};
use ash::vk;
use std::ffi::{CStr, CString};
use std::sync::Mutex;

/// Name of the standard validation layer, enabled in debug builds (or when
/// `KOJI_VALIDATION=1`) if the loader exposes it.
const VALIDATION_LAYER: &CStr =
    unsafe { CStr::from_bytes_with_nul_unchecked(b"VK_LAYER_KHRONOS_validation\0") };

struct InstanceShared {
    _entry: ash::Entry,
    instance: ash::Instance,
    physical_devices: Vec<vk::PhysicalDevice>,
    descriptions: Vec<String>,
    refs: usize,
}

static SHARED: Mutex<Option<InstanceShared>> = Mutex::new(None);

fn validation_requested() -> bool {
    match std::env::var("KOJI_VALIDATION") {
        Ok(v) => v == "1",
        Err(_) => cfg!(debug_assertions),
    }
}

fn describe_device(instance: &ash::Instance, pdevice: vk::PhysicalDevice) -> String {
    let prop = unsafe { instance.get_physical_device_properties(pdevice) };
    let name = unsafe { CStr::from_ptr(prop.device_name.as_ptr()) }
        .to_string_lossy()
        .into_owned();
    let kind = match prop.device_type {
        vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
        vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
        vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
        vk::PhysicalDeviceType::CPU => "CPU",
        vk::PhysicalDeviceType::OTHER => "Other",
        _ => "Unknown",
    };
    format!(
        "{} ({}, {}.{})",
        name,
        kind,
        vk::api_version_major(prop.api_version),
        vk::api_version_minor(prop.api_version)
    )
}

fn create_shared() -> Result<InstanceShared> {
    let entry = unsafe { ash::Entry::load() }?;

    let app_name = CString::new("koji").unwrap();
    let app_info = vk::ApplicationInfo::builder()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(&app_name)
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::make_api_version(0, 1, 1, 0))
        .build();

    let mut layers = Vec::new();
    if validation_requested() {
        let available = entry.enumerate_instance_layer_properties()?;
        if available
            .iter()
            .any(|prop| unsafe { CStr::from_ptr(prop.layer_name.as_ptr()) } == VALIDATION_LAYER)
        {
            layers.push(VALIDATION_LAYER.as_ptr());
            log::debug!("vulkan validation layer is enabled");
        }
    }

    let instance = unsafe {
        entry.create_instance(
            &vk::InstanceCreateInfo::builder()
                .application_info(&app_info)
                .enabled_layer_names(&layers)
                .build(),
            None,
        )
    }?;

    let physical_devices = unsafe { instance.enumerate_physical_devices() }?;
    let descriptions: Vec<String> = physical_devices
        .iter()
        .map(|&pd| describe_device(&instance, pd))
        .collect();
    for (i, desc) in descriptions.iter().enumerate() {
        log::debug!("discovered device #{}: {}", i, desc);
    }
    log::info!("vulkan backend initialized");

    Ok(InstanceShared {
        _entry: entry,
        instance,
        physical_devices,
        descriptions,
        refs: 0,
    })
}

/// Initializes the process-wide instance state. Calling this again while the
/// instance is alive logs a warning and does nothing.
pub fn initialize() -> Result<()> {
    let mut shared = SHARED.lock().unwrap();
    if shared.is_some() {
        log::warn!("ignored redundant vulkan module initialization");
        return Ok(());
    }
    *shared = Some(create_shared()?);
    Ok(())
}

/// Tears down the process-wide instance state. Refuses (with a warning) while
/// any context still holds a reference; calling it when nothing is
/// initialized is a no-op.
pub fn finalize() {
    let mut shared = SHARED.lock().unwrap();
    let live_refs = match shared.as_ref() {
        None => return,
        Some(state) => state.refs,
    };
    if live_refs > 0 {
        log::warn!(
            "cannot finalize the vulkan module: {} context(s) still alive",
            live_refs
        );
        return;
    }
    let state = shared.take().unwrap();
    unsafe { state.instance.destroy_instance(None) };
    log::debug!("vulkan backend finalized");
}

/// Human-readable descriptions of every physical device, in enumeration
/// order. Initializes the instance on demand.
pub fn enumerate_devices() -> Result<Vec<String>> {
    let mut shared = SHARED.lock().unwrap();
    if shared.is_none() {
        *shared = Some(create_shared()?);
    }
    Ok(shared.as_ref().unwrap().descriptions.clone())
}

/// Takes a reference on the shared state for a new context and hands back
/// everything it needs. Initializes lazily.
pub(crate) fn acquire(
    device_index: usize,
) -> Result<(ash::Instance, vk::PhysicalDevice, String)> {
    let mut shared = SHARED.lock().unwrap();
    if shared.is_none() {
        *shared = Some(create_shared()?);
    }
    let state = shared.as_mut().unwrap();
    if device_index >= state.physical_devices.len() {
        return Err(GPUError::NoSuchDevice {
            requested: device_index,
            available: state.physical_devices.len(),
        });
    }
    state.refs += 1;
    Ok((
        state.instance.clone(),
        state.physical_devices[device_index],
        state.descriptions[device_index].clone(),
    ))
}

/// Drops a context's reference.
pub(crate) fn release() {
    let mut shared = SHARED.lock().unwrap();
    if let Some(state) = shared.as_mut() {
        state.refs = state.refs.saturating_sub(1);
    }
}
