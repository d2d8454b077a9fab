// C-compatible FFI bindings for host integration.
//
// Safety requirements:
// - All pointers must be non-null unless documented otherwise
// - All handles must be created by this module and not fabricated
// - String parameters must be valid null-terminated UTF-8
// - Caller must call the corresponding _destroy function for each _create
// - Strings returned by this module must be released with gaffer_string_free

use std::ffi::{CStr, CString, c_char};

use crate::catalog::{Catalog, VariantRequest};
use crate::error::GafferError;
use crate::look::HdriLook;
use crate::state::ParamValue;

use log::{debug, error, warn};

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the env_logger backend.
///
/// Filtering follows `RUST_LOG`, defaulting to `info`. Calling it more than
/// once is harmless.
#[unsafe(no_mangle)]
pub extern "C" fn gaffer_init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Opaque Handle Types
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque handle to an HdriLook and the graph it drives.
pub struct GafferLook {
    inner: HdriLook,
}

/// Opaque handle to an image catalog.
pub struct GafferCatalog {
    inner: Catalog,
}

// ═══════════════════════════════════════════════════════════════════════════
// Status Codes
// ═══════════════════════════════════════════════════════════════════════════

/// Result of a look operation.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GafferStatus {
    Ok = 0,
    /// Succeeded, but a fallback variant was bound.
    NeedsAttention = 1,
    NullPointer = -1,
    InvalidString = -2,
    UnknownParameter = -3,
    InvalidValue = -4,
    VariantNotFound = -5,
    NotBound = -6,
    Failed = -7,
}

impl From<&GafferError> for GafferStatus {
    fn from(e: &GafferError) -> Self {
        match e {
            GafferError::UnknownParameter { .. } => GafferStatus::UnknownParameter,
            GafferError::InvalidParameterValue { .. } => GafferStatus::InvalidValue,
            GafferError::VariantNotFound { .. } => GafferStatus::VariantNotFound,
            GafferError::NotBound => GafferStatus::NotBound,
            _ => GafferStatus::Failed,
        }
    }
}

fn status_of<T>(result: crate::error::Result<T>, what: &str) -> GafferStatus {
    match result {
        Ok(_) => GafferStatus::Ok,
        Err(e) => {
            warn!("{} failed: {}", what, e);
            GafferStatus::from(&e)
        }
    }
}

/// Borrow a C string as UTF-8.
///
/// # Safety
/// `s` must be NULL or a valid null-terminated string that outlives `'a`.
unsafe fn borrow_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s).to_str().ok() }
}

/// Variant request from a C string. NULL selects the smallest variant.
///
/// # Safety
/// `variant` must be NULL or a valid null-terminated string.
unsafe fn variant_request(variant: *const c_char) -> Option<VariantRequest> {
    if variant.is_null() {
        return Some(VariantRequest::Smallest);
    }
    unsafe { borrow_str(variant) }.and_then(|s| s.parse().ok())
}

// ═══════════════════════════════════════════════════════════════════════════
// Catalog Functions
// ═══════════════════════════════════════════════════════════════════════════

/// Load a catalog JSON file.
///
/// Returns NULL if the path is invalid or the file cannot be read. The
/// handle must be freed with `catalog_destroy`.
///
/// # Safety
/// `path` must be a valid null-terminated UTF-8 string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn catalog_load(path: *const c_char) -> *mut GafferCatalog {
    let Some(path) = (unsafe { borrow_str(path) }) else {
        return std::ptr::null_mut();
    };
    match Catalog::load(path) {
        Ok(catalog) => {
            debug!("loaded catalog {} ({} images)", path, catalog.len());
            Box::into_raw(Box::new(GafferCatalog { inner: catalog }))
        }
        Err(e) => {
            error!("{}", e);
            std::ptr::null_mut()
        }
    }
}

/// Destroy a catalog.
///
/// # Safety
/// `catalog` must be a valid pointer returned by `catalog_load`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn catalog_destroy(catalog: *mut GafferCatalog) {
    if !catalog.is_null() {
        unsafe { drop(Box::from_raw(catalog)) };
    }
}

/// Number of logical images in the catalog.
///
/// # Safety
/// `catalog` must be NULL or a valid pointer returned by `catalog_load`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn catalog_count(catalog: *const GafferCatalog) -> u32 {
    if catalog.is_null() {
        return 0;
    }
    unsafe { (*catalog).inner.len() as u32 }
}

// ═══════════════════════════════════════════════════════════════════════════
// Look Lifecycle
// ═══════════════════════════════════════════════════════════════════════════

/// Create an unbound look with an empty graph.
///
/// Returns an opaque pointer that must be freed with `look_destroy`.
#[unsafe(no_mangle)]
pub extern "C" fn look_create() -> *mut GafferLook {
    Box::into_raw(Box::new(GafferLook {
        inner: HdriLook::new(),
    }))
}

/// Destroy a look.
///
/// # Safety
/// `look` must be a valid pointer returned by `look_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn look_destroy(look: *mut GafferLook) {
    if !look.is_null() {
        unsafe { drop(Box::from_raw(look)) };
    }
}

/// Bind an image and synthesize the graph.
///
/// `variant` is "smallest", "biggest", an exact catalog path, or NULL for
/// the smallest variant.
///
/// # Safety
/// - `look` and `catalog` must be valid handles
/// - `name` must be a valid null-terminated UTF-8 string
/// - `variant` must be NULL or a valid null-terminated UTF-8 string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn look_enable(
    look: *mut GafferLook,
    catalog: *const GafferCatalog,
    name: *const c_char,
    variant: *const c_char,
) -> GafferStatus {
    if look.is_null() || catalog.is_null() {
        return GafferStatus::NullPointer;
    }
    let (Some(name), Some(request)) = (unsafe { borrow_str(name) }, unsafe {
        variant_request(variant)
    }) else {
        return GafferStatus::InvalidString;
    };

    let look = unsafe { &mut (*look).inner };
    let catalog = unsafe { &(*catalog).inner };
    match look.enable(catalog, name, &request) {
        Ok(_) if look.needs_attention() => GafferStatus::NeedsAttention,
        result => status_of(result, "enable"),
    }
}

/// Bind a different image without changing the topology.
///
/// # Safety
/// Same requirements as `look_enable`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn look_swap_image(
    look: *mut GafferLook,
    catalog: *const GafferCatalog,
    name: *const c_char,
    variant: *const c_char,
) -> GafferStatus {
    if look.is_null() || catalog.is_null() {
        return GafferStatus::NullPointer;
    }
    let (Some(name), Some(request)) = (unsafe { borrow_str(name) }, unsafe {
        variant_request(variant)
    }) else {
        return GafferStatus::InvalidString;
    };

    let look = unsafe { &mut (*look).inner };
    let catalog = unsafe { &(*catalog).inner };
    match look.swap_image(catalog, name, &request) {
        Ok(_) if look.needs_attention() => GafferStatus::NeedsAttention,
        result => status_of(result, "swap image"),
    }
}

/// Stop driving the graph and mute every managed stage.
///
/// # Safety
/// `look` must be NULL or a valid pointer returned by `look_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn look_disable(look: *mut GafferLook) -> GafferStatus {
    if look.is_null() {
        return GafferStatus::NullPointer;
    }
    status_of(unsafe { (*look).inner.disable() }, "disable")
}

/// Restore every look parameter to neutral.
///
/// # Safety
/// `look` must be NULL or a valid pointer returned by `look_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn look_reset(look: *mut GafferLook) -> GafferStatus {
    if look.is_null() {
        return GafferStatus::NullPointer;
    }
    status_of(unsafe { (*look).inner.reset_look() }, "reset")
}

/// Whether the look has a bound image.
///
/// # Safety
/// `look` must be NULL or a valid pointer returned by `look_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn look_is_bound(look: *const GafferLook) -> bool {
    if look.is_null() {
        return false;
    }
    unsafe { (*look).inner.is_bound() }
}

/// Whether the last bind fell back to another variant.
///
/// # Safety
/// `look` must be NULL or a valid pointer returned by `look_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn look_needs_attention(look: *const GafferLook) -> bool {
    if look.is_null() {
        return false;
    }
    unsafe { (*look).inner.needs_attention() }
}

// ═══════════════════════════════════════════════════════════════════════════
// Parameters
// ═══════════════════════════════════════════════════════════════════════════

/// # Safety
/// `look` must be NULL or a valid handle; `name` must be NULL or a valid
/// null-terminated string.
unsafe fn apply_value(look: *mut GafferLook, name: *const c_char, value: ParamValue) -> GafferStatus {
    if look.is_null() {
        return GafferStatus::NullPointer;
    }
    let Some(name) = (unsafe { borrow_str(name) }) else {
        return GafferStatus::InvalidString;
    };
    status_of(unsafe { (*look).inner.apply(name, value) }, name)
}

/// Set a numeric look parameter by its UI name, e.g. "hdri_contrast".
///
/// # Safety
/// - `look` must be a valid handle
/// - `name` must be a valid null-terminated UTF-8 string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn look_apply_float(
    look: *mut GafferLook,
    name: *const c_char,
    value: f32,
) -> GafferStatus {
    unsafe { apply_value(look, name, ParamValue::Float(value)) }
}

/// Set a toggle look parameter by its UI name, e.g. "hdri_use_darkened_jpg".
///
/// # Safety
/// Same requirements as `look_apply_float`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn look_apply_bool(
    look: *mut GafferLook,
    name: *const c_char,
    value: bool,
) -> GafferStatus {
    unsafe { apply_value(look, name, ParamValue::Toggle(value)) }
}

// ═══════════════════════════════════════════════════════════════════════════
// Graph Export
// ═══════════════════════════════════════════════════════════════════════════

/// Serialize the look's graph as JSON.
///
/// Returns NULL on failure. The string must be freed with
/// `gaffer_string_free`.
///
/// # Safety
/// `look` must be NULL or a valid pointer returned by `look_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn look_graph_json(look: *const GafferLook) -> *mut c_char {
    if look.is_null() {
        return std::ptr::null_mut();
    }
    let json = match unsafe { (*look).inner.graph().to_json() } {
        Ok(json) => json,
        Err(e) => {
            error!("{}", e);
            return std::ptr::null_mut();
        }
    };
    match CString::new(json) {
        Ok(s) => s.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Free a string returned by this module.
///
/// # Safety
/// `s` must be NULL or a pointer returned by this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gaffer_string_free(s: *mut c_char) {
    if !s.is_null() {
        unsafe { drop(CString::from_raw(s)) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    #[test]
    fn test_null_handles_are_rejected() {
        unsafe {
            assert_eq!(look_disable(std::ptr::null_mut()), GafferStatus::NullPointer);
            assert_eq!(
                look_apply_float(std::ptr::null_mut(), c("hdri_contrast").as_ptr(), 1.0),
                GafferStatus::NullPointer
            );
            assert!(look_graph_json(std::ptr::null()).is_null());
            assert!(catalog_load(std::ptr::null()).is_null());
            assert_eq!(catalog_count(std::ptr::null()), 0);
            assert_eq!(look_reset(std::ptr::null_mut()), GafferStatus::NullPointer);
            assert!(!look_is_bound(std::ptr::null()));
            assert!(!look_needs_attention(std::ptr::null()));
        }
    }

    #[test]
    fn test_look_round_trip_through_handles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let mut catalog = Catalog::new();
        catalog.insert("field", vec!["field_1k.hdr".to_string()]);
        catalog.save(&path).unwrap();

        unsafe {
            let cat = catalog_load(c(path.to_str().unwrap()).as_ptr());
            assert!(!cat.is_null());
            assert_eq!(catalog_count(cat), 1);

            let look = look_create();
            assert_eq!(
                look_apply_float(look, c("hdri_contrast").as_ptr(), 1.4),
                GafferStatus::Ok
            );
            assert_eq!(
                look_enable(look, cat, c("field").as_ptr(), std::ptr::null()),
                GafferStatus::Ok
            );
            assert!(look_is_bound(look));
            assert_eq!(
                look_apply_bool(look, c("hdri_contrast").as_ptr(), true),
                GafferStatus::InvalidValue
            );
            assert_eq!(
                look_apply_float(look, c("hdri_unknown").as_ptr(), 1.0),
                GafferStatus::UnknownParameter
            );
            assert_eq!(
                look_enable(look, cat, c("field").as_ptr(), c("field_8k.hdr").as_ptr()),
                GafferStatus::NeedsAttention
            );

            let json = look_graph_json(look);
            assert!(!json.is_null());
            let text = CStr::from_ptr(json).to_str().unwrap().to_string();
            assert!(text.contains("HDRI_Contrast"));
            gaffer_string_free(json);

            assert_eq!(look_disable(look), GafferStatus::Ok);
            look_destroy(look);
            catalog_destroy(cat);
        }
    }
}
