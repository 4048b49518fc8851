use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

thread_local! {
    static DECODED: RefCell<Option<CString>> = RefCell::new(None);
}

#[no_mangle]
pub extern "C" fn add(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

#[no_mangle]
pub extern "C" fn add_u32(a: u32, b: u32) -> u32 {
    a.wrapping_add(b)
}

#[no_mangle]
pub extern "C" fn add_i64(a: i64, b: i64) -> i64 {
    a.wrapping_add(b)
}

#[no_mangle]
pub extern "C" fn add_u64(a: u64, b: u64) -> u64 {
    a.wrapping_add(b)
}

#[no_mangle]
pub extern "C" fn scale_f32(value: f32, factor: f32) -> f32 {
    value * factor
}

#[no_mangle]
pub extern "C" fn scale_f64(value: f64, factor: f64) -> f64 {
    value * factor
}

/// Returns its argument without dereferencing it.
#[no_mangle]
pub extern "C" fn identity_pointer(pointer: *const c_void) -> *const c_void {
    pointer
}

/// Returns a string that is not valid UTF-8.
#[no_mangle]
pub extern "C" fn invalid_utf8() -> *const c_char {
    b"\xff\xfe\0".as_ptr() as *const c_char
}

/// Returns `png <width>x<height>` for a PNG file, or null.
/// The returned string stays valid until the next `decode` on the same thread.
///
/// # Safety
/// `path` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn decode(path: *const c_char) -> *const c_char {
    if path.is_null() {
        return std::ptr::null();
    }
    let path = match CStr::from_ptr(path).to_str() {
        Ok(path) => path,
        Err(_) => return std::ptr::null(),
    };
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return std::ptr::null(),
    };
    let (width, height) = match png_dimensions(&bytes) {
        Some(dimensions) => dimensions,
        None => return std::ptr::null(),
    };

    let decoded = match CString::new(format!("png {}x{}", width, height)) {
        Ok(decoded) => decoded,
        Err(_) => return std::ptr::null(),
    };
    DECODED.with(|cell| {
        let mut cell = cell.borrow_mut();
        let pointer = decoded.as_ptr();
        *cell = Some(decoded);
        pointer
    })
}

fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    // signature, chunk length, `IHDR`, width, height
    if bytes.len() < 24 || bytes[0..8] != PNG_SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}
