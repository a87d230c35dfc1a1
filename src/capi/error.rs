//! Error report accessors

use super::release;
use crate::error::{ErrorReport, StatusCode};
use std::ffi::c_char;
use std::ptr;

/// Status code of a report (`SUCCESS` for null)
///
/// # Safety
///
/// `report` must be null or a live report returned by this library.
#[no_mangle]
pub unsafe extern "C" fn trueno_error_code(report: *const ErrorReport) -> StatusCode {
    unsafe { report.as_ref() }.map_or(StatusCode::Success, ErrorReport::code)
}

/// NUL-terminated message of a report (null for null)
///
/// The string is owned by the report and valid until it is freed.
///
/// # Safety
///
/// `report` must be null or a live report returned by this library.
#[no_mangle]
pub unsafe extern "C" fn trueno_error_message(report: *const ErrorReport) -> *const c_char {
    unsafe { report.as_ref() }.map_or(ptr::null(), |r| r.message_c().as_ptr())
}

/// Release a report and null `*report`
///
/// # Safety
///
/// `report` must be null or point to a pointer that is null or was stored by
/// this library in an `error` out-parameter.
#[no_mangle]
pub unsafe extern "C" fn trueno_error_free(report: *mut *mut ErrorReport) {
    unsafe { release(report) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::ffi::CStr;

    #[test]
    fn test_report_accessors() {
        let mut report = Box::into_raw(Box::new(ErrorReport::from(Error::invalid("num_edges"))));
        unsafe {
            assert_eq!(trueno_error_code(report), StatusCode::InvalidInput);
            let message = CStr::from_ptr(trueno_error_message(report));
            assert!(message.to_str().unwrap().contains("num_edges"));
            trueno_error_free(&mut report);
        }
        assert!(report.is_null());
    }

    #[test]
    fn test_null_report() {
        unsafe {
            assert_eq!(trueno_error_code(ptr::null()), StatusCode::Success);
            assert!(trueno_error_message(ptr::null()).is_null());
        }
    }
}
