#![allow(unused_macros)]

/// Builds an [`crate::Error::Malformed`] carrying the call site.
///
/// ```rust, ignore
/// return Err(malformed_error!("Invalid coded index tag - {}", tag));
/// ```
macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Builds the [`crate::Error::Malformed`] used for reads past the end of a buffer.
///
/// A truncated buffer is a structural violation like any other, so it shares the
/// `Malformed` kind instead of having a sentinel of its own.
///
/// ```rust, ignore
/// if offset + 4 > data.len() {
///     return Err(out_of_bounds_error!());
/// }
/// ```
macro_rules! out_of_bounds_error {
    () => {
        crate::Error::Malformed {
            message: "Out of bound read would have occurred".to_string(),
            file: file!(),
            line: line!(),
        }
    };
}
