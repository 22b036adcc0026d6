#[macro_export]
macro_rules! status {
    ($name:ident,$($arg:tt)*) => ({
        $crate::Status::$name(format!($($arg)*))
    })
}

#[macro_export]
macro_rules! invalid_argument {
    ($($arg:tt)*) => ($crate::status!(invalid_argument, $($arg)*))
}

#[macro_export]
macro_rules! permission_denied {
    ($($arg:tt)*) => ($crate::status!(permission_denied, $($arg)*))
}

#[macro_export]
macro_rules! not_found {
    ($($arg:tt)*) => ($crate::status!(not_found, $($arg)*))
}

#[macro_export]
macro_rules! failed_precondition {
    ($($arg:tt)*) => ($crate::status!(failed_precondition, $($arg)*))
}

#[macro_export]
macro_rules! internal {
    ($($arg:tt)*) => ($crate::status!(internal, $($arg)*))
}
