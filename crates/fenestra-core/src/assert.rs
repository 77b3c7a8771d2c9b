//! Contract checks that never unwind across a plugin host.
//!
//! [`safe_assert!`](crate::safe_assert) logs a failed condition at error level and returns early
//! with the given fallback. Enabling the `strict-asserts` feature turns failures into panics in
//! debug builds, which is useful while developing a UI but never in a shipped plugin.

use std::cell::Cell;

thread_local! {
    static VIOLATIONS: Cell<usize> = const { Cell::new(0) };
}

/// Returns early from the enclosing function when `cond` is false.
///
/// ```
/// use fenestra_core::safe_assert;
///
/// fn half(value: u32) -> u32 {
///     safe_assert!(value % 2 == 0, 0);
///     value / 2
/// }
///
/// assert_eq!(half(4), 2);
/// assert_eq!(half(3), 0);
/// ```
#[macro_export]
macro_rules! safe_assert {
    ($cond:expr) => {
        $crate::safe_assert!($cond, ())
    };
    ($cond:expr, $ret:expr) => {
        if !($cond) {
            $crate::assert::report_violation(stringify!($cond), file!(), line!());
            return $ret;
        }
    };
}

#[doc(hidden)]
#[cold]
pub fn report_violation(condition: &str, file: &str, line: u32) {
    VIOLATIONS.with(|count| count.set(count.get() + 1));
    tracing::error!(condition, file, line, "contract violation");

    #[cfg(all(debug_assertions, feature = "strict-asserts"))]
    panic!("contract violation: {condition} ({file}:{line})");
}

/// Number of contract violations reported on the current thread.
pub fn violation_count() -> usize {
    VIOLATIONS.with(Cell::get)
}
