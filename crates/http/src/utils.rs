//! Utility macros shared by the parser and the session.

/// A macro for early returns with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
/// It's useful for validation checks where you want to return early with an error
/// if some condition is not satisfied.
///
/// # Example
///
/// ```ignore
/// ensure!(capacity.is_power_of_two(), ConfigError::not_power_of_two("input", capacity));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
