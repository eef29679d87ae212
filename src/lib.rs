pub mod game;

// ============================================================================
// Profiling Macros
// ============================================================================

/// Conditionally log messages based on frame interval when perf_stats feature is enabled.
///
/// This macro logs a message every 100 frames. When the perf_stats feature is disabled,
/// this macro compiles to nothing.
///
/// # Example
/// ```ignore
/// profile_log!(tick, "Stepped {} vehicles", world.vehicles().len());
/// ```
///
/// Without `perf_stats` even the arguments (e.g. `world.vehicles().len()`) are
/// not evaluated.
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {
        if $tick.0 % 100 == 0 {
            bevy::prelude::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {};
}
