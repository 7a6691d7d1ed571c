//! User-visible status lines.
//!
//! Status output is what a person running the tool reads; it is kept apart
//! from `tracing` logs, which may be filtered or redirected.

/// Print a progress/status line to stdout.
pub fn print_status(message: impl std::fmt::Display) {
    println!("▶ {}", message);
}

/// Print a success line to stdout.
pub fn print_success(message: impl std::fmt::Display) {
    println!("✓ {}", message);
}

/// Print an error line to stderr.
pub fn print_error_status(message: impl std::fmt::Display) {
    eprintln!("✗ {}", message);
}
