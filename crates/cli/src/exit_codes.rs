//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `rmerge` exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 60-69   | dedup            | Configuration and runtime failures       |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into [`dedup_exit_code`] or the relevant command

use recordmerge_resolve::DedupError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors. Includes runs over an
/// empty input file.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, unknown `--strategy` value, missing config
/// file. Argument errors are emitted by clap itself.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Dedup (60-69)
// =============================================================================

/// Config file is not valid TOML, has an out-of-range threshold, an
/// unknown strategy or no `[input]` section.
pub const EXIT_DEDUP_INVALID_CONFIG: u8 = 60;

/// I/O or CSV failure: unreadable input, missing column, unwritable output.
pub const EXIT_DEDUP_RUNTIME: u8 = 61;

/// Map an engine error to its exit code.
pub fn dedup_exit_code(err: &DedupError) -> u8 {
    if err.is_config_error() {
        EXIT_DEDUP_INVALID_CONFIG
    } else {
        EXIT_DEDUP_RUNTIME
    }
}
