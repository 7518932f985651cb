//! Process exit codes. Part of the CLI contract.

pub const EXIT_SUCCESS: i32 = 0;
/// Run completed with failed cases and `--strict` was set.
pub const EXIT_CASE_FAILURES: i32 = 1;
/// Config, corpus or setup error; no run took place.
pub const EXIT_FATAL: i32 = 2;

/// Exit code for a completed run.
pub fn for_run(failed: usize, strict: bool) -> i32 {
    if strict && failed > 0 {
        EXIT_CASE_FAILURES
    } else {
        EXIT_SUCCESS
    }
}
