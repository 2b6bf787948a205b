//! Process exit codes. Part of the CLI contract.

pub const SUCCESS: i32 = 0;
pub const DUMP_FAILED: i32 = 1; // Archive opened but streaming or finalizing failed
pub const SETUP_ERROR: i32 = 2; // Config error or archive could not be created
