//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the supervisor against
//! mock or simulated adapters.  All tests run on the host (x86_64) with no
//! real hardware required.

mod channel_flow_tests;
mod supervisor_tests;
