//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one layer of the stack
//! against the mock ports in `mock_hw`.  All tests run on the host with no
//! real hardware required.

mod mock_hw;
mod robot_tests;
mod scheduler_tests;
