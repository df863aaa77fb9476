//! Property-based tests

mod frame_proptest;
mod registry_proptest;
