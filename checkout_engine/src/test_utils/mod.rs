//! Helpers for setting up throwaway databases and provider traffic in tests.
pub mod prepare_env;
pub mod seed;
