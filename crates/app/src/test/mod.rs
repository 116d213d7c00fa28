//! Test support: throwaway `PostgreSQL` databases and fixtures.

pub(crate) mod helpers;

pub(crate) use context::TestContext;
