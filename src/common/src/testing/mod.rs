//! Test utilities for dirprune.
//!
//! # Feature Flag
//!
//! This module is only available when the `testing` feature is enabled or during tests:
//!
//! ```toml
//! [dev-dependencies]
//! common = { path = "../common", features = ["testing"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use common::testing::TestConfigBuilder;
//!
//! let config = TestConfigBuilder::new()
//!     .with_base_dir("/data")
//!     .with_default_retention("7")
//!     .with_company("acme", "30")
//!     .build();
//! ```

mod config_builder;

pub use config_builder::TestConfigBuilder;
