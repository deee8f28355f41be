//! Cross-module integration tests.

mod export_tests;
