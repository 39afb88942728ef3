//! Cross-component scenario tests for the trader core.

mod integration_tests;
