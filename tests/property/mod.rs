//! Property-based tests for root evolution
