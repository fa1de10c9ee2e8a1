//! Integration tests for price-feed

mod api_test;
mod config_test;
mod pipeline_test;
