//! Test helpers: build the router and a test server.
//!
//! Run from workspace root: `cargo test -p filefield-api`.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum_test::TestServer;
use filefield_api::setup::setup_routes;
use filefield_core::{DecoderConfig, SchemaRegistry};
use filefield_decoder::MultipartDecoder;

/// Test server backed by a decoder with its own schema registry.
pub fn setup_test_server() -> TestServer {
    let decoder = Arc::new(
        MultipartDecoder::new(DecoderConfig::default()).with_registry(SchemaRegistry::new()),
    );
    let app = setup_routes(decoder);
    TestServer::new(app.into_make_service()).expect("Failed to create test server")
}
