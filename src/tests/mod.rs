//! End-to-end tests driving the pipeline against a wiremock server.

mod pipeline_e2e;
