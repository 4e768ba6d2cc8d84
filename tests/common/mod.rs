//! Common test utilities

use httpmock::prelude::*;
use resolwe::Resolwe;

/// Logs a test session in against a mock server.
pub fn logged_in(server: &MockServer) -> Resolwe {
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/rest-auth/login/")
            .json_body_partial(r#"{"username": "jane"}"#);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!({"id": 1, "username": "jane"}));
    });

    let res = Resolwe::connect("jane", "s3cret", &server.base_url())
        .expect("login against mock server")
        .with_progress(false);
    login.assert();
    res
}

/// Minimal sample payload as `/api/sample` reports it.
pub fn sample_json(id: u64, slug: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "slug": slug,
        "name": format!("Sample {}", slug),
        "created": "2024-01-05T10:00:00.000000Z",
        "modified": "2024-01-06T10:00:00.000000Z",
        "tags": ["community:rna-seq"],
        "descriptor": {}
    })
}
