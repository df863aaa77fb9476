//! Custom assertion macros
//!
//! Small wrappers that print the interesting part of a failure.

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert a response status, printing the JSON error body on mismatch
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {{
        let response = $response;
        if response.status() != $status {
            let status = response.status();
            let body = $crate::common::body_json(response).await;
            panic!("Expected status {}, got {}: {}", $status, status, body);
        }
        response
    }};
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}
