//! # Response Formatting
//!
//! Standard response types for REST API.

use serde::Serialize;

/// One page of a list plus the total number of matches
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T: Serialize> {
    pub status: &'static str,
    /// Documents on this page
    pub results: usize,
    /// Documents matching the filter across all pages
    pub total_results: u64,
    pub data: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>, total_results: u64) -> Self {
        Self {
            status: "success",
            results: data.len(),
            total_results,
            data,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_response_serialization() {
        let response = ListResponse::new(vec![json!({"id": 1}), json!({"id": 2})], 42);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["results"], 2);
        assert_eq!(json["totalResults"], 42);
        assert_eq!(json["data"][1]["id"], 2);
    }

    #[test]
    fn test_health_response_serialization() {
        let json = serde_json::to_value(HealthResponse::ok()).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
