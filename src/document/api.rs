use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{de_opt_string, non_empty, ExtraFields, Lenient};

/// How requests for an api profile are routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiType {
    /// A single OpenAI-compatible endpoint
    OpenaiCompat,
    /// A weighted pool of endpoints
    Pool,
}

impl ApiType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "openai_compat" => Some(ApiType::OpenaiCompat),
            "pool" => Some(ApiType::Pool),
            _ => None,
        }
    }
}

/// One member of a `pool` api profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Lenient<u64>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ApiEndpoint {
    pub fn is_complete(&self) -> bool {
        non_empty(&self.base_url).is_some() && non_empty(&self.model).is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiProfile {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_opt_string"
    )]
    pub api_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Lenient<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<Lenient<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<Lenient<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<Lenient<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<ApiEndpoint>>,
    /// Deprecated: ids of other api profiles making up a pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ApiProfile {
    pub fn api_type(&self) -> Option<ApiType> {
        non_empty(&self.api_type).and_then(ApiType::parse)
    }

    pub fn openai_compat(id: &str, base_url: &str, model: &str) -> Self {
        ApiProfile {
            id: Some(id.to_string()),
            name: Some(id.to_string()),
            api_type: Some("openai_compat".to_string()),
            base_url: Some(base_url.to_string()),
            model: Some(model.to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_numeric_fields() {
        let yaml = "id: a\ntype: openai_compat\ntimeout: -5\nrpm: fast\nconcurrency: 4\n";
        let api: ApiProfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(api.concurrency, Some(Lenient::Valid(4)));
        assert!(matches!(api.timeout, Some(Lenient::Invalid(_))));
        assert!(matches!(api.rpm, Some(Lenient::Invalid(_))));
        assert_eq!(api.api_type(), Some(ApiType::OpenaiCompat));
    }

    #[test]
    fn test_endpoint_completeness() {
        let yaml = "id: pool\ntype: pool\nendpoints:\n  - base_url: http://a\n    model: m\n  - base_url: http://b\n";
        let api: ApiProfile = serde_yaml::from_str(yaml).unwrap();
        let endpoints = api.endpoints.unwrap();
        assert!(endpoints[0].is_complete());
        assert!(!endpoints[1].is_complete());
    }
}
