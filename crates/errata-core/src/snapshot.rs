use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::Result;
use crate::types::Occurrence;

/// Value copy of one group at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AggregatedErrorView {
    pub aggregation_key: String,
    pub total_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen_at: OffsetDateTime,
    /// Oldest first.
    pub latest_errors: Vec<Occurrence>,
}

/// Point-in-time export of every group, sorted by aggregation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnapshotPayload {
    /// Id of the collector that produced the payload; changes on restart.
    pub target_uuid: Uuid,
    pub aggregated_errors: Vec<AggregatedErrorView>,
}

impl SnapshotPayload {
    pub fn get(&self, key: &str) -> Option<&AggregatedErrorView> {
        self.aggregated_errors
            .iter()
            .find(|g| g.aggregation_key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.aggregated_errors.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorInstance, Severity};

    fn payload() -> SnapshotPayload {
        let occ = Occurrence::new(
            ErrorInstance::custom("testing", "manual_error", vec!["f @ a.rs:1:1".to_string()]),
            Severity::Error,
            None,
        );
        SnapshotPayload {
            target_uuid: Uuid::new_v4(),
            aggregated_errors: vec![AggregatedErrorView {
                aggregation_key: "manual_error@testing".to_string(),
                total_count: 3,
                created_at: occ.observed_at,
                last_seen_at: occ.observed_at,
                latest_errors: vec![occ],
            }],
        }
    }

    #[test]
    fn json_layout() {
        let json = payload().to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        let group = &v["AggregatedErrors"][0];
        assert_eq!(group["AggregationKey"], "manual_error@testing");
        assert_eq!(group["TotalCount"], 3);
        assert_eq!(group["LatestErrors"][0]["Error"]["Message"], "testing");
        assert_eq!(group["LatestErrors"][0]["Error"]["Stacktrace"][0], "f @ a.rs:1:1");
        assert_eq!(group["LatestErrors"][0]["Severity"], "error");
        assert!(v["TargetUuid"].is_string());
    }

    #[test]
    fn pretty_json_parses_back() {
        let p = payload();
        let back: SnapshotPayload = serde_json::from_str(&p.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn get_by_key() {
        let p = payload();
        assert_eq!(p.get("manual_error@testing").unwrap().total_count, 3);
        assert!(p.get("missing").is_none());
        assert!(!p.is_empty());
    }
}
