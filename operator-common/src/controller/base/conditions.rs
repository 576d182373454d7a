use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The overall state a condition reports.
pub enum ReadyState {
    Complete,
    Progressing,
    Failed(String),
}

impl ReadyState {
    fn into_fields(self) -> (&'static str, &'static str, Option<String>) {
        match self {
            Self::Complete => ("True", "AsExpected", None),
            Self::Progressing => ("False", "Progressing", None),
            Self::Failed(msg) => ("False", "Failed", Some(msg)),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Conditions(pub Vec<Condition>);

impl Conditions {
    /// Update a single condition, keeping the last transition timestamp
    /// when the status did not change.
    pub fn update<S: Into<String>>(&mut self, r#type: S, state: ReadyState) {
        let r#type = r#type.into();
        let (status, reason, message) = state.into_fields();
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        match self.0.iter_mut().find(|c| c.r#type == r#type) {
            Some(condition) => {
                if condition.status != status {
                    condition.last_transition_time = Some(now);
                }
                condition.status = status.into();
                condition.reason = Some(reason.into());
                condition.message = message;
            }
            None => self.0.push(Condition {
                r#type,
                status: status.into(),
                reason: Some(reason.into()),
                message,
                last_transition_time: Some(now),
            }),
        }
    }

    pub fn get(&self, r#type: &str) -> Option<&Condition> {
        self.0.iter().find(|c| c.r#type == r#type)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn update_adds_condition() {
        let mut conditions = Conditions::default();
        conditions.update("Ready", ReadyState::Complete);

        let condition = conditions.get("Ready").unwrap();
        assert_eq!(condition.status, "True");
        assert_eq!(condition.reason.as_deref(), Some("AsExpected"));
        assert_eq!(condition.message, None);
        assert!(condition.last_transition_time.is_some());
    }

    #[test]
    fn update_keeps_transition_time_for_same_status() {
        let mut conditions = Conditions::default();
        conditions.update("Ready", ReadyState::Complete);
        let first = conditions.get("Ready").unwrap().last_transition_time.clone();

        conditions.update("Ready", ReadyState::Complete);
        assert_eq!(conditions.get("Ready").unwrap().last_transition_time, first);
        assert_eq!(conditions.0.len(), 1);
    }

    #[test]
    fn update_records_failure() {
        let mut conditions = Conditions::default();
        conditions.update("Ready", ReadyState::Complete);
        conditions.update("Ready", ReadyState::Failed("boom".into()));

        let condition = conditions.get("Ready").unwrap();
        assert_eq!(condition.status, "False");
        assert_eq!(condition.reason.as_deref(), Some("Failed"));
        assert_eq!(condition.message.as_deref(), Some("boom"));
    }

    #[test]
    fn serializes_camel_case() {
        let mut conditions = Conditions::default();
        conditions.update("Reconciled", ReadyState::Progressing);

        let json = serde_json::to_value(&conditions).unwrap();
        assert_eq!(json[0]["type"], "Reconciled");
        assert_eq!(json[0]["status"], "False");
        assert!(json[0]["lastTransitionTime"].is_string());
    }
}
