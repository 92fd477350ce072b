use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub handphone: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload accepted by both create and update.
///
/// Missing strings deserialize as empty so they are reported by validation
/// as `required` instead of failing the JSON parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateMemberRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_required"))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_required"), email)]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "validate_numeric"))]
    pub handphone: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_required"), length(min = 8, code = "min"))]
    pub password: String,
    #[serde(default)]
    pub photo: Option<String>,
}

impl CreateMemberRequest {
    /// Empty handphone means "no handphone".
    pub fn normalized_handphone(&self) -> Option<String> {
        self.handphone
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_ids"))]
    pub ids: Vec<Uuid>,
}

fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn validate_numeric(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("numeric"))
    }
}

fn validate_ids(ids: &[Uuid]) -> Result<(), ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::new("required"));
    }
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    if !ids.iter().all(|id| seen.insert(*id)) {
        return Err(ValidationError::new("unique"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateMemberRequest {
        CreateMemberRequest {
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            handphone: Some("6281200000001".to_string()),
            password: "password1".to_string(),
            photo: None,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_empty_handphone_is_accepted_and_normalized_away() {
        let mut req = valid_request();
        req.handphone = Some(String::new());
        assert!(req.validate().is_ok());
        assert_eq!(req.normalized_handphone(), None);
    }

    #[test]
    fn test_non_numeric_handphone_rejected() {
        let mut req = valid_request();
        req.handphone = Some("+62-812".to_string());
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("handphone"));
    }

    #[test]
    fn test_missing_fields_deserialize_then_fail_validation() {
        let req: CreateMemberRequest = serde_json::from_str("{}").unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("handphone"));
    }

    #[test]
    fn test_client_timestamps_and_id_are_ignored() {
        let req: CreateMemberRequest = serde_json::from_value(serde_json::json!({
            "id": "not-used",
            "name": "Ann",
            "email": "ann@x.com",
            "password": "password1",
            "created_at": "2001-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(req.name, "Ann");
    }

    #[test]
    fn test_bulk_delete_rejects_empty_and_duplicate_ids() {
        let empty = BulkDeleteRequest { ids: vec![] };
        assert!(empty.validate().is_err());

        let id = Uuid::new_v4();
        let duplicated = BulkDeleteRequest { ids: vec![id, id] };
        let errors = duplicated.validate().unwrap_err();
        assert_eq!(errors.field_errors()["ids"][0].code, "unique");

        let distinct = BulkDeleteRequest {
            ids: vec![Uuid::new_v4(), Uuid::new_v4()],
        };
        assert!(distinct.validate().is_ok());
    }

    #[test]
    fn test_member_serialization_hides_password_hash() {
        let now = Utc::now();
        let member = Member {
            id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            handphone: None,
            password_hash: "$argon2id$secret".to_string(),
            photo: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&member).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
    }
}
