use serde::{Deserialize, Serialize};

/// A registered member. The id is assigned by storage on creation and is
/// absent on records that have not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Option<i64>,
    pub email: String,
    pub password: String,
}

/// Request model carrying a claimed member id plus login credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRequest {
    pub member_id: i64,
    pub email: String,
    pub password: String,
}

/// Response model for member operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberResponse {
    pub id: Option<i64>,
    pub email: String,
    pub password: String,
}

impl Member {
    /// Create an unpersisted member record
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            password: password.into(),
        }
    }

    /// Create a member record with a storage-assigned id
    pub fn with_id(id: i64, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl MemberRequest {
    pub fn new(member_id: i64, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            member_id,
            email: email.into(),
            password: password.into(),
        }
    }
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            email: member.email,
            password: member.password,
        }
    }
}

impl From<&Member> for MemberResponse {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            email: member.email.clone(),
            password: member.password.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpersisted_member_has_no_id() {
        let member = Member::new("a@a.com", "password1");

        assert_eq!(member.id, None);
        assert_eq!(member.email, "a@a.com");
        assert_eq!(member.password, "password1");
    }

    #[test]
    fn test_response_projects_all_fields() {
        let member = Member::with_id(2, "b@b.com", "password2");
        let response = MemberResponse::from(&member);

        assert_eq!(response.id, Some(2));
        assert_eq!(response.email, "b@b.com");
        assert_eq!(response.password, "password2");
    }

    #[test]
    fn test_response_equality_is_value_based() {
        let member = Member::with_id(2, "b@b.com", "password2");

        assert_eq!(
            MemberResponse::from(&member),
            MemberResponse::from(member.clone())
        );
    }

    #[test]
    fn test_serde_serialization() {
        let member = Member::with_id(1, "a@a.com", "password1");

        let json = serde_json::to_string(&member).unwrap();
        let deserialized: Member = serde_json::from_str(&json).unwrap();

        assert_eq!(member, deserialized);
    }
}
