use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::db::types::UserRole;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(email(message = "invalid email address"))]
    pub(crate) email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub(crate) password: String,
    #[serde(default)]
    #[serde(alias = "studentClass")]
    pub(crate) student_class: Option<String>,
    #[serde(default)]
    pub(crate) stream: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserLogin {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProfileUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[serde(alias = "studentClass")]
    pub(crate) student_class: Option<String>,
    #[serde(default)]
    pub(crate) stream: Option<String>,
    #[serde(default)]
    #[serde(alias = "profileImage")]
    pub(crate) profile_image: Option<String>,
    #[serde(default)]
    pub(crate) bio: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ChangePassword {
    #[serde(alias = "currentPassword")]
    pub(crate) current_password: String,
    #[serde(alias = "newPassword")]
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub(crate) new_password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    pub(crate) student_class: Option<String>,
    pub(crate) stream: Option<String>,
    pub(crate) profile_image: Option<String>,
    pub(crate) bio: Option<String>,
    pub(crate) notifications_enabled: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            student_class: user.student_class,
            stream: user.stream,
            profile_image: user.profile_image,
            bio: user.bio,
            notifications_enabled: user.notifications_enabled,
            is_active: user.is_active,
            created_at: format_primitive(user.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_create_accepts_camel_case_aliases() {
        let payload: UserCreate = serde_json::from_value(serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "password": "long-enough",
            "studentClass": "12",
        }))
        .expect("deserialize");

        assert_eq!(payload.student_class.as_deref(), Some("12"));
        assert!(payload.stream.is_none());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn user_create_rejects_short_password_and_bad_email() {
        let payload: UserCreate = serde_json::from_value(serde_json::json!({
            "name": "Asha",
            "email": "not-an-email",
            "password": "short",
        }))
        .expect("deserialize");

        let err = payload.validate().expect_err("invalid");
        let text = err.to_string();
        assert!(text.contains("email"));
        assert!(text.contains("password"));
    }
}
