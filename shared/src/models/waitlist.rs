//! Waitlist Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};
use crate::validation::{MAX_NAME_LEN, validate_len};

/// 最少人数
pub const MIN_PEOPLE: i32 = 1;
/// 最多人数
pub const MAX_PEOPLE: i32 = 20;
/// 新表单默认人数
pub const DEFAULT_PEOPLE: i32 = 2;

/// 页面文案
pub const NAME_REQUIRED_MESSAGE: &str = "이름을 입력해주세요.";
pub const PEOPLE_RANGE_MESSAGE: &str = "인원수는 1명 이상 20명 이하여야 합니다.";

/// Waitlist entry (`waitlist` table row)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: String,
    pub customer_name: String,
    pub people_count: i32,
    /// 由后端赋值
    pub created_at: DateTime<Utc>,
    /// None = 仍在等待
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WaitlistEntry {
    pub fn is_active(&self) -> bool {
        self.completed_at.is_none()
    }
}

/// Insert payload for a new waitlist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistFormData {
    pub customer_name: String,
    pub people_count: i32,
}

impl WaitlistFormData {
    pub fn new(customer_name: impl Into<String>, people_count: i32) -> Self {
        Self {
            customer_name: customer_name.into(),
            people_count,
        }
    }

    /// 校验失败时 message 即页面要显示的文案
    pub fn validate(&self) -> Result<(), AppError> {
        if self.customer_name.trim().is_empty() {
            return Err(
                AppError::with_message(ErrorCode::WaitlistNameRequired, NAME_REQUIRED_MESSAGE)
                    .with_detail("field", "customer_name"),
            );
        }
        validate_len(self.customer_name.trim(), "customer_name", MAX_NAME_LEN)?;
        if !(MIN_PEOPLE..=MAX_PEOPLE).contains(&self.people_count) {
            return Err(AppError::with_message(
                ErrorCode::WaitlistInvalidPeopleCount,
                PEOPLE_RANGE_MESSAGE,
            )
            .with_detail("people_count", self.people_count));
        }
        Ok(())
    }

    /// Trimmed copy, as stored
    pub fn normalized(&self) -> Self {
        Self {
            customer_name: self.customer_name.trim().to_string(),
            people_count: self.people_count,
        }
    }
}

/// Payload sent to mark an entry complete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistCompletion {
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_people_count_bounds() {
        for ok in [1, 2, 20] {
            assert!(WaitlistFormData::new("홍길동", ok).validate().is_ok());
        }
        for bad in [0, 21, -3] {
            let err = WaitlistFormData::new("홍길동", bad).validate().unwrap_err();
            assert_eq!(err.code, ErrorCode::WaitlistInvalidPeopleCount);
            assert_eq!(err.message, PEOPLE_RANGE_MESSAGE);
        }
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = WaitlistFormData::new("   ", 2).validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::WaitlistNameRequired);
        assert_eq!(err.message, NAME_REQUIRED_MESSAGE);
    }

    #[test]
    fn test_normalized_trims_name() {
        let form = WaitlistFormData::new("  김철수 ", 4).normalized();
        assert_eq!(form.customer_name, "김철수");
    }

    #[test]
    fn test_entry_active() {
        let mut entry = WaitlistEntry {
            id: "w1".into(),
            customer_name: "a".into(),
            people_count: 2,
            created_at: Utc::now(),
            completed_at: None,
        };
        assert!(entry.is_active());
        entry.completed_at = Some(Utc::now());
        assert!(!entry.is_active());
    }
}
