//! 顾客候位登记表单

use std::sync::Arc;

use menu_client::DataClient;
use serde::{Deserialize, Serialize};
use shared::models::{DEFAULT_PEOPLE, PEOPLE_RANGE_MESSAGE, WaitlistEntry, WaitlistFormData};

use crate::utils::{AppError, AppResult, ErrorCode};

pub const JOIN_SUCCESS_MESSAGE: &str = "대기 등록이 완료되었습니다!";
pub const JOIN_FAILED_PREFIX: &str = "대기 등록 실패: ";

/// 表单原始输入 (人数为文本，严格解析)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistFormInput {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub people_count: String,
}

impl Default for WaitlistFormInput {
    fn default() -> Self {
        Self {
            customer_name: String::new(),
            people_count: DEFAULT_PEOPLE.to_string(),
        }
    }
}

impl WaitlistFormInput {
    /// 解析并校验，返回去掉首尾空白的表单
    pub fn parse(&self) -> AppResult<WaitlistFormData> {
        // 姓名先于人数校验
        WaitlistFormData::new(self.customer_name.clone(), DEFAULT_PEOPLE).validate()?;

        let people_count = self.people_count.trim().parse::<i32>().map_err(|_| {
            AppError::with_message(ErrorCode::WaitlistInvalidPeopleCount, PEOPLE_RANGE_MESSAGE)
                .with_detail("people_count", self.people_count.clone())
        })?;

        let form = WaitlistFormData::new(self.customer_name.clone(), people_count);
        form.validate()?;
        Ok(form.normalized())
    }
}

/// 登记: 校验失败不会发起写入
pub async fn submit(
    client: &Arc<dyn DataClient>,
    form: &WaitlistFormData,
) -> AppResult<WaitlistEntry> {
    form.validate()?;
    let form = form.normalized();

    let entry = client
        .insert_waitlist(&form)
        .await
        .map_err(AppError::from)?;
    tracing::info!(entry_id = %entry.id, people = entry.people_count, "Waitlist entry created");
    Ok(entry)
}
