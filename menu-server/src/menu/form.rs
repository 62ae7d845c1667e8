//! 菜单编辑表单
//!
//! HTML 表单提交的都是文本，这里做严格解析: 价格和排序必须是整数，
//! 价格不能为负，解析失败直接拒绝而不是按 0 处理。

use serde::{Deserialize, Serialize};
use shared::models::{MenuCategory, MenuFormData, MenuItem};
use shared::validation::TOKEN_DELIMITER;

use crate::utils::{AppError, AppResult, ErrorCode};

pub const INVALID_PRICE_MESSAGE: &str = "가격은 0 이상의 정수여야 합니다.";
pub const INVALID_SORT_ORDER_MESSAGE: &str = "정렬 순서는 정수여야 합니다.";

/// 有序去重的标签集合 (标签、过敏原共用)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个标签: 去首尾空白，空串和重复项忽略；返回是否追加
    pub fn push(&mut self, token: &str) -> bool {
        let token = token.trim();
        if token.is_empty() || self.contains(token) {
            return false;
        }
        self.0.push(token.to_string());
        true
    }

    pub fn remove(&mut self, token: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != token);
        self.0.len() != before
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    /// 逗号分隔的文本
    pub fn from_delimited(text: &str) -> Self {
        let mut set = Self::new();
        for token in text.split(TOKEN_DELIMITER) {
            set.push(token);
        }
        set
    }

    pub fn to_delimited(&self) -> String {
        self.0.join(&format!("{TOKEN_DELIMITER} "))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for token in iter {
            set.push(token.as_ref());
        }
        set
    }
}

/// 表单原始输入
///
/// 失败时原样回填，用户不需要重新输入
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuFormInput {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    /// 逗号分隔
    #[serde(default)]
    pub tags: String,
    /// 逗号分隔
    #[serde(default)]
    pub allergens: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub media_url: String,
    #[serde(default)]
    pub sort_order: String,
    /// 复选框，未勾选时不提交
    #[serde(default)]
    pub is_soldout: Option<String>,
}

/// JSON 接口提交的标签不经过文本表单，同样去空白去重
pub fn normalize_tokens(form: &MenuFormData) -> MenuFormData {
    MenuFormData {
        tags: form.tags.iter().collect::<TagSet>().into_vec(),
        allergens: form.allergens.iter().collect::<TagSet>().into_vec(),
        ..form.clone()
    }
}

impl MenuFormInput {
    /// 解析并校验
    pub fn parse(&self) -> AppResult<MenuFormData> {
        let category = self.category.parse::<MenuCategory>()?;
        let price = parse_price(&self.price)?;
        let sort_order = self
            .sort_order
            .trim()
            .parse::<i32>()
            .map_err(|_| {
                AppError::with_message(ErrorCode::MenuInvalidSortOrder, INVALID_SORT_ORDER_MESSAGE)
                    .with_detail("sort_order", self.sort_order.clone())
            })?;
        let media_url = Some(self.media_url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        let form = MenuFormData {
            category,
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price,
            tags: TagSet::from_delimited(&self.tags).into_vec(),
            allergens: TagSet::from_delimited(&self.allergens).into_vec(),
            origin: self.origin.trim().to_string(),
            media_url,
            sort_order,
            is_soldout: self.is_soldout.as_deref().is_some_and(is_checked),
        };
        form.validate()?;
        Ok(form)
    }
}

impl From<&MenuFormData> for MenuFormInput {
    fn from(form: &MenuFormData) -> Self {
        Self {
            category: form.category.label().to_string(),
            name: form.name.clone(),
            description: form.description.clone(),
            price: form.price.to_string(),
            tags: form.tags.iter().collect::<TagSet>().to_delimited(),
            allergens: form.allergens.iter().collect::<TagSet>().to_delimited(),
            origin: form.origin.clone(),
            media_url: form.media_url.clone().unwrap_or_default(),
            sort_order: form.sort_order.to_string(),
            is_soldout: form.is_soldout.then(|| "on".to_string()),
        }
    }
}

impl From<&MenuItem> for MenuFormInput {
    fn from(item: &MenuItem) -> Self {
        Self::from(&MenuFormData::from(item))
    }
}

fn parse_price(text: &str) -> AppResult<i64> {
    match text.trim().parse::<i64>() {
        Ok(price) if price >= 0 => Ok(price),
        _ => Err(
            AppError::with_message(ErrorCode::MenuInvalidPrice, INVALID_PRICE_MESSAGE)
                .with_detail("price", text.to_string()),
        ),
    }
}

fn is_checked(value: &str) -> bool {
    matches!(value, "on" | "true" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(price: &str, sort_order: &str) -> MenuFormInput {
        MenuFormInput {
            category: "단품".into(),
            name: " 김치찌개 ".into(),
            price: price.into(),
            tags: "추천, 추천 ,,맵기".into(),
            origin: "국내산".into(),
            sort_order: sort_order.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_tag_set_is_ordered_and_unique() {
        let mut tags = TagSet::new();
        assert!(tags.push(" 추천 "));
        assert!(!tags.push("추천"));
        assert!(!tags.push("   "));
        assert!(tags.push("맵기"));
        assert_eq!(tags.as_slice(), ["추천", "맵기"]);
        assert!(tags.remove("추천"));
        assert!(!tags.remove("추천"));
        assert_eq!(tags.to_delimited(), "맵기");
    }

    #[test]
    fn test_tags_survive_edit_round_trip() {
        let form = input("9000", "0").parse().unwrap();
        let reparsed = MenuFormInput::from(&form).parse().unwrap();
        assert_eq!(reparsed.tags, form.tags);

        // 带逗号的标签进不了存储，否则再编辑一次就被拆开
        let mut form = form;
        form.tags = vec!["매운맛, 중간".into()];
        let err = form.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_normalize_tokens() {
        let mut form = input("9000", "0").parse().unwrap();
        form.tags = vec!["추천".into(), "추천".into(), " 맵기 ".into(), " ".into()];
        form.allergens = vec!["우유".into(), "우유".into()];
        let form = normalize_tokens(&form);
        assert_eq!(form.tags, ["추천", "맵기"]);
        assert_eq!(form.allergens, ["우유"]);
        assert_eq!(form.name, "김치찌개");
    }

    #[test]
    fn test_parse_valid_form() {
        let form = input("9000", "0").parse().unwrap();
        assert_eq!(form.category, MenuCategory::Single);
        assert_eq!(form.name, "김치찌개");
        assert_eq!(form.price, 9000);
        assert_eq!(form.tags, ["추천", "맵기"]);
        assert!(form.allergens.is_empty());
        assert_eq!(form.media_url, None);
        assert!(!form.is_soldout);
    }

    #[test]
    fn test_price_is_parsed_strictly() {
        for bad in ["", "abc", "9,000", "-1", "12.5"] {
            let err = input(bad, "0").parse().unwrap_err();
            assert_eq!(err.code, ErrorCode::MenuInvalidPrice, "price {bad:?}");
            assert_eq!(err.message, INVALID_PRICE_MESSAGE);
        }
        assert_eq!(input(" 0 ", "0").parse().unwrap().price, 0);
    }

    #[test]
    fn test_sort_order_is_parsed_strictly() {
        let err = input("1000", "x").parse().unwrap_err();
        assert_eq!(err.code, ErrorCode::MenuInvalidSortOrder);
        assert_eq!(input("1000", "-3").parse().unwrap().sort_order, -3);
    }

    #[test]
    fn test_unknown_category_and_blank_name() {
        let mut bad = input("1000", "0");
        bad.category = "디저트".into();
        assert_eq!(bad.parse().unwrap_err().code, ErrorCode::MenuInvalidCategory);

        let mut bad = input("1000", "0");
        bad.name = "  ".into();
        assert!(bad.parse().is_err());
    }

    #[test]
    fn test_prefill_from_item_round_trips() {
        let mut form = input("9000", "2").parse().unwrap();
        form.is_soldout = true;
        let prefilled = MenuFormInput::from(&form);
        assert_eq!(prefilled.tags, "추천, 맵기");
        assert_eq!(prefilled.is_soldout.as_deref(), Some("on"));
        assert_eq!(prefilled.parse().unwrap(), form);
    }
}
