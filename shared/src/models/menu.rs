//! Menu Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, ErrorCode};
use crate::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_len, validate_media_url,
    validate_required_text, validate_tokens,
};

/// 菜单分类 (固定集合，序列化为韩文标签)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum MenuCategory {
    #[default]
    #[serde(rename = "대표")]
    Signature,
    #[serde(rename = "세트")]
    Set,
    #[serde(rename = "단품")]
    Single,
    #[serde(rename = "주류")]
    Drinks,
    #[serde(rename = "추가")]
    Extra,
}

impl MenuCategory {
    /// 页面展示顺序
    pub const ALL: [MenuCategory; 5] = [
        MenuCategory::Signature,
        MenuCategory::Set,
        MenuCategory::Single,
        MenuCategory::Drinks,
        MenuCategory::Extra,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            MenuCategory::Signature => "대표",
            MenuCategory::Set => "세트",
            MenuCategory::Single => "단품",
            MenuCategory::Drinks => "주류",
            MenuCategory::Extra => "추가",
        }
    }

    /// Position inside [`MenuCategory::ALL`]
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for MenuCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MenuCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        MenuCategory::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| {
                AppError::new(ErrorCode::MenuInvalidCategory).with_detail("category", s)
            })
    }
}

/// 后端列允许 NULL 时按默认值处理
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Menu item entity (`menus` table row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub category: MenuCategory,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// 整数金额，无小数单位 (원)
    pub price: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allergens: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub origin: String,
    #[serde(default)]
    pub media_url: Option<String>,
    /// 同分类内的显示顺序，重复时保持存储顺序
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub is_soldout: bool,
    pub updated_at: DateTime<Utc>,
}

/// Create / update payload (writable columns only)
///
/// Update is a full-row overwrite, so the same payload serves both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuFormData {
    #[serde(default)]
    pub category: MenuCategory,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub is_soldout: bool,
}

impl MenuFormData {
    /// Blank form for a new item; `sort_order` defaults to the current item count.
    pub fn new_with_sort_order(sort_order: i32) -> Self {
        Self {
            category: MenuCategory::default(),
            name: String::new(),
            description: String::new(),
            price: 0,
            tags: Vec::new(),
            allergens: Vec::new(),
            origin: String::new(),
            media_url: None,
            sort_order,
            is_soldout: false,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        validate_len(&self.description, "description", MAX_NOTE_LEN)?;
        validate_len(&self.origin, "origin", MAX_SHORT_TEXT_LEN)?;
        if self.price < 0 {
            return Err(AppError::new(ErrorCode::MenuInvalidPrice).with_detail("price", self.price));
        }
        validate_tokens(&self.tags, "tags")?;
        validate_tokens(&self.allergens, "allergens")?;
        validate_media_url(&self.media_url)?;
        Ok(())
    }

    /// Materialize a stored row (used by the in-process backend)
    pub fn into_item(self, id: String, updated_at: DateTime<Utc>) -> MenuItem {
        MenuItem {
            id,
            category: self.category,
            name: self.name,
            description: self.description,
            price: self.price,
            tags: self.tags,
            allergens: self.allergens,
            origin: self.origin,
            media_url: self.media_url,
            sort_order: self.sort_order,
            is_soldout: self.is_soldout,
            updated_at,
        }
    }
}

impl From<&MenuItem> for MenuFormData {
    fn from(item: &MenuItem) -> Self {
        Self {
            category: item.category,
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            tags: item.tags.clone(),
            allergens: item.allergens.clone(),
            origin: item.origin.clone(),
            media_url: item.media_url.clone(),
            sort_order: item.sort_order,
            is_soldout: item.is_soldout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_form() -> MenuFormData {
        MenuFormData {
            category: MenuCategory::Single,
            name: "김치찌개".into(),
            description: String::new(),
            price: 9000,
            tags: vec!["추천".into()],
            allergens: vec![],
            origin: "국내산".into(),
            media_url: None,
            sort_order: 0,
            is_soldout: false,
        }
    }

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_string(&MenuCategory::Drinks).unwrap();
        assert_eq!(json, "\"주류\"");
        let c: MenuCategory = serde_json::from_str("\"세트\"").unwrap();
        assert_eq!(c, MenuCategory::Set);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("단품".parse::<MenuCategory>().unwrap(), MenuCategory::Single);
        let err = "디저트".parse::<MenuCategory>().unwrap_err();
        assert_eq!(err.code, ErrorCode::MenuInvalidCategory);
    }

    #[test]
    fn test_category_order_and_default() {
        let labels: Vec<_> = MenuCategory::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(labels, ["대표", "세트", "단품", "주류", "추가"]);
        assert_eq!(MenuCategory::default(), MenuCategory::Signature);
        assert_eq!(MenuCategory::Drinks.index(), 3);
    }

    #[test]
    fn test_form_validate() {
        assert!(sample_form().validate().is_ok());

        let mut form = sample_form();
        form.price = -1;
        assert_eq!(form.validate().unwrap_err().code, ErrorCode::MenuInvalidPrice);

        let mut form = sample_form();
        form.name = "  ".into();
        assert_eq!(form.validate().unwrap_err().code, ErrorCode::RequiredField);
    }

    #[test]
    fn test_form_round_trips_through_item() {
        let now = Utc::now();
        let item = sample_form().into_item("m-1".into(), now);
        assert_eq!(MenuFormData::from(&item), sample_form());
    }

    #[test]
    fn test_item_deserializes_with_missing_optional_columns() {
        let json = r#"{
            "id": "a1",
            "category": "대표",
            "name": "불고기",
            "price": 12000,
            "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let item: MenuItem = serde_json::from_str(json).unwrap();
        assert!(item.tags.is_empty());
        assert!(item.media_url.is_none());
        assert!(!item.is_soldout);
    }

    #[test]
    fn test_item_accepts_null_text_columns() {
        let json = r#"{
            "id": "a2",
            "category": "추가",
            "name": "공기밥",
            "description": null,
            "price": 1000,
            "tags": null,
            "allergens": null,
            "origin": null,
            "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let item: MenuItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.description, "");
        assert!(item.allergens.is_empty());
    }
}
