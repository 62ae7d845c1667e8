//! 菜单详情视图: 选中条目时显示全部属性，未选中时不渲染

use serde::Serialize;
use shared::models::{MenuCategory, MenuItem};
use shared::util::format_price;

use super::card::Badge;

pub const ALLERGEN_SECTION_TITLE: &str = "알레르기 정보";
pub const ORIGIN_PREFIX: &str = "원산지: ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuDetailView {
    pub id: String,
    pub category: MenuCategory,
    pub name: String,
    /// 品切时为 `품절` 徽章
    pub soldout_badge: Option<Badge>,
    pub media_url: Option<String>,
    pub price_label: String,
    pub description: String,
    /// 원산지 为空时不显示
    pub origin_line: Option<String>,
    pub tags: Vec<Badge>,
    /// 过敏原为空时整段不显示
    pub allergens: Option<Vec<String>>,
}

impl MenuDetailView {
    pub fn from_selection(selected: Option<&MenuItem>) -> Option<Self> {
        selected.map(Self::from_item)
    }

    fn from_item(item: &MenuItem) -> Self {
        Self {
            id: item.id.clone(),
            category: item.category,
            name: item.name.clone(),
            soldout_badge: item.is_soldout.then(Badge::soldout),
            media_url: item.media_url.clone(),
            price_label: format_price(item.price),
            description: item.description.clone(),
            origin_line: (!item.origin.trim().is_empty())
                .then(|| format!("{ORIGIN_PREFIX}{}", item.origin)),
            tags: item.tags.iter().map(|t| Badge::for_tag(t)).collect(),
            allergens: (!item.allergens.is_empty()).then(|| item.allergens.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(origin: &str, allergens: &[&str], soldout: bool) -> MenuItem {
        MenuItem {
            id: "m1".into(),
            category: MenuCategory::Signature,
            name: "불고기".into(),
            description: "달콤한 양념".into(),
            price: 15000,
            tags: vec!["추천".into()],
            allergens: allergens.iter().map(|s| s.to_string()).collect(),
            origin: origin.into(),
            media_url: Some("https://cdn.example.com/a.jpg".into()),
            sort_order: 0,
            is_soldout: soldout,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_nothing_selected_renders_nothing() {
        assert!(MenuDetailView::from_selection(None).is_none());
    }

    #[test]
    fn test_full_detail() {
        let view = MenuDetailView::from_selection(Some(&item("호주산", &["대두", "밀"], true)))
            .unwrap();
        assert_eq!(view.price_label, "15,000원");
        assert_eq!(view.origin_line.as_deref(), Some("원산지: 호주산"));
        assert_eq!(view.allergens.as_ref().map(Vec::len), Some(2));
        assert_eq!(view.soldout_badge.map(|b| b.label).as_deref(), Some("품절"));
    }

    #[test]
    fn test_optional_sections_hidden() {
        let view = MenuDetailView::from_selection(Some(&item("", &[], false))).unwrap();
        assert!(view.origin_line.is_none());
        assert!(view.allergens.is_none());
        assert!(view.soldout_badge.is_none());
    }
}
