//! 菜单卡片视图

use serde::Serialize;
use shared::models::MenuItem;
use shared::util::format_price;

pub const SOLDOUT_LABEL: &str = "품절";
pub const ALLERGEN_WARNING_LABEL: &str = "알레르기 주의";

/// 徽章样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeVariant {
    Primary,
    Destructive,
    Secondary,
    Outline,
}

impl BadgeVariant {
    /// 页面 CSS 类名
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Primary => "badge badge-primary",
            Self::Destructive => "badge badge-destructive",
            Self::Secondary => "badge badge-secondary",
            Self::Outline => "badge badge-outline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: String,
    pub variant: BadgeVariant,
}

impl Badge {
    /// 标签徽章: 추천 → primary，맵기 → destructive，其他 secondary
    pub fn for_tag(tag: &str) -> Self {
        let variant = match tag {
            "추천" => BadgeVariant::Primary,
            "맵기" => BadgeVariant::Destructive,
            _ => BadgeVariant::Secondary,
        };
        Self {
            label: tag.to_string(),
            variant,
        }
    }

    pub fn soldout() -> Self {
        Self {
            label: SOLDOUT_LABEL.to_string(),
            variant: BadgeVariant::Destructive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuCardView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_label: String,
    pub soldout: bool,
    pub tags: Vec<Badge>,
    /// 有任何过敏原时显示 "알레르기 주의"
    pub allergen_warning: Option<Badge>,
    pub media_url: Option<String>,
    /// 只有管理员会话才显示编辑入口
    pub editable: bool,
}

impl MenuCardView {
    pub fn new(item: &MenuItem, is_admin: bool) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            price_label: format_price(item.price),
            soldout: item.is_soldout,
            tags: item.tags.iter().map(|t| Badge::for_tag(t)).collect(),
            allergen_warning: (!item.allergens.is_empty()).then(|| Badge {
                label: ALLERGEN_WARNING_LABEL.to_string(),
                variant: BadgeVariant::Outline,
            }),
            media_url: item.media_url.clone(),
            editable: is_admin,
        }
    }
}
