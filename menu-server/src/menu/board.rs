//! 分类分区
//!
//! 加载到的全量菜单按五个分类切分，每个分区按 `sort_order` 升序 (稳定排序，
//! 相同 `sort_order` 保持加载顺序)。每次加载成功后只计算一次。

use serde::Serialize;
use shared::models::{MenuCategory, MenuItem};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuBoard {
    sections: [Vec<MenuItem>; MenuCategory::ALL.len()],
}

impl MenuBoard {
    pub fn build(items: &[MenuItem]) -> Self {
        let mut board = Self::default();
        for item in items {
            board.sections[item.category.index()].push(item.clone());
        }
        for section in &mut board.sections {
            section.sort_by_key(|item| item.sort_order);
        }
        board
    }

    /// 指定分类的条目 (可能为空)
    pub fn section(&self, category: MenuCategory) -> &[MenuItem] {
        &self.sections[category.index()]
    }

    /// 非空分区，按分类顺序
    pub fn sections(&self) -> impl Iterator<Item = (MenuCategory, &[MenuItem])> {
        MenuCategory::ALL
            .into_iter()
            .map(|category| (category, self.section(category)))
            .filter(|(_, items)| !items.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(Vec::len).sum()
    }

    pub fn find(&self, id: &str) -> Option<&MenuItem> {
        self.sections.iter().flatten().find(|item| item.id == id)
    }
}

/// 分类标签的选择状态
///
/// 选择只影响高亮和滚动锚点，不触发后端请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CategorySelection(pub MenuCategory);

impl CategorySelection {
    /// 未知标签回落到默认分类 (대표)
    pub fn from_label(label: Option<&str>) -> Self {
        Self(
            label
                .and_then(|l| l.parse::<MenuCategory>().ok())
                .unwrap_or_default(),
        )
    }

    pub fn category(&self) -> MenuCategory {
        self.0
    }

    /// 分区锚点，标签栏链接到 `#<label>`
    pub fn anchor(category: MenuCategory) -> String {
        format!("#{}", category.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: &str, category: MenuCategory, sort_order: i32) -> MenuItem {
        MenuItem {
            id: id.into(),
            category,
            name: id.into(),
            description: String::new(),
            price: 1000,
            tags: vec![],
            allergens: vec![],
            origin: String::new(),
            media_url: None,
            sort_order,
            is_soldout: false,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_partition_is_filtered_and_stably_sorted() {
        let items = vec![
            item("a", MenuCategory::Single, 2),
            item("b", MenuCategory::Set, 0),
            item("c", MenuCategory::Single, 1),
            item("d", MenuCategory::Single, 1),
            item("e", MenuCategory::Drinks, 5),
        ];
        let board = MenuBoard::build(&items);

        let ids: Vec<_> = board
            .section(MenuCategory::Single)
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, ["c", "d", "a"]);
        assert_eq!(board.section(MenuCategory::Set).len(), 1);
        assert!(board.section(MenuCategory::Extra).is_empty());
        assert_eq!(board.len(), items.len());
    }

    #[test]
    fn test_sections_skip_empty_in_category_order() {
        let board = MenuBoard::build(&[
            item("x", MenuCategory::Extra, 0),
            item("s", MenuCategory::Signature, 0),
        ]);
        let categories: Vec<_> = board.sections().map(|(c, _)| c).collect();
        assert_eq!(categories, [MenuCategory::Signature, MenuCategory::Extra]);
        assert!(MenuBoard::default().is_empty());
        assert_eq!(board.find("x").map(|i| i.category), Some(MenuCategory::Extra));
        assert!(board.find("missing").is_none());
    }

    #[test]
    fn test_category_selection_fallback() {
        assert_eq!(
            CategorySelection::from_label(Some("세트")).category(),
            MenuCategory::Set
        );
        assert_eq!(
            CategorySelection::from_label(Some("디저트")).category(),
            MenuCategory::Signature
        );
        assert_eq!(CategorySelection::from_label(None).category(), MenuCategory::Signature);
        assert_eq!(CategorySelection::anchor(MenuCategory::Drinks), "#주류");
    }
}
