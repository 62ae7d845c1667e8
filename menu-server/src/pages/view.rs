//! 页面渲染
//!
//! 单页视图: 标题栏 (管理/候位入口)、吸顶分类标签栏、按分类分区的菜单卡片、
//! 选中条目的详情、以及当前打开的对话框。

use std::fmt::Write;

use shared::models::MenuCategory;
use urlencoding::encode;

use super::html::escape;
use crate::menu::{
    Badge, CategorySelection, LoadStatus, MenuCardView, MenuDetailView, MenuFormInput, Snapshot,
};
use crate::waitlist::{EMPTY_QUEUE_MESSAGE, QueueAction, WaitlistFormInput, WaitlistQueue};

pub const PAGE_TITLE: &str = "메뉴";
pub const LOADING_MESSAGE: &str = "로딩 중...";
pub const LOAD_FAILED_NOTICE: &str = "메뉴를 불러오지 못했습니다: ";
pub const EMPTY_MENU_MESSAGE: &str = "등록된 메뉴가 없습니다.";
pub const ADMIN_WAITLIST_LABEL: &str = "대기 관리";
pub const CUSTOMER_WAITLIST_LABEL: &str = "대기하기";

/// 当前打开的对话框
#[derive(Debug, Clone, Default)]
pub enum Dialog {
    #[default]
    None,
    Login {
        email: String,
        error: Option<String>,
    },
    MenuForm {
        /// None = 新建
        edit_id: Option<String>,
        input: MenuFormInput,
        error: Option<String>,
    },
    ConfirmDelete {
        id: String,
        name: String,
        error: Option<String>,
    },
    Waitlist {
        input: WaitlistFormInput,
        error: Option<String>,
    },
    Queue {
        /// 加载失败时为提示文案
        queue: Result<WaitlistQueue, String>,
        /// 等待确认的操作
        pending: Option<(QueueAction, String)>,
        error: Option<String>,
    },
}

pub struct PageView<'a> {
    pub snapshot: &'a Snapshot,
    pub is_admin: bool,
    pub selection: CategorySelection,
    pub detail: Option<MenuDetailView>,
    pub dialog: Dialog,
    pub notice: Option<&'a str>,
}

impl PageView<'_> {
    pub fn render(&self) -> String {
        let mut body = String::new();
        self.render_header(&mut body);
        if let Some(notice) = self.notice {
            let _ = write!(body, r#"<p class="notice">{}</p>"#, escape(notice));
        }
        self.render_tabs(&mut body);

        body.push_str("<main>");
        self.render_board(&mut body);
        if let Some(detail) = &self.detail {
            render_detail(&mut body, detail, self.category_query());
        }
        body.push_str("</main>");

        self.render_dialog(&mut body);
        super::html::layout(PAGE_TITLE, &body)
    }

    fn category_query(&self) -> String {
        format!("category={}", encode(self.selection.category().label()))
    }

    fn render_header(&self, out: &mut String) {
        let _ = write!(out, "<header><h1>{PAGE_TITLE}</h1><div class=\"actions\">");
        if self.is_admin {
            out.push_str(r#"<a class="button" href="/?dialog=add">메뉴 추가</a>"#);
            let _ = write!(
                out,
                r#"<a class="button" href="/?dialog=queue">{ADMIN_WAITLIST_LABEL}</a>"#
            );
            out.push_str(
                r#"<form method="post" action="/admin/logout" style="display:inline"><button type="submit">로그아웃</button></form>"#,
            );
        } else {
            let _ = write!(
                out,
                r#"<a class="button" href="/?dialog=waitlist">{CUSTOMER_WAITLIST_LABEL}</a>"#
            );
            out.push_str(r#"<a class="button" href="/?dialog=login">관리자 로그인</a>"#);
        }
        out.push_str("</div></header>");
    }

    fn render_tabs(&self, out: &mut String) {
        out.push_str(r#"<nav class="tabs">"#);
        for category in MenuCategory::ALL {
            let label = category.label();
            let class = if category == self.selection.category() {
                "tab active"
            } else {
                "tab"
            };
            let _ = write!(
                out,
                r#"<a class="{class}" href="/?category={}{}">{label}</a>"#,
                encode(label),
                CategorySelection::anchor(category),
            );
        }
        out.push_str("</nav>");
    }

    fn render_board(&self, out: &mut String) {
        match &self.snapshot.status {
            LoadStatus::Loading => {
                let _ = write!(out, r#"<p class="status">{LOADING_MESSAGE}</p>"#);
                return;
            }
            LoadStatus::Failed(message) => {
                let _ = write!(
                    out,
                    r#"<p class="status error">{LOAD_FAILED_NOTICE}{}</p>"#,
                    escape(message)
                );
                return;
            }
            LoadStatus::Ready => {}
        }

        if self.snapshot.board.is_empty() {
            let _ = write!(out, r#"<p class="status">{EMPTY_MENU_MESSAGE}</p>"#);
            return;
        }

        let category_query = self.category_query();
        for (category, items) in self.snapshot.board.sections() {
            let label = category.label();
            let _ = write!(
                out,
                r#"<section class="menu-section" id="{label}"><h2>{label}</h2>"#
            );
            for item in items {
                render_card(out, &MenuCardView::new(item, self.is_admin), &category_query);
            }
            out.push_str("</section>");
        }
    }

    fn render_dialog(&self, out: &mut String) {
        match &self.dialog {
            Dialog::None => {}
            Dialog::Login { email, error } => {
                dialog_open(out, "관리자 로그인", error.as_deref());
                let _ = write!(
                    out,
                    r#"<form method="post" action="/admin/login">
<label>이메일 <input type="email" name="email" value="{}" required></label>
<label>비밀번호 <input type="password" name="password" required></label>
<button type="submit">로그인</button></form>"#,
                    escape(email)
                );
                dialog_close(out);
            }
            Dialog::MenuForm {
                edit_id,
                input,
                error,
            } => {
                let (title, action) = match edit_id {
                    Some(id) => ("메뉴 수정", format!("/admin/menus/{}", encode(id))),
                    None => ("메뉴 추가", "/admin/menus".to_string()),
                };
                dialog_open(out, title, error.as_deref());
                render_menu_form(out, &action, input);
                dialog_close(out);
            }
            Dialog::ConfirmDelete { id, name, error } => {
                dialog_open(out, "메뉴 삭제", error.as_deref());
                let _ = write!(
                    out,
                    r#"<p>{}을(를) 삭제하시겠습니까?</p>
<form method="post" action="/admin/menus/{}/delete"><input type="hidden" name="confirm" value="true">
<button type="submit">삭제</button> <a href="/?{}">취소</a></form>"#,
                    escape(name),
                    encode(id),
                    self.category_query()
                );
                dialog_close(out);
            }
            Dialog::Waitlist { input, error } => {
                dialog_open(out, "대기 등록", error.as_deref());
                let _ = write!(
                    out,
                    r#"<form method="post" action="/waitlist">
<label>이름 <input name="customer_name" value="{}"></label>
<label>인원수 <input name="people_count" inputmode="numeric" value="{}"></label>
<button type="submit">등록</button> <a href="/">취소</a></form>"#,
                    escape(&input.customer_name),
                    escape(&input.people_count)
                );
                dialog_close(out);
            }
            Dialog::Queue {
                queue,
                pending,
                error,
            } => {
                dialog_open(out, ADMIN_WAITLIST_LABEL, error.as_deref());
                match queue {
                    Err(message) => {
                        let _ = write!(out, r#"<p class="error">{}</p>"#, escape(message));
                    }
                    Ok(queue) => render_queue(out, queue, pending.as_ref()),
                }
                out.push_str(r#"<p><a href="/">닫기</a></p>"#);
                dialog_close(out);
            }
        }
    }
}

fn dialog_open(out: &mut String, title: &str, error: Option<&str>) {
    let _ = write!(out, r#"<div class="dialog" role="dialog"><h2>{}</h2>"#, escape(title));
    if let Some(error) = error {
        let _ = write!(out, r#"<p class="error">{}</p>"#, escape(error));
    }
}

fn dialog_close(out: &mut String) {
    out.push_str("</div>");
}

fn render_badge(out: &mut String, badge: &Badge) {
    let _ = write!(
        out,
        r#"<span class="{}">{}</span>"#,
        badge.variant.css_class(),
        escape(&badge.label)
    );
}

fn render_card(out: &mut String, card: &MenuCardView, category_query: &str) {
    let id = encode(&card.id);
    let class = if card.soldout { "card soldout" } else { "card" };
    let _ = write!(
        out,
        r#"<article class="{class}" data-id="{}"><h3><a href="/?{category_query}&item={id}">{}</a>"#,
        escape(&card.id),
        escape(&card.name)
    );
    if card.soldout {
        render_badge(out, &Badge::soldout());
    }
    out.push_str("</h3>");
    if let Some(url) = &card.media_url {
        let _ = write!(out, r#"<img src="{}" alt="" loading="lazy">"#, escape(url));
    }
    if !card.description.is_empty() {
        let _ = write!(out, "<p>{}</p>", escape(&card.description));
    }
    out.push_str(r#"<div class="badges">"#);
    for badge in &card.tags {
        render_badge(out, badge);
    }
    if let Some(warning) = &card.allergen_warning {
        render_badge(out, warning);
    }
    out.push_str("</div>");
    let _ = write!(out, r#"<p class="price">{}</p>"#, escape(&card.price_label));
    if card.editable {
        let _ = write!(
            out,
            r#"<p class="admin"><a href="/?edit={id}">수정</a> <a href="/?{category_query}&confirm_delete={id}">삭제</a></p>"#
        );
    }
    out.push_str("</article>");
}

fn render_detail(out: &mut String, detail: &MenuDetailView, category_query: String) {
    let _ = write!(
        out,
        r#"<div class="dialog detail" role="dialog"><h2>{}</h2>"#,
        escape(&detail.name)
    );
    if let Some(badge) = &detail.soldout_badge {
        render_badge(out, badge);
    }
    if let Some(url) = &detail.media_url {
        let _ = write!(out, r#"<img src="{}" alt="">"#, escape(url));
    }
    let _ = write!(out, r#"<p class="price">{}</p>"#, escape(&detail.price_label));
    if !detail.description.is_empty() {
        let _ = write!(out, "<p>{}</p>", escape(&detail.description));
    }
    if let Some(origin) = &detail.origin_line {
        let _ = write!(out, r#"<p class="origin">{}</p>"#, escape(origin));
    }
    out.push_str(r#"<div class="badges">"#);
    for badge in &detail.tags {
        render_badge(out, badge);
    }
    out.push_str("</div>");
    if let Some(allergens) = &detail.allergens {
        let _ = write!(
            out,
            r#"<h3>{}</h3><ul class="allergens">"#,
            crate::menu::detail::ALLERGEN_SECTION_TITLE
        );
        for allergen in allergens {
            let _ = write!(out, "<li>{}</li>", escape(allergen));
        }
        out.push_str("</ul>");
    }
    let _ = write!(out, r#"<p><a href="/?{category_query}">닫기</a></p></div>"#);
}

fn render_menu_form(out: &mut String, action: &str, input: &MenuFormInput) {
    let _ = write!(
        out,
        r#"<form method="post" action="{}"><label>분류 <select name="category">"#,
        escape(action)
    );
    for category in MenuCategory::ALL {
        let label = category.label();
        let selected = if input.category == label { " selected" } else { "" };
        let _ = write!(out, r#"<option value="{label}"{selected}>{label}</option>"#);
    }
    out.push_str("</select></label>");

    let fields = [
        ("이름", "name", &input.name),
        ("설명", "description", &input.description),
        ("가격", "price", &input.price),
        ("태그 (쉼표로 구분)", "tags", &input.tags),
        ("알레르기 (쉼표로 구분)", "allergens", &input.allergens),
        ("원산지", "origin", &input.origin),
        ("이미지 URL", "media_url", &input.media_url),
        ("정렬 순서", "sort_order", &input.sort_order),
    ];
    for (label, name, value) in fields {
        let _ = write!(
            out,
            r#"<label>{label} <input name="{name}" value="{}"></label>"#,
            escape(value)
        );
    }

    let checked = if input.is_soldout.is_some() { " checked" } else { "" };
    let _ = write!(
        out,
        r#"<label><input type="checkbox" name="is_soldout" value="on"{checked}> 품절</label>
<button type="submit">저장</button> <a href="/">취소</a></form>"#
    );
}

fn render_queue(out: &mut String, queue: &WaitlistQueue, pending: Option<&(QueueAction, String)>) {
    if queue.is_empty() {
        let _ = write!(out, "<p>{EMPTY_QUEUE_MESSAGE}</p>");
        return;
    }

    out.push_str(r#"<ol class="queue">"#);
    for row in queue.rows() {
        let entry = &row.entry;
        let id = encode(&entry.id);
        let _ = write!(
            out,
            r#"<li data-id="{}"><span class="position">{}</span> {} ({}명) <time>{}</time> "#,
            escape(&entry.id),
            row.position,
            escape(&entry.customer_name),
            entry.people_count,
            entry.created_at.format("%H:%M"),
        );
        match pending {
            Some((action, pending_id)) if *pending_id == entry.id => {
                let (question, path, button) = match action {
                    QueueAction::Complete => ("완료 처리하시겠습니까?", "complete", "완료"),
                    QueueAction::Delete => ("삭제하시겠습니까?", "delete", "삭제"),
                };
                let _ = write!(
                    out,
                    r#"<form method="post" action="/admin/waitlist/{id}/{path}" style="display:inline">{question} <input type="hidden" name="confirm" value="true"><button type="submit">{button}</button> <a href="/?dialog=queue">취소</a></form>"#
                );
            }
            _ => {
                let _ = write!(
                    out,
                    r#"<a href="/?dialog=queue&queue_action=complete&queue_id={id}">완료</a> <a href="/?dialog=queue&queue_action=delete&queue_id={id}">삭제</a>"#
                );
            }
        }
        out.push_str("</li>");
    }
    out.push_str("</ol>");
}
