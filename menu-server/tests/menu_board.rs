//! 菜单板: 分区、标签切换、详情、加载状态、变更通知重拉

mod common;

use std::time::Duration;

use common::{TestApp, menu_item};
use http::{Method, StatusCode};
use menu_client::{DataClient, Operation};
use shared::models::{MenuCategory, MenuFormData};

fn kimchi_stew() -> shared::models::MenuItem {
    let mut item = menu_item("m1", MenuCategory::Single, "김치찌개", 9000, 0);
    item.tags = vec!["추천".into()];
    item.allergens = vec!["대두".into()];
    item.origin = "국내산".into();
    item
}

#[tokio::test]
async fn item_appears_only_in_its_category_section() {
    let app = TestApp::new(vec![kimchi_stew()]).await;

    let page = app.get("/", None).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(r#"<section class="menu-section" id="단품">"#));
    assert!(page.body.contains("김치찌개"));
    assert!(page.body.contains("9,000원"));
    assert!(page.body.contains(r#"<span class="badge badge-primary">추천</span>"#));
    for other in ["대표", "세트", "주류", "추가"] {
        assert!(!page.body.contains(&format!(r#"id="{other}""#)));
    }

    let board = app.json(Method::GET, "/api/menus", None, None).await.json();
    let sections = board["data"]["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0]["category"], "단품");
    assert_eq!(sections[0]["items"][0]["price_label"], "9,000원");
}

#[tokio::test]
async fn sections_follow_fixed_order_and_sort_order() {
    let app = TestApp::new(vec![
        menu_item("d1", MenuCategory::Drinks, "소주", 5000, 0),
        menu_item("s2", MenuCategory::Signature, "보쌈", 30000, 2),
        menu_item("s1", MenuCategory::Signature, "족발", 35000, 1),
    ])
    .await;

    let body = app.get("/", None).await.body;
    let signature = body.find(r#"id="대표""#).unwrap();
    let drinks = body.find(r#"id="주류""#).unwrap();
    assert!(signature < drinks);
    assert!(body.find("족발").unwrap() < body.find("보쌈").unwrap());
}

#[tokio::test]
async fn switching_category_does_not_refetch() {
    let app = TestApp::new(vec![kimchi_stew()]).await;
    app.backend.reset_calls();

    let page = app.get("/?category=%EC%84%B8%ED%8A%B8", None).await;
    assert!(page.body.contains(r#"class="tab active" href="/?category=%EC%84%B8%ED%8A%B8#세트""#));
    app.get("/?category=%EC%A3%BC%EB%A5%98", None).await;
    app.json(Method::GET, "/api/menus", None, None).await;

    assert_eq!(app.backend.calls(Operation::SelectMenus), 0);
}

#[tokio::test]
async fn detail_panel_shows_origin_and_allergens() {
    let app = TestApp::new(vec![kimchi_stew()]).await;

    let page = app.get("/?item=m1", None).await;
    assert!(page.body.contains("원산지: 국내산"));
    assert!(page.body.contains("알레르기 정보"));
    assert!(page.body.contains("<li>대두</li>"));

    let detail = app.json(Method::GET, "/api/menus/m1", None, None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.json()["data"]["origin_line"], "원산지: 국내산");

    let missing = app.json(Method::GET, "/api/menus/nope", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_initial_load_is_reported() {
    let app = TestApp::unloaded(vec![kimchi_stew()]);
    app.backend.fail_next(Operation::SelectMenus, "connection refused");
    app.state
        .repository
        .initial_load(1, Duration::from_millis(0))
        .await;

    let page = app.get("/", None).await;
    assert!(page.body.contains("메뉴를 불러오지 못했습니다: connection refused"));
    assert!(!page.body.contains("김치찌개"));

    let health = app.json(Method::GET, "/health", None, None).await.json();
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn change_notification_triggers_reload() {
    let app = TestApp::new(vec![]).await;
    let tasks = app.state.start_background_tasks();
    // 等待监听任务完成订阅
    tokio::time::sleep(Duration::from_millis(20)).await;

    let session = app
        .backend
        .sign_in(common::ADMIN_EMAIL, common::ADMIN_PASSWORD)
        .await
        .unwrap();
    let form = MenuFormData {
        name: "된장찌개".into(),
        price: 8000,
        ..MenuFormData::new_with_sort_order(0)
    };
    app.backend
        .insert_menu(&session.access_token, &form)
        .await
        .unwrap();

    let mut reloaded = false;
    for _ in 0..100 {
        if app.state.repository.item_count() == 1 {
            reloaded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(reloaded);
    assert!(app.get("/", None).await.body.contains("된장찌개"));

    app.state.message_bus().shutdown();
    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test]
async fn health_reports_menu_state() {
    let app = TestApp::new(vec![kimchi_stew()]).await;
    let health = app.json(Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    let body = health.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend_mode"], "memory");
    assert_eq!(body["menu"]["items"], 1);
}
