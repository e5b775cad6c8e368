// ==========================================
// 发布命令集成测试
// ==========================================
// 测试范围:
// 1. 创建/查询/列表/更新/删除 全流程
// 2. 身份与角色检查 (401 / 403) 及其先后顺序
// 3. 约束冲突、状态校验、列表过滤
// ==========================================


use firmware_changelog::app::{
    create_release, delete_release, get_release, list_releases, update_release, ListQuery,
};
use firmware_changelog::auth::RequestContext;
use firmware_changelog::domain::types::{EntryClassification, FirmwareStatus, Role};
use serde_json::json;
use test_helpers::*;

// ==========================================
// 创建与查询
// ==========================================

#[test]
fn test_create_returns_201_with_reloaded_aggregate() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let reply = create_release(&env.state, &env.editor(), sample_release("1.0.0", "2024-03-01"))
        .expect("创建失败");

    assert_eq!(reply.status, 201);
    let body = reply.body;
    assert!(body.id > 0);
    assert_eq!(body.status, FirmwareStatus::Producao, "空状态应回落为 producao");

    let creator = body.created_by.expect("应包含创建人");
    assert_eq!(creator.id, env.editor_id);
    assert_eq!(creator.role, Role::Editor);

    let orders: Vec<i32> = body.entries.iter().map(|e| e.item_order).collect();
    assert_eq!(orders, vec![1, 2]);
    assert_eq!(body.entries[1].classification, EntryClassification::Correcao);
    assert_eq!(body.modules.len(), 2);
    assert_eq!(body.links.len(), 1);

    let fetched = get_release(&env.state, body.id).expect("查询失败");
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.body.version, "1.0.0");
}

#[test]
fn test_response_json_is_camel_case() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let reply = create_release(&env.state, &env.admin(), sample_release("1.0.0", "2024-03-01"))
        .expect("创建失败");

    let value = serde_json::to_value(&reply.body).unwrap();
    assert_eq!(value["releaseDate"], json!("2024-03-01"));
    assert_eq!(value["status"], json!("producao"));
    assert_eq!(value["createdBy"]["role"], json!("admin"));
    assert_eq!(value["entries"][0]["itemOrder"], json!(1));
    assert_eq!(value["entries"][1]["classification"], json!("Correção"));
    assert!(value.get("otaObs").is_none());
}

#[test]
fn test_status_validation() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let mut bogus = sample_release("1.0.0", "2024-03-01");
    bogus.status = "bogus".to_string();
    let err = create_release(&env.state, &env.admin(), bogus).unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.code, "VALIDATION_ERROR");

    let mut revisao = sample_release("1.0.0", "2024-03-01");
    revisao.status = "revisao".to_string();
    let created = create_release(&env.state, &env.admin(), revisao).expect("创建失败");
    assert_eq!(created.body.status, FirmwareStatus::Revisao);

    let mut bad_update = sample_release("1.0.0", "2024-03-01");
    bad_update.status = "arquivado".to_string();
    let err = update_release(&env.state, &env.admin(), created.body.id, bad_update).unwrap_err();
    assert_eq!(err.status, 400);

    let still = get_release(&env.state, created.body.id).unwrap();
    assert_eq!(still.body.status, FirmwareStatus::Revisao);
}

#[test]
fn test_empty_version_is_rejected() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let err = create_release(&env.state, &env.admin(), sample_release("  ", "2024-03-01"))
        .unwrap_err();
    assert_eq!(err.status, 400);
}

#[test]
fn test_duplicate_version_is_conflict() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let first = create_release(&env.state, &env.admin(), sample_release("1.2.0", "2024-01-01"))
        .expect("创建失败");

    let err = create_release(&env.state, &env.editor(), sample_release("1.2.0", "2025-01-01"))
        .unwrap_err();
    assert_eq!(err.status, 409);
    assert_eq!(err.code, "CONSTRAINT_VIOLATION");

    let intact = get_release(&env.state, first.body.id).unwrap().body;
    assert_eq!(intact.release_date.to_string(), "2024-01-01");
    assert_eq!(intact.modules.len(), 2);

    let all = list_releases(&env.state, &ListQuery::default()).unwrap().body;
    assert_eq!(all.len(), 1);
}

#[test]
fn test_get_unknown_is_404() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let err = get_release(&env.state, 12345).unwrap_err();
    assert_eq!(err.status, 404);
}

// ==========================================
// 更新 (replace-all)
// ==========================================

#[test]
fn test_update_replaces_children_and_preserves_creator() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let created = create_release(&env.state, &env.editor(), sample_release("2.0.0", "2024-05-01"))
        .expect("创建失败")
        .body;

    let mut payload = sample_release("2.0.1", "2024-05-02");
    payload.modules.truncate(1);
    payload.modules[0].version = "9.9.9".to_string();
    payload.entries = vec![firmware_changelog::app::EntryDto {
        item_order: 1,
        classification: "Segurança".to_string(),
        observation: "TLS 1.3".to_string(),
    }];
    payload.links.clear();

    // 由 admin 更新,创建人保持为 editor
    let reply = update_release(&env.state, &env.admin(), created.id, payload.clone())
        .expect("更新失败");
    assert_eq!(reply.status, 200);

    let updated = reply.body;
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.version, "2.0.1");
    assert_eq!(updated.created_by.as_ref().map(|u| u.id), Some(env.editor_id));
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.modules.len(), 1);
    assert_eq!(updated.modules[0].version, "9.9.9");
    assert_eq!(updated.entries.len(), 1);
    assert_eq!(updated.entries[0].classification, EntryClassification::Seguranca);
    assert!(updated.links.is_empty());

    // 相同载荷再次提交,可观察状态不变
    let again = update_release(&env.state, &env.admin(), created.id, payload)
        .expect("更新失败")
        .body;
    let shape = |r: &firmware_changelog::app::ReleaseResponse| {
        (
            r.version.clone(),
            r.modules
                .iter()
                .map(|m| (m.module.clone(), m.version.clone(), m.updated))
                .collect::<Vec<_>>(),
            r.entries
                .iter()
                .map(|e| (e.item_order, e.classification, e.observation.clone()))
                .collect::<Vec<_>>(),
        )
    };
    assert_eq!(shape(&again), shape(&updated));
}

#[test]
fn test_update_unknown_release_is_404() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let err = update_release(&env.state, &env.admin(), 999, sample_release("1.0.0", "2024-01-01"))
        .unwrap_err();
    assert_eq!(err.status, 404);
}

// ==========================================
// 身份与角色
// ==========================================

#[test]
fn test_anonymous_mutations_are_401() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let anon = RequestContext::anonymous();

    let err = create_release(&env.state, &anon, sample_release("1.0.0", "2024-01-01")).unwrap_err();
    assert_eq!(err.status, 401);

    let err = update_release(&env.state, &anon, 1, sample_release("1.0.0", "2024-01-01"))
        .unwrap_err();
    assert_eq!(err.status, 401);

    let err = delete_release(&env.state, &anon, 1).unwrap_err();
    assert_eq!(err.status, 401);

    // 读取是公开的
    assert_eq!(list_releases(&env.state, &ListQuery::default()).unwrap().status, 200);
}

#[test]
fn test_viewer_is_forbidden_from_mutations() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let created = create_release(&env.state, &env.admin(), sample_release("1.0.0", "2024-01-01"))
        .unwrap()
        .body;

    let viewer = env.viewer();
    let err = create_release(&env.state, &viewer, sample_release("1.1.0", "2024-01-01")).unwrap_err();
    assert_eq!(err.status, 403);

    let err = update_release(&env.state, &viewer, created.id, sample_release("1.0.1", "2024-01-01"))
        .unwrap_err();
    assert_eq!(err.status, 403);

    let err = delete_release(&env.state, &viewer, created.id).unwrap_err();
    assert_eq!(err.status, 403);
    assert_eq!(err.code, "FORBIDDEN");
}

#[test]
fn test_delete_requires_admin() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let created = create_release(&env.state, &env.editor(), sample_release("1.0.0", "2024-01-01"))
        .unwrap()
        .body;

    let err = delete_release(&env.state, &env.editor(), created.id).unwrap_err();
    assert_eq!(err.status, 403);

    let reply = delete_release(&env.state, &env.admin(), created.id).expect("删除失败");
    assert_eq!(reply.status, 204);

    assert_eq!(get_release(&env.state, created.id).unwrap_err().status, 404);
    assert_eq!(delete_release(&env.state, &env.admin(), created.id).unwrap_err().status, 404);
}

#[test]
fn test_check_order_identity_then_role_then_payload() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let mut bogus = sample_release("", "not-a-date");
    bogus.status = "bogus".to_string();

    let err = create_release(&env.state, &RequestContext::anonymous(), bogus.clone()).unwrap_err();
    assert_eq!(err.status, 401);

    let err = create_release(&env.state, &env.viewer(), bogus.clone()).unwrap_err();
    assert_eq!(err.status, 403);

    let err = create_release(&env.state, &env.editor(), bogus).unwrap_err();
    assert_eq!(err.status, 400);
}

#[test]
fn test_token_without_role_is_forbidden() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let token = sign_claims(TEST_SECRET, json!({ "uid": env.admin_id }));

    let err = create_release(
        &env.state,
        &RequestContext::bearer(&token),
        sample_release("1.0.0", "2024-01-01"),
    )
    .unwrap_err();
    assert_eq!(err.status, 403);
}

#[test]
fn test_token_signed_with_other_secret_is_401() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let token = sign_claims("other-secret", json!({ "uid": env.admin_id, "role": "admin" }));

    let err = delete_release(&env.state, &RequestContext::bearer(&token), 1).unwrap_err();
    assert_eq!(err.status, 401);
}

// ==========================================
// 列表过滤
// ==========================================

#[test]
fn test_list_date_range_and_order() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let admin = env.admin();
    for (version, date) in [("1.0.0", "2024-01-01"), ("1.1.0", "2024-06-01"), ("2.0.0", "2025-01-01")] {
        create_release(&env.state, &admin, sample_release(version, date)).expect("创建失败");
    }

    let query = ListQuery {
        date_from: Some("2024-01-01".to_string()),
        date_to: Some("2024-12-31".to_string()),
        ..Default::default()
    };
    let list = list_releases(&env.state, &query).unwrap().body;
    let versions: Vec<&str> = list.iter().map(|r| r.version.as_str()).collect();
    assert_eq!(versions, vec!["1.1.0", "1.0.0"]);

    // 格式错误的日期视为无边界
    let query = ListQuery {
        date_from: Some("01/01/2024".to_string()),
        ..Default::default()
    };
    assert_eq!(list_releases(&env.state, &query).unwrap().body.len(), 3);
}

#[test]
fn test_list_free_text_search() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let mut target = sample_release("1.2.0", "2024-02-01");
    target.important_note = Some("urgent security fix".to_string());
    create_release(&env.state, &env.admin(), target).expect("创建失败");
    create_release(&env.state, &env.admin(), sample_release("1.3.0", "2024-03-01"))
        .expect("创建失败");

    let search = |q: &str| {
        list_releases(
            &env.state,
            &ListQuery {
                q: Some(q.to_string()),
                ..Default::default()
            },
        )
        .unwrap()
        .body
        .into_iter()
        .map(|r| r.version)
        .collect::<Vec<_>>()
    };

    assert_eq!(search("security"), vec!["1.2.0"]);
    assert_eq!(search("Security"), vec!["1.2.0"]);
    assert!(search("nonexistent").is_empty());

    let exact = list_releases(
        &env.state,
        &ListQuery {
            version: Some("1.3.0".to_string()),
            ..Default::default()
        },
    )
    .unwrap()
    .body;
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].version, "1.3.0");
}
