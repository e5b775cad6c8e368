// ==========================================
// 并发读写测试
// ==========================================
// 职责: 验证整体替换期间读者只能看到完整的旧集合或新集合
// ==========================================


use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use firmware_changelog::domain::release::{EntryInput, ModuleInput, NewRelease};
use firmware_changelog::domain::types::{EntryClassification, FirmwareStatus};
use firmware_changelog::repository::ReleaseRepository;
use test_helpers::TestEnv;

fn modules(tag: &str, n: usize) -> Vec<ModuleInput> {
    (0..n)
        .map(|i| ModuleInput {
            module: format!("{}-{}", tag, i),
            version: tag.to_string(),
            updated: true,
        })
        .collect()
}

fn entries(tag: &str, n: usize) -> Vec<EntryInput> {
    (0..n)
        .map(|i| EntryInput {
            item_order: i as i32,
            classification: EntryClassification::Otimizacao,
            observation: tag.to_string(),
        })
        .collect()
}

#[test]
fn test_readers_never_see_partial_child_sets() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let repo = Arc::new(ReleaseRepository::new(env.state.conn.clone()));

    let id = repo
        .create(&NewRelease {
            version: "3.0.0".to_string(),
            previous_version: String::new(),
            ota: false,
            ota_obs: None,
            release_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            important_note: None,
            status: FirmwareStatus::Producao,
            product_category: "Carregadores".to_string(),
            product_name: "Wallbox".to_string(),
            created_by_user_id: env.admin_id,
            modules: modules("old", 2),
            entries: entries("old", 2),
            links: Vec::new(),
        })
        .expect("创建失败");

    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let repo = repo.clone();
        let done = done.clone();
        thread::spawn(move || {
            for round in 0..50 {
                let (tag, n) = if round % 2 == 0 { ("new", 3) } else { ("old", 2) };
                repo.replace_relations(id, &modules(tag, n), &entries(tag, n), &[])
                    .expect("替换失败");
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let reader = {
        let repo = repo.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut reads = 0;
            while !done.load(Ordering::SeqCst) || reads == 0 {
                let release = repo.get_by_id(id).expect("查询失败");
                let tags: Vec<&str> = release.modules.iter().map(|m| m.version.as_str()).collect();
                let tag = tags[0];

                // 模块与条目必须来自同一次替换
                let expected = if tag == "new" { 3 } else { 2 };
                assert_eq!(release.modules.len(), expected);
                assert_eq!(release.entries.len(), expected);
                assert!(tags.iter().all(|t| *t == tag));
                assert!(release.entries.iter().all(|e| e.observation == tag));
                reads += 1;
            }
            reads
        })
    };

    writer.join().expect("写线程异常");
    let reads = reader.join().expect("读线程异常");
    assert!(reads > 0);
}
