//! End-to-end reconciliation scenarios against an in-memory vault.

use calloutapp::callout::{self, ParseOptions};
use calloutapp::chunk::{self, ChunkEntry};
use calloutapp::config::Timing;
use calloutapp::controller::{Controller, VaultEvent};
use calloutapp::engine::SyncEngine;
use calloutapp::reconcile;
use calloutapp::store::memory::MemVault;
use std::time::{Duration, Instant};

fn tracked() -> Vec<String> {
    vec!["todo".to_string(), "questions".to_string()]
}

fn engine(vault: MemVault) -> SyncEngine<MemVault> {
    SyncEngine::new(vault, tracked(), "")
}

#[test]
fn scenario_a_new_callout_gets_identifier() {
    let parsed = callout::parse(
        "> [!todo]\n> - [ ] buy milk\n",
        &tracked(),
        ParseOptions::assigning(),
    );

    assert_eq!(parsed.callouts.len(), 1);
    let callout = &parsed.callouts[0];
    assert_eq!(callout.body_lines, vec!["- [ ] buy milk"]);
    assert_eq!(callout.block_id.len(), 8);
    assert!(callout
        .block_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    assert_eq!(
        parsed.text(),
        format!("> [!todo]\n> - [ ] buy milk\n\n^{}\n\n", callout.block_id)
    );
}

#[test]
fn scenario_b_rebuilt_master() {
    let entry = ChunkEntry::for_source(
        "Shopping.md",
        "abc12345",
        &["- [ ] buy milk".to_string()],
    );
    assert_eq!(
        reconcile::rebuild_master(vec![entry.clone()]),
        "[Shopping](Shopping.md#^abc12345)\n- [ ] buy milk\n\n"
    );
    assert_eq!(
        reconcile::source_to_master("", "Shopping.md", &[entry]),
        "[Shopping](Shopping.md#^abc12345)\n- [ ] buy milk\n\n"
    );
}

#[test]
fn scenario_c_master_edit_updates_source_in_place() {
    let source = "# Groceries\n\nSome intro.\n\n> [!todo]- Weekly\n> - [ ] buy milk\n\n^abc12345\n\n## Later\nunrelated\n";
    let vault = MemVault::new()
        .with_file("Shopping.md", source)
        .with_file(
            "todo.md",
            "[Shopping](Shopping.md#^abc12345)\n- [x] buy milk\n- [ ] bread\n\n",
        );
    let e = engine(vault);

    let report = e.sync_master("todo.md").unwrap();
    assert_eq!(report.written, vec!["Shopping.md"]);
    assert_eq!(
        e.vault().file("Shopping.md").unwrap(),
        "# Groceries\n\nSome intro.\n\n> [!todo]- Weekly\n> - [x] buy milk\n> - [ ] bread\n\n^abc12345\n\n## Later\nunrelated\n"
    );
}

#[test]
fn scenario_d_deleted_source_leaves_no_residue() {
    let master = "[A](A.md#^a1)\none\n\n[B](B.md#^b1)\ntwo\n\n[A](A.md#^a2)\nthree\n\n[C](C.md#^c1)\nfour\n\n";
    let vault = MemVault::new()
        .with_file("todo.md", master)
        .with_file("questions.md", "[A](A.md#^q1)\nwhy\n\n");
    let e = engine(vault);

    e.on_delete("A.md").unwrap();
    assert_eq!(
        e.vault().file("todo.md").unwrap(),
        "[B](B.md#^b1)\ntwo\n\n[C](C.md#^c1)\nfour\n\n"
    );
    assert_eq!(e.vault().file("questions.md").unwrap(), "");
}

#[test]
fn scenario_e_burst_of_edits_is_one_pass() {
    let vault = MemVault::new().with_file("a.md", "> [!todo]\n> v1\n\n^t1\n");
    let mut controller = Controller::new(
        engine(vault),
        Timing {
            debounce: Duration::from_millis(500),
            suppress: Duration::from_millis(1500),
        },
    );
    let t0 = Instant::now();

    for (i, body) in ["v2", "v3", "v4"].iter().enumerate() {
        controller
            .engine()
            .vault()
            .insert_file("a.md", &format!("> [!todo]\n> {}\n\n^t1\n", body));
        controller.handle(
            VaultEvent::Modified("a.md".into()),
            t0 + Duration::from_millis(100 * i as u64),
        );
    }

    let mut passes = 0;
    for step in 0..30 {
        passes += controller.poll(t0 + Duration::from_millis(100 * step)).len();
    }
    assert_eq!(passes, 1);
    assert_eq!(controller.engine().vault().write_count("todo.md"), 1);
    assert_eq!(
        controller.engine().vault().file("todo.md").unwrap(),
        "[a](a.md#^t1)\nv4\n\n"
    );
}

#[test]
fn round_trip_restores_every_body() {
    let source = "> [!todo]\n> first\n> - nested\n\ntext between\n\n> [!questions]\n> why?\n>\n> really?\n\n> [!todo]\n> last\n";
    let e = engine(MemVault::new().with_file("N.md", source));

    e.sync_source("N.md").unwrap();
    let with_ids = e.vault().file("N.md").unwrap();
    let before = callout::parse(&with_ids, &tracked(), ParseOptions::existing_only());
    assert_eq!(before.callouts.len(), 3);

    e.sync_master("todo.md").unwrap();
    e.sync_master("questions.md").unwrap();
    assert_eq!(e.vault().file("N.md").unwrap(), with_ids);

    let after = callout::parse(&with_ids, &tracked(), ParseOptions::existing_only());
    let bodies: Vec<_> = after.callouts.iter().map(|c| c.body_lines.clone()).collect();
    assert_eq!(
        bodies,
        vec![
            vec!["first".to_string(), "- nested".to_string()],
            vec!["why?".to_string(), "".to_string(), "really?".to_string()],
            vec!["last".to_string()],
        ]
    );
}

#[test]
fn idempotence_across_both_directions() {
    let e = engine(MemVault::new().with_file("a.md", "> [!todo]\n> x\n\n> [!questions]\n> y\n"));
    e.sync_source("a.md").unwrap();
    e.vault().clear_writes();

    e.sync_source("a.md").unwrap();
    e.sync_master("todo.md").unwrap();
    e.sync_master("questions.md").unwrap();
    e.rebuild_all().unwrap();
    assert!(e.vault().writes().is_empty(), "unexpected writes: {:?}", e.vault().writes());
}

#[test]
fn identifiers_survive_every_pass() {
    let e = engine(MemVault::new().with_file("a.md", "> [!todo]\n> x\n"));
    e.sync_source("a.md").unwrap();
    let id = callout::parse(
        &e.vault().file("a.md").unwrap(),
        &tracked(),
        ParseOptions::existing_only(),
    )
    .callouts[0]
        .block_id
        .clone();

    e.vault()
        .insert_file("todo.md", &format!("[a](a.md#^{})\nedited\n\n", id));
    e.sync_master("todo.md").unwrap();
    e.rebuild_all().unwrap();

    let text = e.vault().file("a.md").unwrap();
    assert_eq!(text, format!("> [!todo]\n> edited\n\n^{}\n\n", id));
}

#[test]
fn folder_rename_moves_every_chunk() {
    let vault = MemVault::new().with_file(
        "todo.md",
        "[x](Inbox/x.md#^1)\nx\n\n[y](Inbox/Deep/y.md#^2)\ny\n\n[z](Other/z.md#^3)\nz\n\n",
    );
    let e = engine(vault);
    e.on_rename("Inbox", "Archive/2024").unwrap();

    let parsed = chunk::parse(&e.vault().file("todo.md").unwrap());
    let sources: Vec<&str> = parsed.chunks.iter().map(|c| c.source_path.as_str()).collect();
    assert_eq!(
        sources,
        vec!["Archive/2024/x.md", "Archive/2024/Deep/y.md", "Other/z.md"]
    );
}

#[test]
fn wiki_link_chunks_sync_back() {
    let vault = MemVault::new()
        .with_file("Projects/Garden.md", "> [!todo]\n> old\n\n^g1\n")
        .with_file("todo.md", "[[Projects/Garden#^g1|Garden]]\nnew\n\n");
    let e = engine(vault);

    e.sync_master("todo.md").unwrap();
    assert_eq!(
        e.vault().file("Projects/Garden.md").unwrap(),
        "> [!todo]\n> new\n\n^g1\n"
    );
}
