use std::fs;

use pretty_assertions::assert_eq;
use tokio::time::Duration;
use tracing_test::traced_test;
use walker_core::Command;
use walker_core::Phase;
use walker_core::SessionController;
use walker_core::SurfaceRole;
use walker_core::WalkerConfig;
use walker_test_support::FakeHost;
use walker_test_support::Focus;
use walker_test_support::START_WINDOW;
use walker_test_support::await_with_timeout;
use walker_test_support::entry;
use walker_test_support::tree;

const WALK_TIMEOUT: Duration = Duration::from_secs(10);

fn run(args: &[&str]) -> Command {
    Command::Run {
        args: args.iter().map(|arg| (*arg).to_string()).collect(),
    }
}

fn sorted(mut lines: Vec<String>) -> Vec<String> {
    lines.sort();
    lines
}

async fn started(
    host: &FakeHost,
    config: WalkerConfig,
    args: &[&str],
) -> SessionController<FakeHost> {
    let mut controller = SessionController::new(host.clone(), config);
    controller.dispatch(run(args)).await;
    await_with_timeout(WALK_TIMEOUT, controller.finish_walk(), "walk").await;
    controller
}

#[tokio::test]
async fn large_walk_reports_every_batch_then_the_end() {
    let files: Vec<String> = (0..1200).map(|i| format!("d{}/f{i}.txt", i % 5)).collect();
    let refs: Vec<&str> = files.iter().map(String::as_str).collect();
    let dir = tree(&refs);
    let host = FakeHost::with_cwd(dir.path());

    let controller = started(&host, WalkerConfig::default(), &["\\.txt$"]).await;

    assert_eq!(
        host.echoes(),
        vec![
            "[500 / 500]".to_string(),
            "[1000 / 1000]".to_string(),
            "[1200 / 1200] walk end !".to_string(),
        ]
    );
    assert_eq!(host.lines(SurfaceRole::Results).len(), 1200);
    assert_eq!(controller.state().filtered, host.lines(SurfaceRole::Results));
    assert!(controller.state().walk_complete);
}

#[tokio::test]
async fn query_narrows_and_widens_the_results() {
    let dir = tree(&["foo.txt", "bar.txt", "baz.md"]);
    let host = FakeHost::with_cwd(dir.path());
    let mut controller = started(&host, WalkerConfig::default(), &["."]).await;
    assert_eq!(host.lines(SurfaceRole::Results).len(), 3);

    host.type_query("/ba");
    controller.dispatch(Command::Refresh { force: false }).await;
    assert_eq!(
        sorted(host.lines(SurfaceRole::Results)),
        vec![entry(dir.path(), "bar.txt"), entry(dir.path(), "baz.md")]
    );
    assert_eq!(host.echoes().last().map(String::as_str), Some("[2 / 3] walk end !"));

    host.type_query("/baz");
    controller.dispatch(Command::Refresh { force: false }).await;
    assert_eq!(
        host.lines(SurfaceRole::Results),
        vec![entry(dir.path(), "baz.md")]
    );
    assert_eq!(controller.state().prev_query, "/baz");

    let echoes = host.echoes().len();
    controller.dispatch(Command::Refresh { force: false }).await;
    assert_eq!(host.echoes().len(), echoes, "unchanged query is a no-op");

    host.type_query("");
    controller.dispatch(Command::Refresh { force: false }).await;
    assert_eq!(host.lines(SurfaceRole::Results).len(), 3);
}

#[tokio::test]
#[traced_test]
async fn malformed_query_leaves_the_session_untouched() {
    let dir = tree(&["foo.txt", "bar.txt"]);
    let host = FakeHost::with_cwd(dir.path());
    let mut controller = started(&host, WalkerConfig::default(), &["txt"]).await;
    host.type_query("/foo");
    controller.dispatch(Command::Refresh { force: false }).await;
    let before = host.lines(SurfaceRole::Results);

    host.type_query("/foo(");
    controller.dispatch(Command::Refresh { force: false }).await;

    assert_eq!(host.lines(SurfaceRole::Results), before);
    assert_eq!(controller.state().filtered, before);
    assert_eq!(controller.state().prev_query, "/foo");
    assert!(host.errors().is_empty());
    assert!(logs_contain("ignoring command"));
}

#[tokio::test]
async fn accept_opens_the_selection_in_the_starting_window() {
    let dir = tree(&["src/main.rs", "README.md"]);
    let host = FakeHost::with_cwd(dir.path());
    let mut controller = started(&host, WalkerConfig::default(), &["/main"]).await;
    assert!(matches!(host.editor().focus, Focus::Surface(_)));

    controller.dispatch(Command::Accept).await;

    assert_eq!(host.opened(), vec![dir.path().join("src/main.rs")]);
    assert_eq!(host.editor().focus, Focus::Window(START_WINDOW));
    assert!(host.editor().surfaces.is_empty());
    assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn missing_selection_is_reported_and_the_session_closes() {
    let dir = tree(&["gone.txt"]);
    let host = FakeHost::with_cwd(dir.path());
    let mut controller = started(&host, WalkerConfig::default(), &["gone\\.txt$"]).await;
    fs::remove_file(dir.path().join("gone.txt")).unwrap();

    controller.dispatch(Command::Accept).await;

    assert_eq!(
        host.errors(),
        vec![format!("Not found: [{}]", entry(dir.path(), "gone.txt"))]
    );
    assert!(host.opened().is_empty());
    assert_eq!(controller.phase(), Phase::Idle);
    assert!(host.editor().surfaces.is_empty());
}

#[tokio::test]
async fn accepting_an_empty_result_list_reports_nothing_found() {
    let dir = tree(&["a.txt"]);
    let host = FakeHost::with_cwd(dir.path());
    let mut controller = started(&host, WalkerConfig::default(), &["nomatch"]).await;

    controller.dispatch(Command::Accept).await;

    assert_eq!(host.errors(), vec!["Not found: []".to_string()]);
    assert!(host.opened().is_empty());
    assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn cancel_is_idempotent_and_accept_after_it_does_nothing() {
    let dir = tree(&["a.txt"]);
    let host = FakeHost::with_cwd(dir.path());
    let mut controller = started(&host, WalkerConfig::default(), &["txt"]).await;

    controller.dispatch(Command::Cancel).await;
    controller.dispatch(Command::Cancel).await;
    assert_eq!(controller.phase(), Phase::Idle);
    assert_eq!(host.editor().closed.len(), 2);

    controller.dispatch(Command::Accept).await;
    assert!(host.opened().is_empty());
    assert!(host.errors().is_empty());
    assert_eq!(host.editor().closed.len(), 2);
}

#[tokio::test]
async fn new_run_replaces_the_open_session() {
    let dir = tree(&["a.txt", "b.md"]);
    let host = FakeHost::with_cwd(dir.path());
    let mut controller = started(&host, WalkerConfig::default(), &["txt"]).await;
    let first = controller.state().surfaces.unwrap();

    controller.dispatch(run(&["\\.md$"])).await;
    await_with_timeout(WALK_TIMEOUT, controller.finish_walk(), "second walk").await;

    let editor = host.editor();
    assert_eq!(editor.closed, vec![first.results, first.query]);
    assert_eq!(editor.surfaces.len(), 2);
    drop(editor);
    assert_eq!(controller.state().return_window, Some(START_WINDOW));
    assert_eq!(
        host.lines(SurfaceRole::Results),
        vec![entry(dir.path(), "b.md")]
    );
}

#[tokio::test]
async fn new_run_during_a_walk_drops_the_old_walk() {
    let mut files: Vec<String> = (0..3000).map(|i| format!("d{}/f{i}.txt", i % 7)).collect();
    files.extend(["notes/one.md".to_string(), "two.md".to_string()]);
    let refs: Vec<&str> = files.iter().map(String::as_str).collect();
    let dir = tree(&refs);
    let host = FakeHost::with_cwd(dir.path());
    let config = WalkerConfig {
        batch_size: 10,
        ..WalkerConfig::default()
    };
    let mut controller = SessionController::new(host.clone(), config);

    controller.dispatch(run(&["\\.txt$"])).await;
    controller.dispatch(run(&["\\.md$"])).await;
    await_with_timeout(WALK_TIMEOUT, controller.finish_walk(), "second walk").await;

    let expected = vec![entry(dir.path(), "notes/one.md"), entry(dir.path(), "two.md")];
    assert_eq!(sorted(controller.state().entries.clone()), expected);
    assert_eq!(sorted(host.lines(SurfaceRole::Results)), expected);
    assert!(controller.state().walk_complete);
    assert_eq!(host.echoes().last().map(String::as_str), Some("[2 / 2] walk end !"));
}

#[tokio::test]
async fn run_without_patterns_prompts_for_one() {
    let dir = tree(&["a.txt", "b.md"]);
    let host = FakeHost::with_cwd(dir.path());
    host.queue_input(Some("md$"));

    let controller = started(&host, WalkerConfig::default(), &[]).await;

    assert_eq!(
        host.editor().prompts,
        vec![walker_core::session::PATTERN_PROMPT.to_string()]
    );
    assert_eq!(
        controller.state().request.as_ref().map(|r| r.patterns.clone()),
        Some(vec!["md$".to_string()])
    );
    assert_eq!(
        host.lines(SurfaceRole::Results),
        vec![entry(dir.path(), "b.md")]
    );
}

#[tokio::test]
async fn cancelled_prompt_starts_nothing() {
    let dir = tree(&["a.txt"]);
    let host = FakeHost::with_cwd(dir.path());
    host.queue_input(None);

    let controller = started(&host, WalkerConfig::default(), &[]).await;

    assert_eq!(controller.phase(), Phase::Idle);
    assert!(controller.state().request.is_none());
    assert!(host.editor().surfaces.is_empty());
}

#[tokio::test]
async fn explicit_path_is_expanded_and_resolved() {
    let dir = tree(&["top.txt", "sub/inner.txt"]);
    let host = FakeHost::with_cwd(dir.path());

    let controller = started(&host, WalkerConfig::default(), &["txt", "--path=~/sub"]).await;

    assert_eq!(
        controller.state().request.as_ref().map(|r| r.root.clone()),
        Some(dir.path().join("sub"))
    );
    assert_eq!(
        host.lines(SurfaceRole::Results),
        vec![entry(dir.path(), "sub/inner.txt")]
    );
}

#[tokio::test]
async fn run_in_buffer_dir_walks_from_the_buffer_directory() {
    let dir = tree(&["top.txt", "nested/deep.txt"]);
    let host = FakeHost::with_cwd(dir.path());
    host.editor().buffer_dir = dir.path().join("nested");

    let mut controller = SessionController::new(host.clone(), WalkerConfig::default());
    controller
        .dispatch(Command::RunInBufferDir {
            args: vec!["txt".to_string()],
        })
        .await;
    await_with_timeout(WALK_TIMEOUT, controller.finish_walk(), "walk").await;

    assert_eq!(
        host.lines(SurfaceRole::Results),
        vec![entry(dir.path(), "nested/deep.txt")]
    );
}

#[tokio::test]
async fn explicit_path_wins_over_the_buffer_directory() {
    let dir = tree(&["nested/deep.txt", "other/wanted.txt"]);
    let host = FakeHost::with_cwd(dir.path());
    host.editor().buffer_dir = dir.path().join("nested");

    let mut controller = SessionController::new(host.clone(), WalkerConfig::default());
    controller
        .dispatch(Command::RunInBufferDir {
            args: vec!["txt".to_string(), "--path=other".to_string()],
        })
        .await;
    await_with_timeout(WALK_TIMEOUT, controller.finish_walk(), "walk").await;

    assert_eq!(controller.phase(), Phase::Walking);
    assert_eq!(
        controller.state().request.as_ref().map(|r| r.root.clone()),
        Some(dir.path().join("other"))
    );
    assert_eq!(
        host.lines(SurfaceRole::Results),
        vec![entry(dir.path(), "other/wanted.txt")]
    );
}

#[tokio::test]
async fn unreadable_root_opens_nothing() {
    let dir = tree(&["a.txt"]);
    let host = FakeHost::with_cwd(dir.path());

    let controller = started(&host, WalkerConfig::default(), &["txt", "--path=missing"]).await;

    assert_eq!(controller.phase(), Phase::Idle);
    assert!(host.editor().surfaces.is_empty());
    assert!(controller.state().request.is_none());
}

#[tokio::test]
async fn failed_view_update_forces_a_full_rewrite_next_time() {
    let dir = tree(&["a.txt", "b.txt"]);
    let host = FakeHost::with_cwd(dir.path());
    let mut controller = started(&host, WalkerConfig::default(), &["txt"]).await;

    host.fail("replace_lines");
    host.type_query("/a\\.txt");
    controller.dispatch(Command::Refresh { force: false }).await;
    assert!(controller.state().filtered.is_empty());
    assert_eq!(controller.state().prev_query, "");

    host.recover("replace_lines");
    controller.dispatch(Command::Refresh { force: true }).await;
    assert_eq!(
        host.lines(SurfaceRole::Results),
        vec![entry(dir.path(), "a.txt")]
    );
    assert_eq!(controller.state().prev_query, "/a\\.txt");
}

#[tokio::test]
async fn default_key_bindings_can_be_disabled() {
    let dir = tree(&["a.txt"]);
    let host = FakeHost::with_cwd(dir.path());
    let config = WalkerConfig {
        disable_default_key_bindings: true,
        ..WalkerConfig::default()
    };

    let _controller = started(&host, config, &["txt"]).await;

    let editor = host.editor();
    assert_eq!(editor.surfaces.len(), 2);
    assert!(editor.surfaces.values().all(|s| s.watched && !s.key_bindings));
}

#[tokio::test]
async fn serve_loop_handles_commands_until_the_channel_closes() {
    let dir = tree(&["a.txt"]);
    let host = FakeHost::with_cwd(dir.path());
    let controller = SessionController::new(host.clone(), WalkerConfig::default());
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let served = tokio::spawn(controller.run(rx));

    tx.send(run(&["txt"])).unwrap();
    tx.send(Command::Cancel).unwrap();
    drop(tx);
    await_with_timeout(WALK_TIMEOUT, served, "serve loop").await.unwrap();

    assert_eq!(host.editor().closed.len(), 2);
    assert!(host.editor().surfaces.is_empty());
}
