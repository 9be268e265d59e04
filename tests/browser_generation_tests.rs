//! Stale-response suppression for the file and git browsers.
//!
//! Every browser request carries the generation it was issued under. A slow
//! response that completes after a newer request was issued must be dropped,
//! whichever order the responses arrive in.

mod common;

use common::Harness;
use panemux::PanelId;
use panemux::browser::{DiffTarget, FileBrowser, GitBrowser};
use panemux::tab::TabKey;
use std::time::Duration;

fn files(h: &Harness) -> &FileBrowser {
    h.tab(PanelId::Left, TabKey::Files)
        .and_then(|tab| tab.as_files())
        .expect("file browser tab")
}

fn git(h: &Harness) -> &GitBrowser {
    h.tab(PanelId::Left, TabKey::Git)
        .and_then(|tab| tab.as_git())
        .expect("git browser tab")
}

// ============================================================================
// File browser
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_slow_listing_never_overwrites_newer_one() {
    let mut h = Harness::new();
    h.services.delay("list:/slow", Duration::from_millis(500));
    h.services.delay("list:/fast", Duration::from_millis(10));

    h.manager.show_file_browser("dev", Some("/slow"));
    h.manager.focused_panel_mut().navigate_files("/fast");
    h.settle().await;

    let browser = files(&h);
    assert_eq!(browser.generation(), 2);
    assert_eq!(browser.path(), "/fast");
    assert!(!browser.is_loading());
    assert_eq!(browser.entries()[0].name, "/fast/entry");

    h.advance(Duration::from_secs(1)).await;
    let browser = files(&h);
    assert_eq!(browser.path(), "/fast");
    assert_eq!(browser.entries()[0].name, "/fast/entry");
    assert_eq!(h.services.call_count("list:/slow"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_listing_dropped_while_newer_still_loading() {
    let mut h = Harness::new();
    h.services.delay("list:/first", Duration::from_millis(100));
    h.services.delay("list:/second", Duration::from_millis(400));

    h.manager.show_file_browser("dev", Some("/first"));
    h.manager.focused_panel_mut().navigate_files("/second");

    h.advance(Duration::from_millis(200)).await;
    let browser = files(&h);
    assert!(browser.is_loading(), "first response is stale");
    assert!(browser.entries().is_empty());

    h.advance(Duration::from_millis(300)).await;
    let browser = files(&h);
    assert!(!browser.is_loading());
    assert_eq!(browser.entries()[0].name, "/second/entry");
}

#[tokio::test(start_paused = true)]
async fn test_stale_failure_does_not_set_error() {
    let mut h = Harness::new();
    h.services.delay("list:/broken", Duration::from_millis(300));
    h.services.fail("list:/broken");

    h.manager.show_file_browser("dev", Some("/broken"));
    h.manager.focused_panel_mut().navigate_files("/ok");
    h.advance(Duration::from_millis(500)).await;

    let browser = files(&h);
    assert_eq!(browser.error(), None);
    assert_eq!(browser.path(), "/ok");
}

#[tokio::test(start_paused = true)]
async fn test_show_file_browser_navigates_cached_browser() {
    let mut h = Harness::new();
    h.manager.show_file_browser("dev", Some("/a"));
    h.settle().await;

    h.manager.show_file_browser("dev", Some("/a"));
    h.settle().await;
    assert_eq!(h.services.call_count("list:/a"), 1, "same path is not reloaded");

    h.manager.show_file_browser("dev", Some("/b"));
    h.settle().await;
    assert_eq!(files(&h).path(), "/b");
    assert_eq!(files(&h).generation(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_parent_navigation() {
    let mut h = Harness::new();
    h.manager.show_file_browser("dev", Some("/home/dev/src"));
    h.manager.focused_panel_mut().files_parent();
    h.settle().await;

    assert_eq!(files(&h).path(), "/home/dev");
    assert_eq!(files(&h).entries()[0].name, "/home/dev/entry");
}

#[tokio::test(start_paused = true)]
async fn test_released_browser_requests_are_dropped() {
    let mut h = Harness::new();
    h.services.delay("list:/slow", Duration::from_millis(500));
    h.manager.show_file_browser("dev", Some("/slow"));
    h.settle().await;

    h.manager.connect_to_window("other", 0);
    h.advance(Duration::from_secs(1)).await;

    let panel = h.manager.panel(PanelId::Left).expect("left panel");
    assert!(!panel.cache().contains(TabKey::Files));
    assert_eq!(panel.session(), Some("other"));
}

// ============================================================================
// Git browser
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_git_log_loads_on_first_show() {
    let mut h = Harness::new();
    h.manager.show_git_browser("dev");
    assert!(git(&h).is_log_loading());
    h.settle().await;

    let browser = git(&h);
    assert!(!browser.is_log_loading());
    assert_eq!(browser.commits().len(), 1);
    assert_eq!(browser.commits()[0].summary, "dev head");

    h.manager.focused_panel_mut().refresh();
    h.settle().await;
    assert_eq!(h.services.call_count("log"), 2);
    assert_eq!(git(&h).log_generation(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_file_diff_supersedes_slow_commit_diff() {
    let mut h = Harness::new();
    h.services.delay("commit:aaa", Duration::from_millis(500));
    h.manager.show_git_browser("dev");
    h.settle().await;

    h.manager.focused_panel_mut().select_commit("aaa");
    h.manager.focused_panel_mut().show_file_diff("src/lib.rs");
    h.settle().await;

    let browser = git(&h);
    assert_eq!(browser.selection(), Some(&DiffTarget::File("src/lib.rs".to_string())));
    assert_eq!(browser.diff(), Some("diff of file src/lib.rs"));
    assert!(!browser.is_diff_loading());

    h.advance(Duration::from_secs(1)).await;
    assert_eq!(git(&h).diff(), Some("diff of file src/lib.rs"));
}

#[tokio::test(start_paused = true)]
async fn test_close_diff_discards_in_flight_diff() {
    let mut h = Harness::new();
    h.services.delay("commit:bbb", Duration::from_millis(200));
    h.manager.show_git_browser("dev");
    h.manager.focused_panel_mut().select_commit("bbb");
    assert!(git(&h).is_diff_loading());

    h.manager.focused_panel_mut().close_diff();
    h.advance(Duration::from_millis(500)).await;

    let browser = git(&h);
    assert_eq!(browser.selection(), None);
    assert_eq!(browser.diff(), None);
    assert!(!browser.is_diff_loading());
    assert_eq!(browser.commits().len(), 1, "log is independent of the diff pane");
}

#[tokio::test(start_paused = true)]
async fn test_diff_failure_is_inline() {
    let mut h = Harness::new();
    h.services.fail("commit:bad");
    h.manager.show_git_browser("dev");
    h.manager.focused_panel_mut().select_commit("bad");
    h.settle().await;

    let browser = git(&h);
    assert_eq!(browser.selection(), Some(&DiffTarget::Commit("bad".to_string())));
    assert_eq!(browser.diff(), None);
    assert_eq!(browser.diff_error(), Some("commit:bad failed"));
    assert_eq!(browser.log_error(), None);
}

#[tokio::test(start_paused = true)]
async fn test_log_failure_is_inline() {
    let mut h = Harness::new();
    h.services.fail("log");
    h.manager.connect_to_window("dev", 0);
    h.manager.show_git_browser("dev");
    h.settle().await;

    let browser = git(&h);
    assert_eq!(browser.log_error(), Some("log failed"));
    assert!(browser.commits().is_empty());
    assert!(h.manager.panel(PanelId::Left).expect("left").is_connected());
}
