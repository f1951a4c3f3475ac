//! Drives a real Chrome against a local page. Run with
//! `cargo test --test chrome_e2e_test -- --ignored` on a machine with Chrome.

use std::{sync::Arc, thread, time::Duration};

use autoplayer::config::BrowserSettings;
use autoplayer::page_parser;
use autoplayer::{BrowserLauncher, BrowserPage, ClickKind, Locator, Selector};

const MAP_PAGE: &str = r##"<html><body>
<img src="map.png" usemap="#navmap">
<map name="navmap">
  <area shape="rect" coords="0,0,10,10" alt="North" href="?act=move&dir=1">
</map>
<input id="note" type="text">
<div id="late"></div>
<script>
  setTimeout(() => { document.getElementById('late').innerHTML = '<span>I have arrived!</span>'; }, 1500);
</script>
</body></html>"##;

const MOVED_PAGE: &str = r#"<html><body><p>You moved north.</p></body></html>"#;

fn start_test_server() -> (String, Arc<tiny_http::Server>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let server_arc = Arc::new(server);
    let server_clone = server_arc.clone();

    thread::spawn(move || {
        for request in server_clone.incoming_requests() {
            let body = if request.url().contains("act=move") {
                MOVED_PAGE
            } else {
                MAP_PAGE
            };
            let header: tiny_http::Header = "Content-Type: text/html".parse().unwrap();
            let response = tiny_http::Response::from_string(body).with_header(header);
            let _ = request.respond(response);
        }
    });

    (format!("http://127.0.0.1:{port}/game"), server_arc)
}

fn headless_settings(profile: &tempfile::TempDir) -> BrowserSettings {
    BrowserSettings {
        headless: true,
        debug_port: 9333,
        profile_dir: profile.path().to_path_buf(),
        ..BrowserSettings::default()
    }
}

#[tokio::test]
#[ignore = "needs a local Chrome"]
async fn test_locator_waits_and_dispatch_click_navigates() {
    let (server_url, _server) = start_test_server();
    let profile = tempfile::tempdir().unwrap();
    let mut launcher = BrowserLauncher::new(headless_settings(&profile));
    let page: Arc<dyn BrowserPage> = Arc::new(launcher.start().await.unwrap());

    page.goto(&server_url, Duration::from_secs(10)).await.unwrap();
    assert!(page_parser::is_overworld_page(&page.content().await.unwrap()));

    // The delayed span appears after the script timer fires
    let late = Locator::new(page.clone(), Selector::text("I have arrived!"));
    assert_eq!(late.count().await.unwrap(), 0);
    late.wait(Some(Duration::from_secs(5))).await.unwrap();

    let missing = Locator::new(page.clone(), "css:#never-there");
    assert!(missing.wait(Some(Duration::from_millis(400))).await.is_err());

    page.fill(&Selector::css("input#note"), "hello").await.unwrap();
    let value = page
        .evaluate("document.getElementById('note').value")
        .await
        .unwrap();
    assert_eq!(value, serde_json::json!("hello"));

    page.click(
        &Selector::css("area[alt=\"North\"]"),
        ClickKind::Dispatch,
        Some(Duration::from_secs(10)),
    )
    .await
    .unwrap();
    assert!(page.url().await.unwrap().contains("act=move"));
    assert!(page.content().await.unwrap().contains("You moved north."));

    launcher.shutdown().await;
}
