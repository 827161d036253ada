//! End-to-end tests for the streaming layout server.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use spa_layout::config::{FragmentSource, ServerConfig};
use spa_layout::layout::InputNode;

mod common;

fn el(tag: &str, attrs: &[(&str, &str)], children: Vec<InputNode>) -> InputNode {
    InputNode::element(tag, attrs, children)
}

fn document() -> Vec<InputNode> {
    vec![
        InputNode::Doctype {
            name: "html".into(),
        },
        el(
            "html",
            &[],
            vec![
                el("head", &[], vec![el("fragment", &[("name", "importmap")], vec![])]),
                el(
                    "body",
                    &[],
                    vec![el(
                        "single-spa-router",
                        &[],
                        vec![
                            el("application", &[("name", "nav")], vec![]),
                            el(
                                "route",
                                &[("path", "broken-page")],
                                vec![el("application", &[("name", "broken")], vec![])],
                            ),
                            el(
                                "route",
                                &[("default", "true")],
                                vec![el("application", &[("name", "main"), ("props", "user")], vec![])],
                            ),
                            el("redirect", &[("from", "/old"), ("to", "/new")], vec![]),
                            el("footer", &[], vec![InputNode::text("Footer")]),
                        ],
                    )],
                ),
            ],
        ),
    ]
}

async fn start_upstream() -> SocketAddr {
    common::start_programmable_backend(|target: String| async move {
        let path = target.split('?').next().unwrap_or_default().to_string();
        match path.as_str() {
            "/nav/render" => {
                // Slowest application first: order must still hold.
                tokio::time::sleep(Duration::from_millis(150)).await;
                (200, "<nav>Nav</nav>".to_string())
            }
            "/nav/headers" => (200, r#"{"cache-control": "max-age=60", "x-nav": "1"}"#.to_string()),
            "/main/render" => {
                let greeting = if target.contains("ada") { "Hello ada" } else { "Hello" };
                (200, format!("<main>{greeting}</main>"))
            }
            "/main/headers" => (200, r#"{"cache-control": "no-store"}"#.to_string()),
            "/broken/render" => (500, "boom".to_string()),
            "/props/user" => (200, r#""ada""#.to_string()),
            _ => (404, String::new()),
        }
    })
    .await
}

async fn start() -> (SocketAddr, spa_layout::Shutdown) {
    let upstream = start_upstream().await;
    let mut config = ServerConfig::default();
    for app in ["nav", "main", "broken"] {
        config
            .applications
            .insert(app.to_string(), format!("http://{upstream}/{app}"));
    }
    config.fragments.insert(
        "importmap".to_string(),
        FragmentSource::Inline(r#"<script type="importmap">{}</script>"#.to_string()),
    );
    config.props.url = Some(format!("http://{upstream}/props"));
    common::start_layout_server(config, document()).await
}

fn position(body: &str, needle: &str) -> usize {
    body.find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not found in body:\n{body}"))
}

#[tokio::test]
async fn test_streams_applications_in_document_order() {
    let (addr, _shutdown) = start().await;

    let res = common::client()
        .get(format!("http://{addr}/"))
        .send()
        .await
        .expect("Server unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8");
    assert_eq!(res.headers()["cache-control"], "no-store");
    assert_eq!(res.headers()["x-nav"], "1");
    assert!(res.headers().contains_key("x-request-id"));

    let body = res.text().await.unwrap();
    let importmap = position(&body, r#"<script type="importmap">{}</script>"#);
    let nav = position(&body, r#"<div id="single-spa-application:nav"><nav>Nav</nav></div>"#);
    let main = position(&body, r#"<div id="single-spa-application:main"><main>Hello ada</main></div>"#);
    let footer = position(&body, "<footer>Footer</footer>");
    let island = position(&body, r#"id="single-spa-layout-data""#);
    assert!(body.starts_with("<!DOCTYPE html>"));
    assert!(importmap < nav && nav < main && main < footer && footer < island);
    assert!(body.contains(r#""user":"ada""#));
    assert!(!body.contains("single-spa-application:broken"));
}

#[tokio::test]
async fn test_redirect_returns_found_with_empty_body() {
    let (addr, _shutdown) = start().await;

    let res = common::client()
        .get(format!("http://{addr}/old"))
        .send()
        .await
        .expect("Server unreachable");

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/new");
    assert!(res.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_broken_application_is_isolated() {
    let (addr, _shutdown) = start().await;

    let res = common::client()
        .get(format!("http://{addr}/broken-page"))
        .send()
        .await
        .expect("Server unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    let broken = position(&body, r#"<div id="single-spa-application:broken"></div>"#);
    let footer = position(&body, "<footer>Footer</footer>");
    assert!(broken < footer);
    assert!(!body.contains("single-spa-application:main"));
    assert!(body.trim_end().ends_with("</html>"));
}

#[tokio::test]
async fn test_non_get_is_rejected() {
    let (addr, _shutdown) = start().await;

    let res = common::client()
        .post(format!("http://{addr}/"))
        .send()
        .await
        .expect("Server unreachable");

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_shutdown_stops_server() {
    let (addr, shutdown) = start().await;
    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(common::client()
        .get(format!("http://{addr}/"))
        .send()
        .await
        .is_err());
}
