// tests/common/mod.rs
// In-process stand-ins for the Sakai portal and the Telegram Bot API.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Form, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use portal_announcer::Config;
use serde_json::{json, Value};

pub const USERNAME: &str = "student";
pub const PASSWORD: &str = "hunter2";
pub const TOKEN: &str = "42:test-token";
pub const CHAT_ID: &str = "-1001";

/// Bind an ephemeral port, build the router with the resulting base URL and serve it.
pub async fn spawn<F>(build: F) -> String
where
    F: FnOnce(String) -> Router,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = build(base.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

// ---------------- Telegram ----------------

#[derive(Clone, Default)]
pub struct TelegramLog {
    pub calls: Arc<Mutex<Vec<(String, Value)>>>,
    pub reject: bool,
}

impl TelegramLog {
    pub fn texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body["text"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

async fn send_message(
    State(log): State<TelegramLog>,
    Path(bot): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    log.calls.lock().unwrap().push((bot, body));
    if log.reject {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "description": "Bad Request: can't parse entities"})),
        )
            .into_response()
    } else {
        Json(json!({"ok": true})).into_response()
    }
}

pub async fn spawn_telegram(log: TelegramLog) -> String {
    spawn(|_| {
        Router::new()
            .route("/{bot}/sendMessage", post(send_message))
            .with_state(log)
    })
    .await
}

// ---------------- Portal ----------------

pub const LOGIN_PAGE: &str = r#"<html><body>
  <div class="login">
    <form action="/portal/xlogin" method="post">
      <input type="hidden" name="csrf" value="abc123">
      <input type="text" name="eid" id="eid">
      <input type="password" name="pw" id="pw">
      <input type="submit" name="submit" value="Giriş">
    </form>
  </div>
</body></html>"#;

pub const HOME_PAGE: &str = r#"<html><body>
  <div id="Mrphs-bullhorn"><span class="bullhorn-counter-red">2</span></div>
  <ul><li>Ana sayfa</li><li>Takvim</li></ul>
  <article><h3>Duyuru: Final sınav takvimi</h3><p>Finaller 10 Ocak'ta başlar.</p></article>
</body></html>"#;

pub const DETAIL_PAGE: &str = r#"<html><body>
  <h1>Vize Sınavı Yeri</h1>
  <div class="portletBody">
    <div>Mesaj</div>
    <p>Sınav B-203 salonunda yapılacaktır.</p>
    <div>Ekler</div>
    <div>salon_plani.pdf (120 KB)</div>
    <div>Ekleyen: Dr. Kaya</div>
  </div>
</body></html>"#;

#[derive(Clone)]
pub struct FakePortal {
    /// `alerts` array served by the feed; `None` makes the feed fail with 500.
    pub alerts: Option<Value>,
}

impl FakePortal {
    /// The usual feed: one announcement with a detail page, one without,
    /// one menu entry and one unrelated tool event.
    pub fn standard(base: &str) -> Value {
        json!([
            {
                "title": "Dr. Kaya \"CME 2204\"'de \"Vize Sınavı Yeri\" duyurusu eklendi",
                "url": format!("{base}/portal/directtool/annc-1"),
                "event": "annc.new",
                "siteTitle": "CME 2204",
                "fromDisplayName": "Dr. Kaya"
            },
            {
                "title": "Ders Listesi",
                "url": format!("{base}/portal/directtool/menu"),
                "event": "annc.new"
            },
            {
                "title": "Quiz <1> & review",
                "url": "/portal/directtool/annc-2",
                "event": "annc.new",
                "siteTitle": null
            },
            {
                "title": "Gradebook updated",
                "url": "/portal/site/x/gradebook",
                "event": "gradebook.updateItemScore"
            }
        ])
    }
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains("JSESSIONID=ok"))
}

async fn portal_home(headers: HeaderMap) -> Html<&'static str> {
    if has_session(&headers) {
        Html(HOME_PAGE)
    } else {
        Html(LOGIN_PAGE)
    }
}

async fn xlogin(Form(fields): Form<HashMap<String, String>>) -> Response {
    let ok = fields.get("eid").map(String::as_str) == Some(USERNAME)
        && fields.get("pw").map(String::as_str) == Some(PASSWORD)
        && fields.get("csrf").map(String::as_str) == Some("abc123");
    if ok {
        (
            [(header::SET_COOKIE, "JSESSIONID=ok; Path=/")],
            Html(HOME_PAGE),
        )
            .into_response()
    } else {
        Html(LOGIN_PAGE).into_response()
    }
}

async fn alert_feed(State(portal): State<FakePortal>, headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    match portal.alerts {
        Some(list) => Json(json!({ "alerts": list, "message": "" })).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn detail() -> Html<&'static str> {
    Html(DETAIL_PAGE)
}

/// Serve a portal. `alerts` receives the base URL so entries can carry absolute links.
pub async fn spawn_portal<F>(alerts: F) -> String
where
    F: FnOnce(&str) -> Option<Value>,
{
    spawn(|base| {
        let state = FakePortal {
            alerts: alerts(&base),
        };
        Router::new()
            .route("/portal", get(portal_home))
            .route("/portal/xlogin", post(xlogin))
            .route("/direct/portal/bullhornAlerts.json", get(alert_feed))
            .route("/portal/directtool/annc-1", get(detail))
            .with_state(state)
    })
    .await
}

/// Config pointing at the fake servers. `extra` overrides or adds keys.
pub fn config(portal: &str, telegram: &str, extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("TELEGRAM_TOKEN".to_string(), TOKEN.to_string()),
        ("TELEGRAM_CHAT_ID".to_string(), CHAT_ID.to_string()),
        ("TELEGRAM_API_BASE".to_string(), telegram.to_string()),
        ("SAKAI_URL".to_string(), format!("{portal}/portal")),
        ("SAKAI_USERNAME".to_string(), USERNAME.to_string()),
        ("SAKAI_PASSWORD".to_string(), PASSWORD.to_string()),
        ("NOTIFY_DELAY_MS".to_string(), "0".to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|k: &str| vars.get(k).cloned()).unwrap()
}
