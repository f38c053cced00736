// src/collect/portal.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::extract::{self, DetailPage};
use super::Collector;
use crate::announcement::AnnouncementRecord;
use crate::config::Config;
use crate::error::CollectorError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const PAGE_TIMEOUT_SECS: u64 = 15;
const ALERTS_PATH: &str = "/direct/portal/bullhornAlerts.json";
/// Alerts with less text than this are skipped.
const MIN_ALERT_CHARS: usize = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlertFeed {
    alerts: Vec<BullhornAlert>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BullhornAlert {
    title: Option<String>,
    url: Option<String>,
    event: Option<String>,
    site_title: Option<String>,
    from_display_name: Option<String>,
}

struct Page {
    url: Url,
    html: String,
}

/// Cookie-backed session against a Sakai portal: log in, read the bullhorn
/// alert feed, open each announcement for its body and attachments.
pub struct PortalCollector {
    client: Client,
    portal_url: Url,
    username: String,
    password: String,
    allow_page_search: bool,
}

impl PortalCollector {
    pub fn new(cfg: &Config) -> Result<Self, CollectorError> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(PAGE_TIMEOUT_SECS))
            .build()
            .map_err(CollectorError::Client)?;
        if cfg.headless {
            tracing::debug!("HEADLESS is set; the HTTP collector never opens a window");
        }
        Ok(Self {
            client,
            portal_url: cfg.portal_url.clone(),
            username: cfg.portal_username.clone(),
            password: cfg.portal_password.clone(),
            allow_page_search: cfg.allow_page_search,
        })
    }

    fn resolve(&self, base: &Url, target: &str) -> Result<Url, CollectorError> {
        base.join(target)
            .map_err(|e| CollectorError::Url(format!("{target}: {e}")))
    }

    async fn get_page(&self, url: Url) -> Result<Page, CollectorError> {
        let http = |source: reqwest::Error| CollectorError::Http {
            url: url.to_string(),
            source,
        };
        let rsp = self.client.get(url.clone()).send().await.map_err(http)?;
        let status = rsp.status();
        if !status.is_success() {
            return Err(CollectorError::Status {
                url: url.to_string(),
                status,
            });
        }
        let final_url = rsp.url().clone();
        let html = rsp.text().await.map_err(http)?;
        Ok(Page {
            url: final_url,
            html,
        })
    }

    /// Submit credentials through the first login form found on `page` or in
    /// one of its iframes. Returns the logged-in portal page on success.
    async fn login(&self, page: &Page) -> Result<Option<Page>, CollectorError> {
        let mut found = extract::find_login_form(&page.html).map(|f| (f, page.url.clone()));
        if found.is_none() {
            for src in extract::iframe_sources(&page.html) {
                let frame_url = self.resolve(&page.url, &src)?;
                let frame = match self.get_page(frame_url).await {
                    Ok(f) => f,
                    Err(e) => {
                        tracing::debug!("login iframe unreadable: {e}");
                        continue;
                    }
                };
                if let Some(form) = extract::find_login_form(&frame.html) {
                    found = Some((form, frame.url));
                    break;
                }
            }
        }
        let Some((form, base)) = found else {
            tracing::debug!("no login form on portal page");
            return Ok(None);
        };

        let action = match form.action.as_deref().filter(|a| !a.trim().is_empty()) {
            Some(a) => self.resolve(&base, a)?,
            None => base,
        };
        let mut fields = form.extra.clone();
        fields.push((form.user_field.clone(), self.username.clone()));
        fields.push((form.pass_field.clone(), self.password.clone()));

        let http = |source: reqwest::Error| CollectorError::Http {
            url: action.to_string(),
            source,
        };
        let rsp = self
            .client
            .post(action.clone())
            .form(&fields)
            .send()
            .await
            .map_err(http)?;
        let landed = Page {
            url: rsp.url().clone(),
            html: rsp.text().await.map_err(http)?,
        };
        if extract::has_bullhorn(&landed.html) {
            return Ok(Some(landed));
        }

        let portal = self.get_page(self.portal_url.clone()).await?;
        Ok(extract::has_bullhorn(&portal.html).then_some(portal))
    }

    async fn fetch_feed(&self) -> Result<Vec<BullhornAlert>, CollectorError> {
        let url = self.resolve(&self.portal_url, ALERTS_PATH)?;
        let page = self.get_page(url).await?;
        let feed: AlertFeed = serde_json::from_str(&page.html)?;
        Ok(feed.alerts)
    }

    async fn fetch_detail(&self, href: &str) -> Option<DetailPage> {
        let url = match self.resolve(&self.portal_url, href) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!("Detail fetch failed: {e}");
                return None;
            }
        };
        match self.get_page(url).await {
            Ok(page) => Some(extract::extract_detail(&page.html)),
            Err(e) => {
                tracing::debug!("Detail fetch failed: {e}");
                None
            }
        }
    }

    async fn from_alerts(&self) -> Result<Vec<AnnouncementRecord>, CollectorError> {
        let alerts = self.fetch_feed().await?;
        tracing::info!("Total alerts in feed: {}", alerts.len());

        let mut out = Vec::new();
        for (idx, alert) in alerts.into_iter().enumerate() {
            let text = alert.title.as_deref().unwrap_or_default().trim().to_string();
            if text.chars().count() < MIN_ALERT_CHARS {
                tracing::debug!(idx, "alert text too short, skipping: {text:?}");
                continue;
            }
            let href = alert.url.filter(|u| !u.trim().is_empty());
            let annc_event = alert
                .event
                .as_deref()
                .is_some_and(|e| e.starts_with("annc."));
            if !annc_event && !extract::looks_like_announcement(href.as_deref(), &text) {
                tracing::debug!(idx, "doesn't look like announcement: {text}");
                continue;
            }

            let first_line = text.lines().next().unwrap_or_default().trim().to_string();
            let title = extract::extract_quoted_title(&first_line).unwrap_or(first_line);
            if extract::is_menu_item(&title) {
                tracing::debug!(idx, "Skipping generic menu item: {title}");
                continue;
            }
            tracing::debug!(
                idx,
                site = alert.site_title.as_deref().unwrap_or_default(),
                from = alert.from_display_name.as_deref().unwrap_or_default(),
                href = href.as_deref().unwrap_or("NO HREF"),
                "alert accepted"
            );

            let detail = match href.as_deref() {
                Some(h) => self.fetch_detail(h).await,
                None => None,
            };
            let message = match detail.filter(|d| d.content.chars().count() > 20) {
                Some(d) => extract::compose_message(&d.title, &d.content, &d.attachments),
                None => {
                    tracing::debug!("Using notification text as content (no detail page)");
                    title.clone()
                }
            };

            let short: String = title.chars().take(60).collect();
            out.push(AnnouncementRecord::compose(&title, &message, href));
            tracing::info!("✓ Added announcement: {short}");
        }

        tracing::info!("Fetched {} announcement(s) from notifications", out.len());
        Ok(out)
    }

    fn from_page(&self, page: &Page) -> Vec<AnnouncementRecord> {
        let records: Vec<AnnouncementRecord> = extract::search_page(&page.html)
            .into_iter()
            .map(|hit| AnnouncementRecord::compose(&hit.title, &hit.content, None))
            .collect();
        tracing::info!("Found {} announcement(s) on page", records.len());
        records
    }
}

#[async_trait]
impl Collector for PortalCollector {
    async fn fetch(&self) -> Result<Vec<AnnouncementRecord>, CollectorError> {
        tracing::info!("Fetching portal {}", self.portal_url);
        let mut page = self.get_page(self.portal_url.clone()).await?;

        if extract::has_bullhorn(&page.html) {
            tracing::info!("Already logged in");
        } else {
            tracing::info!("Attempting automatic login...");
            match self.login(&page).await {
                Ok(Some(p)) => {
                    tracing::info!("Login successful");
                    page = p;
                }
                Ok(None) => tracing::warn!("Login attempt failed"),
                Err(e) => tracing::warn!("Login error: {e}"),
            }
        }

        let records = match self.from_alerts().await {
            Ok(r) => r,
            Err(e) if self.allow_page_search => {
                tracing::warn!("Notifications feed error: {e}");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        if !records.is_empty() {
            return Ok(records);
        }

        if self.allow_page_search {
            tracing::info!("No panel notifications found, falling back to page search");
            return Ok(self.from_page(&page));
        }
        tracing::info!("No notifications in panel and page search disabled, skipping");
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "sakai-portal"
    }
}
