// src/collect/extract.rs
//! Text heuristics for Sakai pages: panel titles, detail pages, login forms
//! and the page-search fallback. Everything here works on plain strings so it
//! can be tested without a portal.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{node::Node, ElementRef, Html, Selector};

/// Detail-page body cap, before the message is composed.
pub const DETAIL_MAX_CHARS: usize = 1500;
/// Page search never returns more than this many hits.
pub const MAX_PAGE_HITS: usize = 20;
const PAGE_SCAN_LIMIT: usize = 100;
const MAX_ATTACHMENTS: usize = 5;

const ANNOUNCEMENT_KEYWORDS: [&str; 5] = ["duyuru", "announcement", "notice", "yeni", "eklendi"];
const PAGE_KEYWORDS: [&str; 5] = ["duyuru", "announcement", "başlık", "title", "subject"];
const MENU_ITEMS: [&str; 7] = [
    "takvim",
    "kaynaklar",
    "ayarlar",
    "profil",
    "ders listesi",
    "ana sayfa",
    "temizle",
];

const TITLE_SELECTORS: [&str; 5] = ["h1", "h2", ".announcementTitle", ".portletTitle", ".title"];
const CONTENT_SELECTORS: [&str; 8] = [
    ".announcementBody",
    ".announcement-content",
    ".msgBody",
    "#main",
    ".portletBody",
    ".sakai-content",
    ".content",
    "article",
];
const HEADING_SELECTORS: [&str; 7] = ["h1", "h2", "h3", "h4", "h5", "strong", "b"];

const MESSAGE_LABEL: &str = "Mesaj";
const ATTACHMENT_LABELS: [&str; 4] = ["Ekler", "Dosyalar", "Attachments", "Eklentiler"];
const ATTACHMENT_NOISE: [&str; 3] = ["ekleyen", "tarih", "düzenleme"];
const METADATA_PREFIXES: [&str; 5] = ["Ekleyen", "Düzenlenme", "Gruplar", "Ekler", "Dosyalar"];

const USER_FIELDS: [&str; 3] = ["eid", "username", "j_username"];
const PASS_FIELDS: [&str; 3] = ["pw", "password", "j_password"];

static RE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]*)""#).unwrap());

fn selector(s: &str) -> Option<Selector> {
    Selector::parse(s).ok()
}

/// Panel entries read like `Instructor "Course"'de "Title" duyurusu eklendi`.
/// When at least two strings are quoted, the last one is the announcement title.
pub fn extract_quoted_title(text: &str) -> Option<String> {
    if !text.contains('"') || !text.to_lowercase().contains("eklendi") {
        return None;
    }
    let quoted: Vec<&str> = RE_QUOTED
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if quoted.len() >= 2 {
        quoted.last().map(|s| s.to_string())
    } else {
        None
    }
}

pub fn is_menu_item(title: &str) -> bool {
    let lower = title.to_lowercase();
    MENU_ITEMS.iter().any(|m| lower.contains(m))
}

/// Announcement links point at the announcement tool; otherwise fall back to keywords.
pub fn looks_like_announcement(href: Option<&str>, text: &str) -> bool {
    let by_href = href.is_some_and(|h| h.contains("/announcement") || h.contains("directtool"));
    let lower = text.to_lowercase();
    by_href || ANNOUNCEMENT_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Logged-in portal pages carry the notification bell.
pub fn has_bullhorn(html: &str) -> bool {
    let doc = Html::parse_document(html);
    selector("#Mrphs-bullhorn").is_some_and(|s| doc.select(&s).next().is_some())
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "br"
            | "li"
            | "ul"
            | "ol"
            | "tr"
            | "table"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "dt"
            | "dd"
            | "label"
            | "form"
    )
}

fn walk(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => {
                let name = e.name();
                if matches!(name, "script" | "style" | "noscript" | "head") {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    let block = is_block(name);
                    if block {
                        out.push('\n');
                    }
                    walk(child_el, out);
                    if block {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }
}

/// Rendered text of an element, one visual line per entry, whitespace collapsed.
pub fn text_lines(el: ElementRef<'_>) -> Vec<String> {
    let mut raw = String::new();
    walk(el, &mut raw);
    raw.lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect()
}

fn cap(mut s: String) -> String {
    if s.chars().count() > DETAIL_MAX_CHARS {
        s = s.chars().take(DETAIL_MAX_CHARS).collect();
        s.push_str("...");
    }
    s
}

/// What a detail page contributes to a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailPage {
    pub title: String,
    pub content: String,
    pub attachments: Vec<String>,
}

/// Split rendered lines into the message body (after `Mesaj`) and the
/// attachment list (after an attachment label).
fn split_sections(lines: &[String]) -> (Vec<String>, Vec<String>) {
    let mut message = Vec::new();
    let mut attachments = Vec::new();
    let mut in_message = false;
    let mut in_attachments = false;

    for line in lines {
        let line = line.trim();
        if line == MESSAGE_LABEL {
            in_message = true;
            in_attachments = false;
            continue;
        }
        if ATTACHMENT_LABELS.contains(&line) {
            in_attachments = true;
            in_message = false;
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if in_message {
            message.push(line.to_string());
        }
        if in_attachments {
            let lower = line.to_lowercase();
            if !ATTACHMENT_NOISE.iter().any(|n| lower.contains(n)) {
                attachments.push(line.to_string());
            }
        }
    }
    (message, attachments)
}

fn without_metadata(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !METADATA_PREFIXES.iter().any(|m| l.starts_with(m)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn first_match_text(doc: &Html, selectors: &[&str], min_chars: usize) -> Option<Vec<String>> {
    for s in selectors {
        let Some(sel) = selector(s) else { continue };
        if let Some(el) = doc.select(&sel).next() {
            let lines = text_lines(el);
            if lines.join("\n").chars().count() > min_chars {
                return Some(lines);
            }
        }
    }
    None
}

/// Pull title, message body and attachments out of an announcement page.
pub fn extract_detail(html: &str) -> DetailPage {
    let doc = Html::parse_document(html);
    let mut page = DetailPage::default();

    if let Some(lines) = first_match_text(&doc, &TITLE_SELECTORS, 3) {
        page.title = lines.join(" ");
    }

    if let Some(lines) = first_match_text(&doc, &CONTENT_SELECTORS, 20) {
        let (message, attachments) = split_sections(&lines);
        page.attachments = attachments;
        page.content = if message.is_empty() {
            tracing::debug!("no message label on detail page, filtering metadata instead");
            without_metadata(&lines)
        } else {
            message.join("\n")
        };
        page.content = cap(page.content);
    }

    if page.content.chars().count() < 10 {
        tracing::debug!("falling back to full body text");
        if let Some(body) = selector("body").and_then(|s| doc.select(&s).next()) {
            let lines = text_lines(body);
            let mut message = Vec::new();
            let mut in_message = false;
            for line in &lines {
                if line == MESSAGE_LABEL {
                    in_message = true;
                    continue;
                }
                if ATTACHMENT_LABELS.contains(&line.as_str()) {
                    break;
                }
                if in_message {
                    message.push(line.clone());
                }
            }
            page.content = if message.is_empty() {
                without_metadata(&lines)
            } else {
                message.join("\n")
            };
            page.content = cap(page.content);
        }
    }

    if page.attachments.is_empty() {
        page.attachments = attachment_links(&doc);
    }

    page
}

/// Links next to an `Ekler`/`Dosyalar` label, rendered as `text (url)`.
fn attachment_links(doc: &Html) -> Vec<String> {
    let (Some(all), Some(links)) = (selector("*"), selector("a[href]")) else {
        return Vec::new();
    };
    let labelled = doc.select(&all).find(|el| {
        el.children().any(|c| match c.value() {
            Node::Text(t) => t.contains("Ekler") || t.contains("Dosyalar"),
            _ => false,
        })
    });
    let Some(container) = labelled.and_then(|el| el.parent()).and_then(ElementRef::wrap) else {
        return Vec::new();
    };
    container
        .select(&links)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let text = text_lines(a).join(" ");
            (!text.is_empty()).then(|| format!("{text} ({href})"))
        })
        .collect()
}

/// Notification text: optional page title, body, then up to five attachments.
pub fn compose_message(page_title: &str, content: &str, attachments: &[String]) -> String {
    let mut out = String::new();
    if !page_title.is_empty() {
        out.push_str(&format!("📌 {page_title}\n\n"));
    }
    out.push_str(content);

    let listed: Vec<&str> = attachments
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .take(MAX_ATTACHMENTS)
        .collect();
    if !listed.is_empty() {
        out.push_str(&format!("\n\n📎 Ekler ({}):\n", attachments.len()));
        for (i, att) in listed.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, att));
        }
        out.truncate(out.trim_end().len());
    }
    out
}

/// Credentials form found on a login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub action: Option<String>,
    pub user_field: String,
    pub pass_field: String,
    /// Hidden inputs and named submit buttons, posted back unchanged.
    pub extra: Vec<(String, String)>,
}

fn named_input(form: ElementRef<'_>, candidates: &[&str]) -> Option<String> {
    for c in candidates {
        for pattern in [format!(r#"input[name="{c}"]"#), format!(r#"input[id="{c}"][name]"#)] {
            let Some(sel) = selector(&pattern) else { continue };
            if let Some(name) = form.select(&sel).next().and_then(|i| i.value().attr("name")) {
                return Some(name.to_string());
            }
        }
    }
    None
}

pub fn find_login_form(html: &str) -> Option<LoginForm> {
    let doc = Html::parse_document(html);
    let forms = selector("form")?;
    let extras = selector(r#"input[type="hidden"][name], input[type="submit"][name]"#)?;

    doc.select(&forms).find_map(|form| {
        let user_field = named_input(form, &USER_FIELDS)?;
        let pass_field = named_input(form, &PASS_FIELDS)?;
        let extra = form
            .select(&extras)
            .filter_map(|i| {
                let name = i.value().attr("name")?;
                Some((name.to_string(), i.value().attr("value").unwrap_or("").to_string()))
            })
            .collect();
        Some(LoginForm {
            action: form.value().attr("action").map(str::to_string),
            user_field,
            pass_field,
            extra,
        })
    })
}

/// `src` of every iframe; some portals embed the login form in one.
pub fn iframe_sources(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Some(sel) = selector("iframe[src]") else {
        return Vec::new();
    };
    doc.select(&sel)
        .filter_map(|f| f.value().attr("src").map(str::to_string))
        .collect()
}

/// A candidate found by scanning a whole page. Carries no link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHit {
    pub title: String,
    pub content: String,
}

/// Keyword scan over the first elements of a page. Prone to false positives
/// (menus, course lists), hence opt-in.
pub fn search_page(html: &str) -> Vec<PageHit> {
    let doc = Html::parse_document(html);
    let Some(blocks) = selector("div, li, article") else {
        return Vec::new();
    };

    let candidates: Vec<ElementRef<'_>> = doc
        .select(&blocks)
        .take(PAGE_SCAN_LIMIT)
        .filter(|el| {
            let text = text_lines(*el).join("\n").to_lowercase();
            text.chars().count() > 10 && PAGE_KEYWORDS.iter().any(|k| text.contains(k))
        })
        .collect();
    tracing::info!("Found {} potential announcement element(s)", candidates.len());

    let mut hits = Vec::new();
    for el in candidates.into_iter().take(MAX_PAGE_HITS) {
        let lines = text_lines(el);
        if lines.join("\n").chars().count() < 5 {
            continue;
        }
        let heading = HEADING_SELECTORS.iter().find_map(|s| {
            let sel = selector(s)?;
            el.select(&sel)
                .map(|h| text_lines(h).join(" "))
                .find(|t| !t.is_empty())
        });
        let title = heading.unwrap_or_else(|| lines[0].clone());
        hits.push(PageHit {
            title,
            content: lines[1..].join("\n"),
        });
    }
    hits
}
