//! Plain lyrics text out of a song page.
//!
//! Two page layouts are understood:
//! - current: one or more `[data-lyrics-container]` blocks
//! - legacy: a single `.lyrics` block

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};

static PRIMARY: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[data-lyrics-container], [class^="Lyrics__Container"]"#).unwrap()
});

static LEGACY: Lazy<Selector> = Lazy::new(|| Selector::parse(".lyrics").unwrap());

/// UI chrome that sits next to the lyric text: "Contributors", "12 Translations", "Lyrics".
static NOISE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:\d+\s+)?(?:contributors?|translations?|avatars?)|lyrics)$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Primary,
    Legacy,
}

/// Extract lyrics text, or `None` when the page has no usable lyrics.
pub fn extract(html: &str) -> Option<String> {
    extract_with_layout(html).map(|(text, _)| text)
}

/// Like [`extract`], also reporting which layout matched.
pub fn extract_with_layout(html: &str) -> Option<(String, Layout)> {
    let doc = Html::parse_document(html);

    let mut raw = String::new();
    for container in doc.select(&PRIMARY) {
        collect_text(container, true, &mut raw);
        raw.push('\n');
    }
    if let Some(text) = clean_lines(&raw) {
        return Some((text, Layout::Primary));
    }

    let legacy = doc.select(&LEGACY).next()?;
    let mut raw = String::new();
    collect_text(legacy, false, &mut raw);
    clean_lines(&raw).map(|text| (text, Layout::Legacy))
}

/// Header widgets, buttons and scripts nested in a container.
fn is_chrome(e: &Element) -> bool {
    e.attr("data-exclude-from-selection").is_some()
        || matches!(
            e.name(),
            "button" | "script" | "style" | "svg" | "noscript" | "iframe" | "form"
        )
}

fn is_block(name: &str) -> bool {
    matches!(name, "div" | "p" | "section" | "li" | "h1" | "h2" | "h3")
}

/// Text of `el` with `<br>` and block boundaries turned into newlines.
fn collect_text(el: ElementRef<'_>, skip_chrome: bool, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => {
                if e.name() == "br" {
                    out.push('\n');
                    continue;
                }
                if skip_chrome && is_chrome(e) {
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = is_block(e.name());
                if block {
                    out.push('\n');
                }
                collect_text(child_el, skip_chrome, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Trim lines, drop blanks and chrome lines, rejoin. `None` if nothing survives.
fn clean_lines(raw: &str) -> Option<String> {
    let text = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !NOISE_LINE.is_match(l))
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_layout_multiple_containers() {
        let html = r#"<html><body>
            <div data-lyrics-container="true">[Intro]<br>Yeah, they wishin' and wishin'<br><a href="/1"><span>And wishin' and wishin'</span></a></div>
            <div class="ad">Advertisement</div>
            <div data-lyrics-container="true">God's plan, God's plan<br/>I hold back, sometimes I won't</div>
        </body></html>"#;

        let (text, layout) = extract_with_layout(html).unwrap();
        assert_eq!(layout, Layout::Primary);
        assert_eq!(
            text,
            "[Intro]\nYeah, they wishin' and wishin'\nAnd wishin' and wishin'\nGod's plan, God's plan\nI hold back, sometimes I won't"
        );
    }

    #[test]
    fn test_chrome_elements_skipped() {
        let html = r#"<div data-lyrics-container="true">
            <div data-exclude-from-selection="true"><span>42 Contributors</span><button>Translations</button><span>Talk Lyrics</span></div>
            First line<br>Second line
        </div>"#;
        assert_eq!(extract(html).unwrap(), "First line\nSecond line");
    }

    #[test]
    fn test_noise_lines_dropped_neighbours_kept() {
        let html = r#"<div data-lyrics-container="true">Contributors<br>Hold on, we're going home<br>Translations<br>  I got my eyes on you  <br>Lyrics<br>Avatars</div>"#;
        assert_eq!(
            extract(html).unwrap(),
            "Hold on, we're going home\nI got my eyes on you"
        );
    }

    #[test]
    fn test_lyric_line_mentioning_lyrics_is_kept() {
        let html = r#"<div data-lyrics-container="true">Write these lyrics down<br>Translations of my heart</div>"#;
        assert_eq!(
            extract(html).unwrap(),
            "Write these lyrics down\nTranslations of my heart"
        );
    }

    #[test]
    fn test_class_prefixed_container() {
        let html = r#"<div class="Lyrics__Container-sc-1ynbvzw-1 kUgSbL">Line A<br>Line B</div>"#;
        assert_eq!(extract(html).unwrap(), "Line A\nLine B");
    }

    #[test]
    fn test_legacy_layout_fallback() {
        let html = r#"<div class="lyrics"><p>Old line one<br>Old line two
Old line three</p></div>"#;
        let (text, layout) = extract_with_layout(html).unwrap();
        assert_eq!(layout, Layout::Legacy);
        assert_eq!(text, "Old line one\nOld line two\nOld line three");
    }

    #[test]
    fn test_primary_with_only_noise_falls_back_to_legacy() {
        let html = r#"<div data-lyrics-container="true">Contributors</div><div class="lyrics">Real text</div>"#;
        assert_eq!(extract_with_layout(html), Some(("Real text".to_string(), Layout::Legacy)));
    }

    #[test]
    fn test_entities_decoded() {
        let html = r#"<div data-lyrics-container="true">Rock &amp; roll &quot;forever&quot;</div>"#;
        assert_eq!(extract(html).unwrap(), "Rock & roll \"forever\"");
    }

    #[test]
    fn test_no_container_returns_none() {
        assert_eq!(extract("<html><body><p>Nothing here</p></body></html>"), None);
        assert_eq!(extract(""), None);
        assert_eq!(extract("<<<not really html"), None);
        assert_eq!(extract(r#"<div data-lyrics-container="true">   </div>"#), None);
    }
}
