//! Emoji segmentation and image substitution.
//!
//! Splits text into plain runs and emoji clusters, then swaps each cluster
//! for an `<img>` that points into a versioned emoji image set. Icon ids
//! follow the asset set's naming: lowercase hex code points joined by `-`,
//! with U+FE0F dropped unless the cluster is a ZWJ sequence.

use crate::text::{escape_html, KEYCAP, VS16};
use std::fmt::Write as _;

const ZWJ: char = '\u{200D}';
const VS15: char = '\u{FE0E}';
const TAG_CANCEL: char = '\u{E007F}';

/// A piece of input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Emoji(&'a str),
}

fn is_regional_indicator(ch: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&ch)
}

fn is_skin_tone(ch: char) -> bool {
    ('\u{1F3FB}'..='\u{1F3FF}').contains(&ch)
}

fn is_tag(ch: char) -> bool {
    ('\u{E0020}'..='\u{E007F}').contains(&ch)
}

fn is_keycap_base(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '#' || ch == '*'
}

/// Code points with the Unicode `Emoji` property, minus the keycap bases
/// and regional indicators handled separately. Neighbouring dingbats and
/// stars (★ ✓ ❶ ☐) are plain text and stay out of this table.
fn is_pictograph(ch: char) -> bool {
    matches!(ch as u32,
        0x00A9 | 0x00AE | 0x203C | 0x2049 | 0x2122 | 0x2139
        | 0x2194..=0x2199 | 0x21A9..=0x21AA
        | 0x231A..=0x231B | 0x2328 | 0x23CF | 0x23E9..=0x23F3 | 0x23F8..=0x23FA
        | 0x24C2 | 0x25AA..=0x25AB | 0x25B6 | 0x25C0 | 0x25FB..=0x25FE
        | 0x2600..=0x2604 | 0x260E | 0x2611 | 0x2614..=0x2615 | 0x2618 | 0x261D
        | 0x2620 | 0x2622..=0x2623 | 0x2626 | 0x262A | 0x262E..=0x262F
        | 0x2638..=0x263A | 0x2640 | 0x2642 | 0x2648..=0x2653 | 0x265F..=0x2660
        | 0x2663 | 0x2665..=0x2666 | 0x2668 | 0x267B | 0x267E..=0x267F
        | 0x2692..=0x2697 | 0x2699 | 0x269B..=0x269C | 0x26A0..=0x26A1 | 0x26A7
        | 0x26AA..=0x26AB | 0x26B0..=0x26B1 | 0x26BD..=0x26BE | 0x26C4..=0x26C5
        | 0x26C8 | 0x26CE..=0x26CF | 0x26D1 | 0x26D3..=0x26D4 | 0x26E9..=0x26EA
        | 0x26F0..=0x26F5 | 0x26F7..=0x26FA | 0x26FD
        | 0x2702 | 0x2705 | 0x2708..=0x270D | 0x270F | 0x2712 | 0x2714 | 0x2716
        | 0x271D | 0x2721 | 0x2728 | 0x2733..=0x2734 | 0x2744 | 0x2747 | 0x274C
        | 0x274E | 0x2753..=0x2755 | 0x2757 | 0x2763..=0x2764 | 0x2795..=0x2797
        | 0x27A1 | 0x27B0 | 0x27BF
        | 0x2934..=0x2935 | 0x2B05..=0x2B07 | 0x2B1B..=0x2B1C | 0x2B50 | 0x2B55
        | 0x3030 | 0x303D | 0x3297 | 0x3299
        | 0x1F004 | 0x1F0CF | 0x1F170..=0x1F171 | 0x1F17E..=0x1F17F | 0x1F18E
        | 0x1F191..=0x1F19A | 0x1F201..=0x1F202 | 0x1F21A | 0x1F22F
        | 0x1F232..=0x1F23A | 0x1F250..=0x1F251
        | 0x1F300..=0x1F321 | 0x1F324..=0x1F393 | 0x1F396..=0x1F397
        | 0x1F399..=0x1F39B | 0x1F39E..=0x1F3F0 | 0x1F3F3..=0x1F3F5
        | 0x1F3F7..=0x1F4FD | 0x1F4FF..=0x1F53D | 0x1F549..=0x1F54E
        | 0x1F550..=0x1F567 | 0x1F56F..=0x1F570 | 0x1F573..=0x1F57A | 0x1F587
        | 0x1F58A..=0x1F58D | 0x1F590 | 0x1F595..=0x1F596 | 0x1F5A4..=0x1F5A5
        | 0x1F5A8 | 0x1F5B1..=0x1F5B2 | 0x1F5BC | 0x1F5C2..=0x1F5C4
        | 0x1F5D1..=0x1F5D3 | 0x1F5DC..=0x1F5DE | 0x1F5E1 | 0x1F5E3 | 0x1F5E8
        | 0x1F5EF | 0x1F5F3 | 0x1F5FA..=0x1F64F
        | 0x1F680..=0x1F6C5 | 0x1F6CB..=0x1F6D2 | 0x1F6D5..=0x1F6D7
        | 0x1F6DC..=0x1F6E5 | 0x1F6E9 | 0x1F6EB..=0x1F6EC | 0x1F6F0
        | 0x1F6F3..=0x1F6FC | 0x1F7E0..=0x1F7EB | 0x1F7F0
        | 0x1F90C..=0x1F93A | 0x1F93C..=0x1F945 | 0x1F947..=0x1F9FF
        | 0x1FA70..=0x1FA7C | 0x1FA80..=0x1FA88 | 0x1FA90..=0x1FABD
        | 0x1FABF..=0x1FAC5 | 0x1FACE..=0x1FADB | 0x1FAE0..=0x1FAE8
        | 0x1FAF0..=0x1FAF8)
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

/// Consume one emoji element starting at `first`; returns `false` when `first`
/// does not start one (the iterator is then left where it was).
fn take_element(first: char, chars: &mut Chars<'_>) -> bool {
    if is_keycap_base(first) {
        let mut probe = chars.clone();
        if probe.peek().map(|(_, c)| *c) == Some(VS16) {
            probe.next();
        }
        if probe.peek().map(|(_, c)| *c) == Some(KEYCAP) {
            probe.next();
            *chars = probe;
            return true;
        }
        return false;
    }

    if is_regional_indicator(first) {
        if let Some((_, next)) = chars.peek().copied() {
            if is_regional_indicator(next) {
                chars.next();
            }
        }
        return true;
    }

    if !is_pictograph(first) && !is_skin_tone(first) {
        return false;
    }
    if chars.peek().map(|(_, c)| *c) == Some(VS15) {
        return false;
    }
    if chars.peek().map(|(_, c)| *c) == Some(VS16) {
        chars.next();
    }
    if let Some((_, next)) = chars.peek().copied() {
        if is_skin_tone(next) {
            chars.next();
        }
    }
    while let Some((_, next)) = chars.peek().copied() {
        if !is_tag(next) {
            break;
        }
        chars.next();
        if next == TAG_CANCEL {
            break;
        }
    }
    true
}

/// Split `text` into plain runs and emoji clusters, in order.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut chars: Chars<'_> = text.char_indices().peekable();
    let mut text_start = 0;

    while let Some((start, ch)) = chars.next() {
        if !take_element(ch, &mut chars) {
            continue;
        }
        // ZWJ chains: element (ZWJ element)*
        loop {
            let mut probe = chars.clone();
            match probe.next() {
                Some((_, ZWJ)) => {}
                _ => break,
            }
            match probe.next() {
                Some((_, joined)) if take_element(joined, &mut probe) => chars = probe,
                _ => break,
            }
        }
        let end = chars.peek().map(|(idx, _)| *idx).unwrap_or(text.len());
        if text_start < start {
            out.push(Segment::Text(&text[text_start..start]));
        }
        out.push(Segment::Emoji(&text[start..end]));
        text_start = end;
    }
    if text_start < text.len() {
        out.push(Segment::Text(&text[text_start..]));
    }
    out
}

/// Asset file id for an emoji cluster (`1f600`, `31-20e3`, `1f469-200d-1f4bb`).
pub fn icon_id(cluster: &str) -> String {
    let keep_selector = cluster.contains(ZWJ);
    let mut id = String::new();
    for ch in cluster.chars() {
        if ch == VS16 && !keep_selector {
            continue;
        }
        if !id.is_empty() {
            id.push('-');
        }
        let _ = write!(id, "{:x}", ch as u32);
    }
    id
}

/// Where emoji images come from and how the `<img>` tags look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSet {
    pub base: String,
    pub folder: String,
    pub ext: String,
    /// Extra attributes appended to every image tag.
    pub attributes: Vec<(String, String)>,
}

impl ImageSet {
    /// Scalable images for HTML snapshots, sized by the page stylesheet.
    pub fn svg(base: &str) -> Self {
        Self {
            base: base.to_string(),
            folder: "svg".to_string(),
            ext: ".svg".to_string(),
            attributes: Vec::new(),
        }
    }

    /// Fixed-size bitmaps for PDF capture; carry their own inline sizing.
    pub fn raster(base: &str) -> Self {
        Self {
            base: base.to_string(),
            folder: "72x72".to_string(),
            ext: ".png".to_string(),
            attributes: vec![
                ("crossorigin".to_string(), "anonymous".to_string()),
                (
                    "style".to_string(),
                    "height: 1.2em; width: 1.2em; margin: 0 0.05em; vertical-align: -0.2em;"
                        .to_string(),
                ),
            ],
        }
    }

    /// Full URL of the image for `cluster`.
    pub fn url_for(&self, cluster: &str) -> String {
        format!("{}{}/{}{}", self.base, self.folder, icon_id(cluster), self.ext)
    }
}

/// Markup produced by [`replace_with_images`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub html: String,
    /// Distinct image URLs in first-seen order.
    pub images: Vec<String>,
}

/// Escape `text` and replace every emoji cluster with an image reference.
pub fn replace_with_images(text: &str, set: &ImageSet) -> Substitution {
    replace_with_resolved_images(text, set, &|url| Some(url.to_string()))
}

/// Like [`replace_with_images`], but `resolve` picks the `src` for each image
/// URL. Returning `None` keeps the emoji as plain text instead of an image.
pub fn replace_with_resolved_images(
    text: &str,
    set: &ImageSet,
    resolve: &dyn Fn(&str) -> Option<String>,
) -> Substitution {
    let mut html = String::with_capacity(text.len() * 2);
    let mut images: Vec<String> = Vec::new();
    for segment in segments(text) {
        match segment {
            Segment::Text(run) => html.push_str(&escape_html(run)),
            Segment::Emoji(cluster) => {
                let url = set.url_for(cluster);
                match resolve(&url) {
                    Some(src) => {
                        let _ = write!(
                            html,
                            "<img class=\"emoji\" draggable=\"false\" alt=\"{}\" src=\"{}\"",
                            escape_html(cluster),
                            escape_html(&src)
                        );
                        for (name, value) in &set.attributes {
                            let _ = write!(html, " {}=\"{}\"", name, escape_html(value));
                        }
                        html.push('>');
                    }
                    None => html.push_str(&escape_html(cluster)),
                }
                if !images.contains(&url) {
                    images.push(url);
                }
            }
        }
    }
    Substitution { html, images }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://cdn.example/assets/";

    fn emoji_only(text: &str) -> Vec<&str> {
        segments(text)
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Emoji(cluster) => Some(cluster),
                Segment::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn segments_keep_text_and_emoji_in_order() {
        assert_eq!(
            segments("hi 😀 there"),
            vec![
                Segment::Text("hi "),
                Segment::Emoji("😀"),
                Segment::Text(" there")
            ]
        );
        assert_eq!(segments(""), Vec::<Segment<'_>>::new());
        assert_eq!(segments("plain"), vec![Segment::Text("plain")]);
    }

    #[test]
    fn keycaps_need_the_enclosing_mark() {
        assert_eq!(
            emoji_only("1\u{FE0F}\u{20E3} and 2\u{20E3}"),
            vec!["1\u{FE0F}\u{20E3}", "2\u{20E3}"]
        );
        assert!(emoji_only("2025 # *").is_empty());
    }

    #[test]
    fn multi_codepoint_clusters_stay_whole() {
        let family = "👩\u{200D}💻";
        let thumbs = "👍🏽";
        let flag = "🇨🇳";
        let scotland = "🏴\u{E0067}\u{E0062}\u{E0073}\u{E0063}\u{E0074}\u{E007F}";
        let text = format!("{family}{thumbs} {flag}{scotland}");
        assert_eq!(emoji_only(&text), vec![family, thumbs, flag, scotland]);
    }

    #[test]
    fn text_symbols_outside_the_emoji_set_stay_text() {
        let sub = replace_with_images("Rating: ★★★☆☆ ✓ ✗ ♪ ❶ ☐ done", &ImageSet::svg(BASE));
        assert!(sub.images.is_empty(), "unexpected images: {:?}", sub.images);
        assert_eq!(sub.html, "Rating: ★★★☆☆ ✓ ✗ ♪ ❶ ☐ done");

        // Emoji neighbours of those symbols still match.
        assert_eq!(
            emoji_only("\u{2600} \u{2611} \u{2714} \u{2716} \u{2B50}"),
            vec!["\u{2600}", "\u{2611}", "\u{2714}", "\u{2716}", "\u{2B50}"]
        );
    }

    #[test]
    fn text_presentation_selector_keeps_text() {
        assert!(emoji_only("\u{2764}\u{FE0E}").is_empty());
        assert_eq!(emoji_only("\u{2764}\u{FE0F}"), vec!["\u{2764}\u{FE0F}"]);
    }

    #[test]
    fn icon_ids_drop_selector_outside_zwj_sequences() {
        assert_eq!(icon_id("😀"), "1f600");
        assert_eq!(icon_id("1\u{FE0F}\u{20E3}"), "31-20e3");
        assert_eq!(icon_id("\u{2764}\u{FE0F}"), "2764");
        assert_eq!(
            icon_id("\u{1F3F3}\u{FE0F}\u{200D}\u{1F308}"),
            "1f3f3-fe0f-200d-1f308"
        );
    }

    #[test]
    fn replacement_escapes_text_and_tags_images() {
        let sub = replace_with_images("<a> 😀 & 😀", &ImageSet::svg(BASE));
        let img = "<img class=\"emoji\" draggable=\"false\" alt=\"😀\" src=\"https://cdn.example/assets/svg/1f600.svg\">";
        assert_eq!(sub.html, format!("&lt;a&gt; {img} &amp; {img}"));
        assert_eq!(sub.images, vec!["https://cdn.example/assets/svg/1f600.svg"]);
    }

    #[test]
    fn unresolved_images_fall_back_to_native_text() {
        let sub = replace_with_resolved_images("a 😀 b 🚀", &ImageSet::raster(BASE), &|url| {
            url.ends_with("1f680.png")
                .then(|| "data:image/png;base64,AAAA".to_string())
        });
        assert!(sub.html.starts_with("a 😀 b <img"));
        assert!(sub.html.contains("src=\"data:image/png;base64,AAAA\""));
        assert_eq!(sub.images.len(), 2);
    }

    #[test]
    fn raster_set_adds_capture_attributes() {
        let sub = replace_with_images("📍", &ImageSet::raster(BASE));
        assert!(sub
            .html
            .contains("src=\"https://cdn.example/assets/72x72/1f4cd.png\""));
        assert!(sub.html.contains("crossorigin=\"anonymous\""));
        assert!(sub.html.contains("style=\"height: 1.2em;"));
    }
}
