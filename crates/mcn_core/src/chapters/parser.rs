//! Chapter XML parsing and serialization.
//!
//! Handles Matroska chapter XML format (as used by mkvextract/mkvpropedit).

use super::types::{parse_timestamp_ns, Chapter, ChapterError, ChapterResult};

/// Language written for every chapter display.
const DEFAULT_LANGUAGE: &str = "und";

/// Parse chapter XML string into an ordered chapter list.
///
/// Handles the Matroska chapter XML format:
/// ```xml
/// <?xml version="1.0"?>
/// <Chapters>
///   <EditionEntry>
///     <ChapterAtom>
///       <ChapterUID>1234</ChapterUID>
///       <ChapterTimeStart>00:00:00.000000000</ChapterTimeStart>
///       <ChapterTimeEnd>00:05:00.000000000</ChapterTimeEnd>
///       <ChapterDisplay>
///         <ChapterString>Chapter 1</ChapterString>
///         <ChapterLanguage>eng</ChapterLanguage>
///       </ChapterDisplay>
///     </ChapterAtom>
///   </EditionEntry>
/// </Chapters>
/// ```
///
/// Only the first edition is read. Atoms keep their document order; the
/// source is trusted to be sorted and non-overlapping.
pub fn parse_chapter_xml(xml: &str) -> ChapterResult<Vec<Chapter>> {
    // mkvextract emits a DOCTYPE line, which roxmltree rejects by default.
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = roxmltree::Document::parse_with_options(xml, options)
        .map_err(|e| ChapterError::MalformedXml(format!("XML parse error: {}", e)))?;

    let root = doc.root_element();
    if root.tag_name().name() != "Chapters" {
        return Err(ChapterError::MalformedXml(
            "Root element must be <Chapters>".to_string(),
        ));
    }

    let mut chapters = Vec::new();

    if let Some(edition) = root
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "EditionEntry")
    {
        for atom in edition
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "ChapterAtom")
        {
            if let Some(chapter) = parse_chapter_atom(&atom) {
                chapters.push(chapter);
            }
        }
    }

    Ok(chapters)
}

/// Parse a single ChapterAtom element.
fn parse_chapter_atom(atom: &roxmltree::Node) -> Option<Chapter> {
    let mut start_ns: Option<u64> = None;
    let mut end_ns: Option<u64> = None;
    let mut uid = String::new();
    let mut title: Option<String> = None;

    for child in atom.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "ChapterTimeStart" => {
                if let Some(text) = child.text() {
                    start_ns = parse_timestamp_ns(text.trim());
                }
            }
            "ChapterTimeEnd" => {
                if let Some(text) = child.text() {
                    end_ns = parse_timestamp_ns(text.trim());
                }
            }
            "ChapterUID" => {
                if let Some(text) = child.text() {
                    uid = text.trim().to_string();
                }
            }
            "ChapterDisplay" if title.is_none() => {
                title = child
                    .children()
                    .find(|n| n.is_element() && n.tag_name().name() == "ChapterString")
                    .map(|n| n.text().unwrap_or_default().to_string());
            }
            _ => {}
        }
    }

    // ChapterTimeStart is required
    let start_ns = start_ns?;

    Some(Chapter {
        uid,
        start_ns,
        end_ns,
        title: title.unwrap_or_default(),
    })
}

/// Serialize chapters to Matroska XML format.
pub fn serialize_chapter_xml(chapters: &[Chapter]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<!DOCTYPE Chapters SYSTEM \"matroskachapters.dtd\">\n");
    xml.push_str("<Chapters>\n");
    xml.push_str("  <EditionEntry>\n");

    for chapter in chapters {
        xml.push_str("    <ChapterAtom>\n");

        if !chapter.uid.is_empty() {
            xml.push_str(&format!(
                "      <ChapterUID>{}</ChapterUID>\n",
                escape_xml(&chapter.uid)
            ));
        }

        xml.push_str(&format!(
            "      <ChapterTimeStart>{}</ChapterTimeStart>\n",
            chapter.format_start_time()
        ));
        if let Some(end) = chapter.format_end_time() {
            xml.push_str(&format!("      <ChapterTimeEnd>{}</ChapterTimeEnd>\n", end));
        }

        xml.push_str("      <ChapterDisplay>\n");
        xml.push_str(&format!(
            "        <ChapterString>{}</ChapterString>\n",
            escape_xml(&chapter.title)
        ));
        xml.push_str(&format!(
            "        <ChapterLanguage>{}</ChapterLanguage>\n",
            DEFAULT_LANGUAGE
        ));
        xml.push_str("      </ChapterDisplay>\n");

        xml.push_str("    </ChapterAtom>\n");
    }

    xml.push_str("  </EditionEntry>\n");
    xml.push_str("</Chapters>\n");

    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
