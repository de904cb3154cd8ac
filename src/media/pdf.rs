//! Minimal PDF writer and metadata reader.
//!
//! The writer emits uncompressed PDF 1.4 with the standard Helvetica fonts,
//! one title line and word-wrapped body text on US Letter pages.

use regex::bytes::Regex;
use std::sync::LazyLock;

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN_X: u32 = 50;
const TITLE_Y: u32 = 750;
const BODY_TOP: u32 = 700;
const FIRST_LINE_NEXT_PAGE: u32 = 750;
const BOTTOM: u32 = 50;
const LINE_HEIGHT: u32 = 20;
const WRAP_COLUMNS: usize = 90;

/// Render a document with a bold title and body lines.
pub fn render(title: &str, body: &str) -> Vec<u8> {
    let lines: Vec<String> = body.lines().flat_map(|line| wrap(line, WRAP_COLUMNS)).collect();

    // Lay lines out page by page.
    let mut pages: Vec<String> = Vec::new();
    let mut current = format!(
        "BT /F2 16 Tf {MARGIN_X} {TITLE_Y} Td ({}) Tj ET\n",
        escape_text(title)
    );
    let mut y = BODY_TOP;
    for line in &lines {
        if y < BOTTOM {
            pages.push(std::mem::take(&mut current));
            y = FIRST_LINE_NEXT_PAGE;
        }
        current.push_str(&format!(
            "BT /F1 12 Tf {MARGIN_X} {y} Td ({}) Tj ET\n",
            escape_text(line)
        ));
        y -= LINE_HEIGHT;
    }
    pages.push(current);

    // Object numbering: 1 catalog, 2 pages, 3 regular font, 4 bold font, 5 info,
    // then a (page, content) pair per page.
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 6 + i * 2).collect();
    let mut objects: Vec<Vec<u8>> = Vec::new();
    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
    objects.push(format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), pages.len()).into_bytes());
    objects.push(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_vec());
    objects.push(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>".to_vec());
    objects.push(format!("<< /Title ({}) /Producer (atlas-relay) >>", escape_text(title)).into_bytes());
    for (i, content) in pages.iter().enumerate() {
        let content_id = page_ids[i] + 1;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {content_id} 0 R >>"
            )
            .into_bytes(),
        );
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content.as_bytes());
        stream.extend_from_slice(b"endstream");
        objects.push(stream);
    }

    let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }
    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

/// Escape a string for a PDF literal. Characters outside Latin-1 become '?'.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\t' => out.push(' '),
            c if (c as u32) < 0x20 => {}
            c if (c as u32) < 0x80 => out.push(c),
            c if (c as u32) <= 0xFF => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

fn wrap(line: &str, columns: usize) -> Vec<String> {
    if line.chars().count() <= columns {
        return vec![line.to_string()];
    }
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let needed = current.chars().count() + word.chars().count() + usize::from(!current.is_empty());
        if needed > columns && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Facts read from an existing PDF.
#[derive(Debug, Default, PartialEq)]
pub struct PdfInfo {
    pub version: Option<String>,
    pub pages: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub encrypted: bool,
}

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^%PDF-(\d\.\d)").expect("valid regex"));
static PAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/Type\s*/Page(?-u:\b)").expect("valid regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/Title\s*\(((?:[^()\\]|\\.)*)\)").expect("valid regex"));
static AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/Author\s*\(((?:[^()\\]|\\.)*)\)").expect("valid regex"));

/// Inspect a PDF without a full parser. Object streams are not decoded,
/// so metadata hidden in compressed streams is reported as absent.
pub fn inspect(data: &[u8]) -> Option<PdfInfo> {
    let version = VERSION_RE
        .captures(data)
        .map(|c| String::from_utf8_lossy(&c[1]).into_owned());
    version.as_ref()?;

    let literal = |re: &Regex| {
        re.captures(data)
            .map(|c| unescape_literal(&c[1]))
            .filter(|s| !s.trim().is_empty())
    };

    Some(PdfInfo {
        version,
        pages: PAGE_RE.find_iter(data).count(),
        title: literal(&TITLE_RE),
        author: literal(&AUTHOR_RE),
        encrypted: data.windows(8).any(|w| w == b"/Encrypt"),
    })
}

fn unescape_literal(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter().copied();
    while let Some(b) = bytes.next() {
        if b == b'\\' {
            match bytes.next() {
                Some(b'n') => out.push(b'\n'),
                Some(b't') => out.push(b'\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(b);
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
