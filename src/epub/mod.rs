//! EPUB writer. Consumes the canonical `Book` and writes EPUB 2 or EPUB 3
//! (mimetype, container, OPF, nav/NCX, stylesheet, one XHTML file per
//! chapter). Chapter bodies are plain text; each non-blank line becomes a
//! paragraph.

use crate::model::{Book, Chapter};
use std::io::{Seek, Write};
use std::path::Path;
use thiserror::Error;
use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTAINER_XML: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<container version=\"1.0\" xmlns=\"urn:oasis:names:tc:opendocument:xmlns:container\">\n  <rootfiles>\n    <rootfile full-path=\"OEBPS/content.opf\" media-type=\"application/oebps-package+xml\"/>\n  </rootfiles>\n</container>";

const MIMETYPE: &[u8] = b"application/epub+zip";
const OEBPS_PREFIX: &str = "OEBPS/";

/// Serif stylesheet for the generated chapters.
const STYLESHEET: &str = r#"body {
  font-family: "SimSun", "宋体", serif;
  line-height: 1.8;
  margin: 2em;
  color: #333;
}
h1 {
  font-size: 1.8em;
  text-align: center;
  border-bottom: 2px solid #666;
  padding-bottom: 0.5em;
  margin-bottom: 1.5em;
  color: #222;
}
p {
  text-indent: 2em;
  margin-bottom: 1.2em;
  text-align: justify;
}
.chapter {
  page-break-before: always;
  margin-top: 2em;
}
"#;

/// EPUB format version.
///
/// Default is EPUB 3 (OPF 3.0, nav.xhtml, HTML5 chapters). Use `Epub2` for
/// legacy readers (OPF 2.0, NCX, XHTML 1.1 chapters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpubVersion {
    Epub3,
    Epub2,
}

/// Errors from the EPUB writer. Maps to CLI exit code 3.
#[derive(Debug, Error)]
pub enum EpubError {
    #[error("Cannot write EPUB: book title is empty.")]
    EmptyTitle,

    #[error("Cannot write EPUB: book author is empty.")]
    EmptyAuthor,

    #[error("Cannot write EPUB: book has no chapters.")]
    NoChapters,

    #[error("Failed to create EPUB file: {path}: {source}")]
    CreateFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write EPUB archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl From<std::io::Error> for EpubError {
    fn from(e: std::io::Error) -> Self {
        EpubError::Zip(zip::result::ZipError::Io(e))
    }
}

/// Result of cover handling: none, title-only (file unreadable), or image.
#[derive(Debug)]
enum CoverOutcome {
    NoCover,
    TitleOnly,
    Image { data: Vec<u8>, ext: &'static str },
}

/// Write a canonical [Book](crate::model::Book) to an EPUB file.
///
/// `cover` is an optional local image file to embed; if it cannot be read, a
/// title-only cover page is emitted and the write continues. Set
/// `epub3_include_ncx` to also emit toc.ncx in EPUB 3 for legacy readers.
pub fn write_epub(
    book: &Book,
    path: &Path,
    version: EpubVersion,
    epub3_include_ncx: bool,
    cover_path: Option<&Path>,
) -> Result<(), EpubError> {
    validate_book(book)?;

    let path = path.to_path_buf();
    let file = std::fs::File::create(&path).map_err(|e| EpubError::CreateFile {
        path: path.clone(),
        source: e,
    })?;
    let mut zip = ZipWriter::new(file);

    let options_stored = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);
    let options_deflate = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    // Mimetype first, uncompressed (required by the EPUB container spec).
    zip.start_file("mimetype", options_stored)?;
    zip.write_all(MIMETYPE)?;

    zip.start_file("META-INF/container.xml", options_deflate)?;
    zip.write_all(CONTAINER_XML)?;

    let cover = load_cover(cover_path);

    match version {
        EpubVersion::Epub3 => {
            write_opf(book, &cover, version, epub3_include_ncx, &mut zip, options_deflate)?;
            write_nav_xhtml(book, &mut zip, options_deflate)?;
            if epub3_include_ncx {
                write_ncx(book, &mut zip, options_deflate)?;
            }
        }
        EpubVersion::Epub2 => {
            write_opf(book, &cover, version, true, &mut zip, options_deflate)?;
            write_ncx(book, &mut zip, options_deflate)?;
        }
    }

    write_stylesheet(&mut zip, options_deflate)?;
    write_cover_xhtml(book, &cover, &mut zip, options_deflate)?;
    write_chapters(book, version, &mut zip, options_deflate)?;

    if let CoverOutcome::Image { data, ext } = &cover {
        let name = format!("{}images/cover.{}", OEBPS_PREFIX, ext);
        zip.start_file(name, options_deflate)?;
        zip.write_all(data)?;
    }

    zip.finish()?;
    Ok(())
}

fn validate_book(book: &Book) -> Result<(), EpubError> {
    if book.title.trim().is_empty() {
        return Err(EpubError::EmptyTitle);
    }
    if book.author.trim().is_empty() {
        return Err(EpubError::EmptyAuthor);
    }
    if book.chapters.is_empty() {
        return Err(EpubError::NoChapters);
    }
    Ok(())
}

/// Read the cover image from disk. On failure a title-only cover page is
/// still emitted when a path was configured.
fn load_cover(cover_path: Option<&Path>) -> CoverOutcome {
    let path = match cover_path {
        Some(p) => p,
        None => return CoverOutcome::NoCover,
    };
    match std::fs::read(path) {
        Ok(data) => {
            let ext = match path.extension().and_then(|e| e.to_str()) {
                Some(e) if e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg") => "jpg",
                _ => "png",
            };
            CoverOutcome::Image { data, ext }
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cover image could not be read, using title-only cover page");
            CoverOutcome::TitleOnly
        }
    }
}

fn identifier(book: &Book) -> String {
    format!("urn:txtbind:{}", book.title)
}

fn cover_media_type(ext: &str) -> &'static str {
    match ext {
        "jpg" => "image/jpeg",
        _ => "image/png",
    }
}

fn write_opf(
    book: &Book,
    cover: &CoverOutcome,
    version: EpubVersion,
    include_ncx: bool,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let id = xml_escape(&identifier(book));
    let title = xml_escape(&book.title);
    let creator = xml_escape(&book.author);

    let mut manifest = String::from(
        r#"<item id="style" href="style/styles.css" media-type="text/css"/>
"#,
    );
    if version == EpubVersion::Epub3 {
        manifest.push_str(
            r#"  <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
"#,
        );
    }
    if include_ncx {
        manifest.push_str(
            r#"  <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
"#,
        );
    }
    let has_cover_page = !matches!(cover, CoverOutcome::NoCover);
    if let CoverOutcome::Image { ext, .. } = cover {
        manifest.push_str(&format!(
            r#"  <item id="cover-img" href="images/cover.{}" media-type="{}"/>
"#,
            ext,
            cover_media_type(ext)
        ));
    }
    if has_cover_page {
        manifest.push_str(
            r#"  <item id="cover" href="cover.xhtml" media-type="application/xhtml+xml"/>
"#,
        );
    }
    for (i, _) in book.chapters.iter().enumerate() {
        manifest.push_str(&format!(
            r#"  <item id="chapter-{}" href="chapter-{}.xhtml" media-type="application/xhtml+xml"/>
"#,
            i + 1,
            i + 1
        ));
    }

    // Spine: reading order only (cover page then chapters).
    let mut spine = String::new();
    if has_cover_page {
        spine.push_str(r#"  <itemref idref="cover"/>"#);
    }
    for (i, _) in book.chapters.iter().enumerate() {
        if !spine.is_empty() {
            spine.push_str("\n  ");
        }
        spine.push_str(&format!("<itemref idref=\"chapter-{}\"/>", i + 1));
    }

    let guide = if has_cover_page {
        r#"  <reference type="cover" href="cover.xhtml" title="Cover"/>"#
    } else {
        ""
    };

    let (package_version, spine_attr) = match version {
        EpubVersion::Epub3 => ("3.0", String::new()),
        EpubVersion::Epub2 => ("2.0", r#" toc="ncx""#.to_string()),
    };

    let opf = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="book-id" version="{package_version}"
  xmlns:dc="http://purl.org/dc/elements/1.1/">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="book-id">{id}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:creator>{creator}</dc:creator>
    <dc:language>zh</dc:language>
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine{spine_attr}>
{spine}
  </spine>
  <guide>
{guide}
  </guide>
</package>
"#
    );

    zip.start_file(format!("{}content.opf", OEBPS_PREFIX), options)?;
    zip.write_all(opf.as_bytes())?;
    Ok(())
}

fn write_stylesheet(
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    zip.start_file(format!("{}style/styles.css", OEBPS_PREFIX), options)?;
    zip.write_all(STYLESHEET.as_bytes())?;
    Ok(())
}

fn write_nav_xhtml(
    book: &Book,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let mut nav_links = String::new();
    for (i, ch) in book.chapters.iter().enumerate() {
        let title = xml_escape(&ch.title);
        nav_links.push_str(&format!(
            r#"    <li><a href="chapter-{}.xhtml">{}</a></li>
"#,
            i + 1,
            title
        ));
    }
    let nav = format!(
        r#"<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
  <meta charset="UTF-8"/>
  <title>目录</title>
</head>
<body>
  <nav epub:type="toc">
    <h1>目录</h1>
    <ol>
{}
    </ol>
  </nav>
</body>
</html>
"#,
        nav_links
    );
    zip.start_file(format!("{}nav.xhtml", OEBPS_PREFIX), options)?;
    zip.write_all(nav.as_bytes())?;
    Ok(())
}

fn write_ncx(
    book: &Book,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let title = xml_escape(&book.title);
    let mut nav_points = String::new();
    for (i, ch) in book.chapters.iter().enumerate() {
        let label = xml_escape(&ch.title);
        nav_points.push_str(&format!(
            r#"    <navPoint id="navpoint-{}" playOrder="{}">
      <navLabel><text>{}</text></navLabel>
      <content src="chapter-{}.xhtml"/>
    </navPoint>
"#,
            i + 1,
            i + 1,
            label,
            i + 1
        ));
    }
    let ncx = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{}"/>
  </head>
  <docTitle>
    <text>{}</text>
  </docTitle>
  <navMap>
{}
  </navMap>
</ncx>
"#,
        xml_escape(&identifier(book)),
        title,
        nav_points
    );
    zip.start_file(format!("{}toc.ncx", OEBPS_PREFIX), options)?;
    zip.write_all(ncx.as_bytes())?;
    Ok(())
}

fn write_cover_xhtml(
    book: &Book,
    cover: &CoverOutcome,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let body = match cover {
        CoverOutcome::NoCover => return Ok(()),
        CoverOutcome::TitleOnly => {
            let title = xml_escape(&book.title);
            let author = xml_escape(&book.author);
            format!(
                r#"  <div style="text-align: center; font-family: serif; margin-top: 3em;">
    <h1 style="font-size: 1.5em;">{}</h1>
    <p style="margin-top: 1em;">{}</p>
  </div>"#,
                title, author
            )
        }
        CoverOutcome::Image { ext, .. } => format!(
            r#"  <div style="text-align: center;">
    <img src="images/cover.{}" alt="Cover" style="max-width: 100%; height: auto;"/>
  </div>"#,
            ext
        ),
    };
    let cover_xhtml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <meta charset="UTF-8"/>
  <title>Cover</title>
</head>
<body>
{}
</body>
</html>
"#,
        body
    );
    zip.start_file(format!("{}cover.xhtml", OEBPS_PREFIX), options)?;
    zip.write_all(cover_xhtml.as_bytes())?;
    Ok(())
}

/// Render a plain-text chapter body as XHTML paragraphs. Blank lines
/// separate paragraphs and produce no markup of their own.
fn render_body(chapter: &Chapter) -> String {
    let mut out = String::new();
    for line in chapter.body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        out.push_str("    <p>");
        out.push_str(&xml_escape(line));
        out.push_str("</p>\n");
    }
    out
}

fn write_chapters(
    book: &Book,
    version: EpubVersion,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let prolog = match version {
        EpubVersion::Epub3 => "<!DOCTYPE html>",
        EpubVersion::Epub2 => {
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.1//EN\" \"http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd\">"
        }
    };
    for (i, ch) in book.chapters.iter().enumerate() {
        let title = xml_escape(&ch.title);
        let paragraphs = render_body(ch);
        let html = format!(
            r#"{prolog}
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <meta charset="UTF-8"/>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="style/styles.css"/>
</head>
<body>
  <div class="chapter">
    <h1>{title}</h1>
{paragraphs}  </div>
</body>
</html>
"#
        );
        let name = format!("{}chapter-{}.xhtml", OEBPS_PREFIX, i + 1);
        zip.start_file(name, options)?;
        zip.write_all(html.as_bytes())?;
    }
    Ok(())
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
