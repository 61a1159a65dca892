//! Default content-based metadata extractor.
//!
//! Counts lines, words and characters for text, reads dimensions from PNG
//! and JPEG headers, and applies line-based heuristics to Python and Java
//! sources. Anything smarter belongs in a custom [`MetadataExtractor`].

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::time::SystemTime;

use dirwatch_core::{
    ExtractionError, FileKind, FileMetadata, ImageInfo, MetadataExtractor, ProgramStats, TextStats,
};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Extractor that reads file contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentExtractor;

impl ContentExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }
}

impl MetadataExtractor for ContentExtractor {
    fn extract(
        &self,
        kind: FileKind,
        path: &Path,
        _created_time: SystemTime,
    ) -> Result<FileMetadata, ExtractionError> {
        match kind {
            FileKind::Text => {
                let stats = text_stats(open(path)?).map_err(|e| ExtractionError::io(path, e))?;
                Ok(FileMetadata::Text(stats))
            }
            FileKind::Program => {
                let language = Language::from_path(path);
                let stats = program_stats(open(path)?, language)
                    .map_err(|e| ExtractionError::io(path, e))?;
                Ok(FileMetadata::Program(stats))
            }
            FileKind::Image => image_info(path).map(FileMetadata::Image),
            FileKind::Unclassified => Err(ExtractionError::Unsupported { kind }),
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>, ExtractionError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| ExtractionError::io(path, e))
}

/// Call `f` with each line of `reader`, terminator included.
///
/// Invalid UTF-8 is replaced per line; a newline byte never splits a
/// multi-byte sequence, so this matches decoding the whole input at once.
fn for_each_line(mut reader: impl BufRead, mut f: impl FnMut(&str)) -> io::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        f(&*line);
    }
}

/// Count lines, whitespace-separated words and Unicode scalar values.
pub fn text_stats(reader: impl BufRead) -> io::Result<TextStats> {
    let mut stats = TextStats::default();
    for_each_line(reader, |line| {
        stats.line_count += 1;
        stats.word_count += line.split_whitespace().count() as u64;
        stats.char_count += line.chars().count() as u64;
    })?;
    Ok(stats)
}

/// Source language, which selects the counting heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Java,
    /// Brace-delimited language without specific rules.
    Other,
}

impl Language {
    /// Guess the language from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("py") => Language::Python,
            Some(ext) if ext.eq_ignore_ascii_case("java") => Language::Java,
            _ => Language::Other,
        }
    }
}

/// Count lines, class declarations and method declarations.
pub fn program_stats(reader: impl BufRead, language: Language) -> io::Result<ProgramStats> {
    let mut stats = ProgramStats::default();
    let mut in_block_comment = false;
    for_each_line(reader, |raw| {
        stats.line_count += 1;
        let line = raw.trim();

        if language != Language::Python {
            if in_block_comment {
                if line.contains("*/") {
                    in_block_comment = false;
                }
                return;
            }
            if line.starts_with("/*") {
                in_block_comment = !line.contains("*/");
                return;
            }
            if line.starts_with("//") {
                return;
            }
        } else if line.starts_with('#') {
            return;
        }

        match language {
            Language::Python => {
                if line.starts_with("class ") {
                    stats.class_count += 1;
                } else if line.starts_with("def ") || line.starts_with("async def ") {
                    stats.method_count += 1;
                }
            }
            Language::Java | Language::Other => {
                if declares_type(line) {
                    stats.class_count += 1;
                } else if looks_like_method(line) {
                    stats.method_count += 1;
                }
            }
        }
    })?;

    Ok(stats)
}

const TYPE_KEYWORDS: &[&str] = &["class", "interface", "enum", "record"];

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "else", "do", "try", "return", "new", "throw",
    "synchronized", "case",
];

fn declares_type(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if TYPE_KEYWORDS.contains(&token) {
            // `record` and `enum` are valid identifiers elsewhere; require a name.
            return tokens
                .next()
                .is_some_and(|name| name.starts_with(|c: char| c.is_alphabetic() || c == '_'));
        }
        if !is_modifier(token) {
            return false;
        }
    }
    false
}

fn is_modifier(token: &str) -> bool {
    matches!(
        token,
        "public" | "private" | "protected" | "static" | "final" | "abstract" | "sealed"
            | "non-sealed" | "strictfp"
    ) || token.starts_with('@')
}

fn looks_like_method(line: &str) -> bool {
    let Some(paren) = line.find('(') else {
        return false;
    };
    let head = &line[..paren];
    if head.contains('=') || head.contains('.') || head.trim().is_empty() {
        return false;
    }
    let mut words = head.split_whitespace();
    let Some(first) = words.next() else {
        return false;
    };
    if CONTROL_KEYWORDS.contains(&first) {
        return false;
    }
    // A declaration has at least a return type (or modifier) and a name.
    if words.next().is_none() {
        return false;
    }
    let tail = line.trim_end();
    line[paren..].contains('{')
        || tail.ends_with(')')
        || (tail.ends_with(';') && line.contains("abstract"))
}

/// Read image dimensions from a PNG or JPEG header.
pub fn image_info(path: &Path) -> Result<ImageInfo, ExtractionError> {
    let file = File::open(path).map_err(|e| ExtractionError::io(path, e))?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 2];
    reader
        .read_exact(&mut magic)
        .map_err(|_| ExtractionError::malformed(path, FileKind::Image, "file too short"))?;

    match magic {
        [0x89, b'P'] => png_dimensions(path, &mut reader),
        [0xFF, 0xD8] => jpeg_dimensions(path, &mut reader),
        _ => Err(ExtractionError::malformed(
            path,
            FileKind::Image,
            "unrecognized image signature",
        )),
    }
}

fn png_dimensions(path: &Path, reader: &mut impl Read) -> Result<ImageInfo, ExtractionError> {
    let malformed = |msg: &str| ExtractionError::malformed(path, FileKind::Image, msg);

    // Signature remainder, IHDR length, IHDR tag, width, height.
    let mut header = [0u8; 22];
    reader
        .read_exact(&mut header)
        .map_err(|_| malformed("truncated PNG header"))?;

    if header[..6] != PNG_SIGNATURE[2..] {
        return Err(malformed("bad PNG signature"));
    }
    if &header[10..14] != b"IHDR" {
        return Err(malformed("missing IHDR chunk"));
    }

    let width = u32::from_be_bytes([header[14], header[15], header[16], header[17]]);
    let height = u32::from_be_bytes([header[18], header[19], header[20], header[21]]);
    Ok(ImageInfo::new(width, height))
}

fn jpeg_dimensions(path: &Path, reader: &mut impl Read) -> Result<ImageInfo, ExtractionError> {
    let malformed = |msg: &str| ExtractionError::malformed(path, FileKind::Image, msg);
    let truncated = |_| malformed("truncated JPEG stream");

    let mut byte = [0u8; 1];
    loop {
        // Find the next marker, skipping fill bytes.
        reader.read_exact(&mut byte).map_err(truncated)?;
        if byte[0] != 0xFF {
            return Err(malformed("expected JPEG marker"));
        }
        let mut marker = 0xFF;
        while marker == 0xFF {
            reader.read_exact(&mut byte).map_err(truncated)?;
            marker = byte[0];
        }

        match marker {
            // Standalone markers carry no length.
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => return Err(malformed("no frame header before image data")),
            _ => {}
        }

        let mut len = [0u8; 2];
        reader.read_exact(&mut len).map_err(truncated)?;
        let len = u16::from_be_bytes(len);
        if len < 2 {
            return Err(malformed("invalid segment length"));
        }

        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            let mut frame = [0u8; 5];
            reader.read_exact(&mut frame).map_err(truncated)?;
            let height = u16::from_be_bytes([frame[1], frame[2]]);
            let width = u16::from_be_bytes([frame[3], frame[4]]);
            return Ok(ImageInfo::new(u32::from(width), u32::from(height)));
        }

        let skip = u64::from(len - 2);
        let skipped = std::io::copy(&mut reader.by_ref().take(skip), &mut std::io::sink())
            .map_err(|e| ExtractionError::io(path, e))?;
        if skipped != skip {
            return Err(malformed("truncated JPEG segment"));
        }
    }
}
