//! MIME types by file extension.
//!
//! The core only needs [`Mime::as_str`]. The extension table is for
//! file-serving handlers built on top of the server.

use std::fmt;
use std::path::Path;

/// Broad family a MIME type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeCategory {
    Text,
    Binary,
    Image,
    Audio,
    Video,
}

/// Content types known to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mime {
    // text
    #[default]
    PlainText,
    Html,
    Css,
    Csv,
    Markdown,
    Xml,
    JavaScript,
    Json,
    // binary
    OctetStream,
    Pdf,
    Zip,
    Gzip,
    Tar,
    Wasm,
    // image
    Png,
    Jpeg,
    Gif,
    Svg,
    Webp,
    Ico,
    Bmp,
    // audio
    Mp3,
    Ogg,
    Wav,
    Flac,
    // video
    Mp4,
    Webm,
    Avi,
    Mpeg,
    QuickTime,
    Flv,
}

const EXTENSIONS: &[(&str, Mime)] = &[
    ("txt", Mime::PlainText),
    ("text", Mime::PlainText),
    ("log", Mime::PlainText),
    ("htm", Mime::Html),
    ("html", Mime::Html),
    ("css", Mime::Css),
    ("csv", Mime::Csv),
    ("md", Mime::Markdown),
    ("xml", Mime::Xml),
    ("js", Mime::JavaScript),
    ("mjs", Mime::JavaScript),
    ("json", Mime::Json),
    ("bin", Mime::OctetStream),
    ("exe", Mime::OctetStream),
    ("class", Mime::OctetStream),
    ("pdf", Mime::Pdf),
    ("zip", Mime::Zip),
    ("gz", Mime::Gzip),
    ("tar", Mime::Tar),
    ("wasm", Mime::Wasm),
    ("png", Mime::Png),
    ("jpg", Mime::Jpeg),
    ("jpeg", Mime::Jpeg),
    ("gif", Mime::Gif),
    ("svg", Mime::Svg),
    ("webp", Mime::Webp),
    ("ico", Mime::Ico),
    ("bmp", Mime::Bmp),
    ("mp3", Mime::Mp3),
    ("ogg", Mime::Ogg),
    ("oga", Mime::Ogg),
    ("wav", Mime::Wav),
    ("flac", Mime::Flac),
    ("mp4", Mime::Mp4),
    ("m4v", Mime::Mp4),
    ("webm", Mime::Webm),
    ("avi", Mime::Avi),
    ("mpg", Mime::Mpeg),
    ("mpeg", Mime::Mpeg),
    ("mov", Mime::QuickTime),
    ("flv", Mime::Flv),
];

impl Mime {
    /// The content type sent in the `Content-Type` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mime::PlainText => "text/plain",
            Mime::Html => "text/html",
            Mime::Css => "text/css",
            Mime::Csv => "text/csv",
            Mime::Markdown => "text/markdown",
            Mime::Xml => "text/xml",
            Mime::JavaScript => "application/javascript",
            Mime::Json => "application/json",
            Mime::OctetStream => "application/octet-stream",
            Mime::Pdf => "application/pdf",
            Mime::Zip => "application/zip",
            Mime::Gzip => "application/gzip",
            Mime::Tar => "application/x-tar",
            Mime::Wasm => "application/wasm",
            Mime::Png => "image/png",
            Mime::Jpeg => "image/jpeg",
            Mime::Gif => "image/gif",
            Mime::Svg => "image/svg+xml",
            Mime::Webp => "image/webp",
            Mime::Ico => "image/x-icon",
            Mime::Bmp => "image/bmp",
            Mime::Mp3 => "audio/mpeg",
            Mime::Ogg => "audio/ogg",
            Mime::Wav => "audio/wav",
            Mime::Flac => "audio/flac",
            Mime::Mp4 => "video/mp4",
            Mime::Webm => "video/webm",
            Mime::Avi => "video/x-msvideo",
            Mime::Mpeg => "video/mpeg",
            Mime::QuickTime => "video/quicktime",
            Mime::Flv => "video/x-flv",
        }
    }

    pub fn category(&self) -> MimeCategory {
        match self {
            Mime::PlainText
            | Mime::Html
            | Mime::Css
            | Mime::Csv
            | Mime::Markdown
            | Mime::Xml
            | Mime::JavaScript
            | Mime::Json => MimeCategory::Text,
            Mime::OctetStream | Mime::Pdf | Mime::Zip | Mime::Gzip | Mime::Tar | Mime::Wasm => {
                MimeCategory::Binary
            }
            Mime::Png | Mime::Jpeg | Mime::Gif | Mime::Svg | Mime::Webp | Mime::Ico | Mime::Bmp => {
                MimeCategory::Image
            }
            Mime::Mp3 | Mime::Ogg | Mime::Wav | Mime::Flac => MimeCategory::Audio,
            Mime::Mp4 | Mime::Webm | Mime::Avi | Mime::Mpeg | Mime::QuickTime | Mime::Flv => {
                MimeCategory::Video
            }
        }
    }

    /// Look up a file extension (without the dot, case-insensitive).
    pub fn from_extension(extension: &str) -> Option<Mime> {
        let extension = extension.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(known, _)| *known == extension)
            .map(|(_, mime)| *mime)
    }

    /// Guess from a path's extension, falling back to `application/octet-stream`.
    pub fn from_path(path: impl AsRef<Path>) -> Mime {
        path.as_ref()
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(Mime::from_extension)
            .unwrap_or(Mime::OctetStream)
    }
}

impl fmt::Display for Mime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
