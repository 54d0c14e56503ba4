/// Media bytes plus the extension they should be stored and uploaded under.
///
/// Reduction steps replace a blob wholesale; a blob is never edited in place.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub bytes: Vec<u8>,
    pub extension: String,
}

impl std::fmt::Debug for MediaBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaBlob")
            .field("len", &self.bytes.len())
            .field("extension", &self.extension)
            .finish()
    }
}

impl MediaBlob {
    pub fn new(bytes: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            bytes,
            extension: extension.into(),
        }
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type matching the blob's extension.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self.extension.as_str() {
            ".jpg" | ".jpeg" => "image/jpeg",
            ".png" => "image/png",
            ".gif" => "image/gif",
            ".webp" => "image/webp",
            ".mp4" => "video/mp4",
            ".mov" => "video/quicktime",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Video containers are recognized by extension; anything else that the
    /// image decoder recognizes is an image, and the rest is handed to the
    /// video path.
    #[must_use]
    pub fn detect(blob: &MediaBlob) -> Self {
        if matches!(blob.extension.as_str(), ".mp4" | ".mov") {
            return MediaKind::Video;
        }
        if image::guess_format(&blob.bytes).is_ok() {
            MediaKind::Image
        } else {
            MediaKind::Video
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn mp4_extension_is_video() {
        let blob = MediaBlob::new(PNG_MAGIC.to_vec(), ".mp4");
        assert_eq!(MediaKind::detect(&blob), MediaKind::Video);
    }

    #[test]
    fn png_bytes_are_image_regardless_of_extension() {
        let blob = MediaBlob::new(PNG_MAGIC.to_vec(), ".jpg");
        assert_eq!(MediaKind::detect(&blob), MediaKind::Image);
    }

    #[test]
    fn undecodable_bytes_fall_back_to_video() {
        let blob = MediaBlob::new(b"\x00\x00\x00\x18ftypmp42".to_vec(), ".gif");
        assert_eq!(MediaKind::detect(&blob), MediaKind::Video);
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(MediaBlob::new(vec![], ".jpeg").content_type(), "image/jpeg");
        assert_eq!(MediaBlob::new(vec![], ".mov").content_type(), "video/quicktime");
        assert_eq!(
            MediaBlob::new(vec![], ".bin").content_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn debug_omits_bytes() {
        let blob = MediaBlob::new(vec![7; 4096], ".png");
        let rendered = format!("{blob:?}");
        assert!(rendered.contains("4096"));
        assert!(rendered.len() < 100);
    }
}
