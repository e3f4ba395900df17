use std::path::Path;

/// Incoming upload as handed over by the host's request-handling layer.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Filename as supplied by the uploader.
    pub original_name: String,
    /// Extension derived from the upload; not re-validated against
    /// `original_name`.
    pub extension: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl FileUpload {
    /// Build an upload from a filename, deriving extension and content
    /// type from it.
    pub fn new(original_name: impl Into<String>, data: Vec<u8>) -> Self {
        let original_name = original_name.into();
        let extension = Path::new(&original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_string();
        let content_type = mime_guess::from_path(&original_name)
            .first_or_octet_stream()
            .to_string();

        Self {
            original_name,
            extension,
            content_type,
            data,
        }
    }

    /// Override the derived extension, e.g. when the host trusts its own
    /// sniffing over the uploaded filename.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_extension_and_content_type() {
        let upload = FileUpload::new("photo.PNG", vec![1, 2, 3]);
        assert_eq!(upload.extension, "PNG");
        assert_eq!(upload.content_type, "image/png");
        assert_eq!(upload.size(), 3);
    }

    #[test]
    fn missing_extension_defaults_to_octet_stream() {
        let upload = FileUpload::new("README", vec![]);
        assert_eq!(upload.extension, "");
        assert_eq!(upload.content_type, "application/octet-stream");
    }

    #[test]
    fn extension_override() {
        let upload = FileUpload::new("photo.tmp", vec![]).with_extension("jpg");
        assert_eq!(upload.extension, "jpg");
    }
}
