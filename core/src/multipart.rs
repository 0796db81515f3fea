//! `multipart/form-data` body encoding.
//!
//! Create and update carry text fields plus an optional binary image, so the
//! body is assembled here as bytes. The boundary is random unless a test pins
//! it with `with_boundary`.

use uuid::Uuid;

use crate::types::ImageFile;

#[derive(Debug, Clone)]
enum Part {
    Text { name: String, value: String },
    File { name: String, file: ImageFile },
}

/// Builder for a `multipart/form-data` request body.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(format!("----movies-core-{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push(Part::Text {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn file(mut self, name: &str, file: &ImageFile) -> Self {
        self.parts.push(Part::File {
            name: name.to_string(),
            file: file.clone(),
        });
        self
    }

    /// Value for the `content-type` header, boundary included.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let mut body = Vec::new();
        for part in &self.parts {
            body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match part {
                Part::Text { name, value } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            header_safe(name)
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File { name, file } => {
                    let content_type = if file.content_type.trim().is_empty() {
                        "application/octet-stream"
                    } else {
                        file.content_type.as_str()
                    };
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            header_safe(name),
                            header_safe(&file.file_name),
                            header_safe(content_type)
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(&file.bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        body
    }
}

/// Quotes and line breaks would end the header early.
fn header_safe(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| if c == '"' { '\'' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_text_and_file_parts() {
        let image = ImageFile::new("poster.png", "image/png", vec![0x89, b'P', b'N', b'G']);
        let form = MultipartForm::with_boundary("XYZ")
            .text("Name", "Dune")
            .file("ImageFile", &image);
        assert_eq!(form.content_type(), "multipart/form-data; boundary=XYZ");

        let mut expected = b"--XYZ\r\nContent-Disposition: form-data; name=\"Name\"\r\n\r\nDune\r\n--XYZ\r\nContent-Disposition: form-data; name=\"ImageFile\"; filename=\"poster.png\"\r\nContent-Type: image/png\r\n\r\n".to_vec();
        expected.extend_from_slice(&[0x89, b'P', b'N', b'G']);
        expected.extend_from_slice(b"\r\n--XYZ--\r\n");
        assert_eq!(form.into_bytes(), expected);
    }

    #[test]
    fn file_name_cannot_break_out_of_header() {
        let image = ImageFile::new("evil\"\r\nX-Injected: 1.png", "", vec![1]);
        let body = MultipartForm::with_boundary("B").file("ImageFile", &image).into_bytes();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("filename=\"evil'X-Injected: 1.png\""));
        assert!(text.contains("Content-Type: application/octet-stream"));
    }

    #[test]
    fn random_boundaries_differ() {
        assert_ne!(MultipartForm::new().boundary(), MultipartForm::new().boundary());
    }

    #[test]
    fn empty_form_is_just_the_terminator() {
        assert_eq!(MultipartForm::with_boundary("B").into_bytes(), b"--B--\r\n".to_vec());
    }
}
