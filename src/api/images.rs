//! Images API
//!
//! Generation takes JSON; edits and variations upload PNG files as multipart forms.

use crate::api::files::FileUpload;
use crate::client::Multipart;
use serde::{Deserialize, Serialize};

/// Size of generated images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "256x256")]
    S256,
    #[serde(rename = "512x512")]
    S512,
    #[default]
    #[serde(rename = "1024x1024")]
    S1024,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "256x256",
            Self::S512 => "512x512",
            Self::S1024 => "1024x1024",
        }
    }
}

/// How generated images are returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    #[default]
    Url,
    B64Json,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::B64Json => "b64_json",
        }
    }
}

/// Options shared by every image request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageOptions {
    /// Number of images, 1 to 10
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,

    /// Image size; the API defaults to 1024x1024
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<ImageSize>,

    /// URL or base64 JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ImageFormat>,

    /// End-user identifier for abuse monitoring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ImageOptions {
    fn write_fields(&self, mut form: Multipart) -> Multipart {
        if let Some(n) = self.n {
            form = form.text("n", n.to_string());
        }
        if let Some(size) = self.size {
            form = form.text("size", size.as_str());
        }
        if let Some(format) = self.response_format {
            form = form.text("response_format", format.as_str());
        }
        if let Some(user) = &self.user {
            form = form.text("user", user.clone());
        }
        form
    }
}

/// Generate images from a prompt
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateImageRequest {
    /// Description of the image, up to 1000 characters
    pub prompt: String,

    #[serde(flatten)]
    pub options: ImageOptions,
}

impl CreateImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: ImageOptions::default(),
        }
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.options.size = Some(size);
        self
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.options.response_format = Some(format);
        self
    }
}

/// Edit an image; transparent areas of `mask` (or of `image`) are repainted
#[derive(Debug, Clone)]
pub struct EditImageRequest {
    /// Square PNG under 4MB
    pub image: FileUpload,

    /// PNG with the same dimensions as `image`
    pub mask: Option<FileUpload>,

    /// Description of the edited image
    pub prompt: String,

    pub options: ImageOptions,
}

impl EditImageRequest {
    pub fn new(image: FileUpload, prompt: impl Into<String>) -> Self {
        Self {
            image,
            mask: None,
            prompt: prompt.into(),
            options: ImageOptions::default(),
        }
    }

    pub fn with_mask(mut self, mask: FileUpload) -> Self {
        self.mask = Some(mask);
        self
    }

    pub(crate) fn to_multipart(&self) -> Multipart {
        let mut form = Multipart::new()
            .file("image", self.image.clone())
            .text("prompt", self.prompt.clone());
        if let Some(mask) = &self.mask {
            form = form.file("mask", mask.clone());
        }
        self.options.write_fields(form)
    }
}

/// Create variations of an image
#[derive(Debug, Clone)]
pub struct VariationImageRequest {
    /// Square PNG under 4MB
    pub image: FileUpload,

    pub options: ImageOptions,
}

impl VariationImageRequest {
    pub fn new(image: FileUpload) -> Self {
        Self {
            image,
            options: ImageOptions::default(),
        }
    }

    pub(crate) fn to_multipart(&self) -> Multipart {
        let form = Multipart::new().file("image", self.image.clone());
        self.options.write_fields(form)
    }
}

/// One generated image, as a URL or base64 PNG depending on the request format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    /// Temporary URL of the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Base64-encoded PNG
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
}

/// Generated images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    /// Creation time, unix seconds
    pub created: u64,

    /// One entry per image
    pub data: Vec<ImageData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_image_request_flattens_options() {
        let request = CreateImageRequest::new("A cute baby sea otter")
            .with_size(ImageSize::S512)
            .with_format(ImageFormat::B64Json);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "prompt": "A cute baby sea otter",
                "size": "512x512",
                "response_format": "b64_json"
            })
        );
    }

    #[test]
    fn test_edit_multipart_fields() {
        let image = FileUpload::new("otter.png", &b"png"[..]);
        let mut request = EditImageRequest::new(image, "add a hat")
            .with_mask(FileUpload::new("mask.png", &b"png"[..]));
        request.options.n = Some(2);

        let form = request.to_multipart();
        assert_eq!(form.names(), vec!["image", "prompt", "mask", "n"]);
    }

    #[test]
    fn test_variation_multipart_fields() {
        let request = VariationImageRequest::new(FileUpload::new("otter.png", &b"png"[..]));
        assert_eq!(request.to_multipart().names(), vec!["image"]);
    }

    #[test]
    fn test_image_response() {
        let response: ImageResponse = serde_json::from_str(
            r#"{"created": 1589478378, "data": [{"url": "https://example.com/a.png"}, {"url": "https://example.com/b.png"}]}"#,
        )
        .unwrap();

        assert_eq!(response.data.len(), 2);
        assert!(response.data[0].b64_json.is_none());
    }
}
