use nanogen_models::RewriteStyle;
use serde::{Deserialize, Serialize};

/// Input accepted by a feature service.
///
/// Blank text and missing images are never sent to a service.
pub trait FeatureRequest: Send + Sync + 'static {
    fn is_empty(&self) -> bool;
}

impl FeatureRequest for String {
    fn is_empty(&self) -> bool {
        self.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRequest {
    pub text: String,
    pub style: RewriteStyle,
}

impl RewriteRequest {
    pub fn new(text: impl Into<String>, style: RewriteStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

impl FeatureRequest for RewriteRequest {
    fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Encoded image handed to the description feature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }
}

impl FeatureRequest for ImageInput {
    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl<T: FeatureRequest> FeatureRequest for Option<T> {
    fn is_empty(&self) -> bool {
        self.as_ref().map_or(true, FeatureRequest::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_text_is_empty() {
        assert!(FeatureRequest::is_empty(&"   \n\t".to_string()));
        assert!(!FeatureRequest::is_empty(&" hi ".to_string()));
    }

    #[test]
    fn test_rewrite_request_emptiness() {
        assert!(RewriteRequest::new("  ", RewriteStyle::Friendly).is_empty());
        assert!(!RewriteRequest::new("ship it", RewriteStyle::Shorten).is_empty());
    }

    #[test]
    fn test_missing_image_is_empty() {
        let none: Option<ImageInput> = None;
        assert!(none.is_empty());
        assert!(Some(ImageInput::default()).is_empty());
        assert!(!Some(ImageInput::new(vec![0x89, 0x50], 1, 1)).is_empty());
    }
}
