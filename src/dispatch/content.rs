//! Content payloads and the header/footer framing applied to them.

/// One piece of content that can be sent to any recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPayload {
    Text { text: String },
    Photo { file_id: String, caption: Option<String> },
    Video { file_id: String, caption: Option<String> },
    Document { file_id: String, caption: Option<String> },
    Sticker { file_id: String },
}

impl ContentPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Returns the payload kind for logs and replies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Photo { .. } => "photo",
            Self::Video { .. } => "video",
            Self::Document { .. } => "document",
            Self::Sticker { .. } => "sticker",
        }
    }
}

/// Optional header prefixed and footer appended to textual content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Framing {
    pub header: Option<String>,
    pub footer: Option<String>,
}

impl Framing {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    pub fn header(header: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
            footer: None,
        }
    }

    pub fn footer(footer: impl Into<String>) -> Self {
        Self {
            header: None,
            footer: Some(footer.into()),
        }
    }

    /// Wraps a text body or caption (absent captions count as empty).
    #[must_use]
    pub fn apply(&self, body: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(header) = &self.header {
            out.push_str(header);
        }
        out.push_str(body.unwrap_or_default());
        if let Some(footer) = &self.footer {
            out.push_str(footer);
        }
        out
    }

    /// Caption to send: `None` when there is neither a caption nor framing.
    #[must_use]
    pub fn caption(&self, caption: Option<&str>) -> Option<String> {
        if caption.is_none() && self.header.is_none() && self.footer.is_none() {
            None
        } else {
            Some(self.apply(caption))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_footer_wrap_body() {
        let framing = Framing {
            header: Some("H\n\n".to_owned()),
            footer: Some("\n\nF".to_owned()),
        };
        assert_eq!(framing.apply(Some("body")), "H\n\nbody\n\nF");
    }

    #[test]
    fn test_missing_caption_with_footer() {
        let framing = Framing::footer("\n\nF");
        assert_eq!(framing.caption(None), Some("\n\nF".to_owned()));
        assert_eq!(Framing::none().caption(None), None);
        assert_eq!(Framing::none().caption(Some("c")), Some("c".to_owned()));
    }

    #[test]
    fn test_payload_kind() {
        let sticker = ContentPayload::Sticker {
            file_id: "s".to_owned(),
        };
        assert_eq!(sticker.kind(), "sticker");
        assert_eq!(ContentPayload::text("hi").kind(), "text");
    }
}
