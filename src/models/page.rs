//! Pagination types.

use serde::{Deserialize, Serialize};

/// A bounded window of items plus pagination cursors.
///
/// `page_index < total_pages` unless `total_pages == 0` (empty result).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_index: u32,
    pub total_pages: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page_index: 0,
            total_pages: 0,
        }
    }
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page_index + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 0
    }
}

/// Pagination metadata attached to collection responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

/// Collection response envelope `{content, page}`; both parts may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageMeta>,
}

impl<T> PageEnvelope<T> {
    pub fn new(content: Vec<T>, number: u32, total_pages: u32) -> Self {
        Self {
            content,
            page: Some(PageMeta {
                number: Some(number),
                total_pages: Some(total_pages),
                ..PageMeta::default()
            }),
        }
    }

    /// Envelope with no pagination metadata.
    pub fn bare(content: Vec<T>) -> Self {
        Self {
            content,
            page: None,
        }
    }
}

/// Fallback applied when a response omits pagination metadata.
///
/// This is a defensive assumption about the server, not part of its contract:
/// a missing page number means the requested one, a missing page count means one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationDefaults {
    pub page_index: u32,
    pub total_pages: u32,
}

impl PaginationDefaults {
    pub fn for_request(requested: u32) -> Self {
        Self {
            page_index: requested,
            total_pages: 1,
        }
    }

    pub fn apply<T>(&self, envelope: PageEnvelope<T>) -> Page<T> {
        let meta = envelope.page.unwrap_or_default();
        Page {
            items: envelope.content,
            page_index: meta.number.unwrap_or(self.page_index),
            total_pages: meta.total_pages.unwrap_or(self.total_pages),
        }
    }
}
