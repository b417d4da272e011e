//! Document record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::contact::non_empty;
use super::resource::{Resource, ResourceKind};

/// A document link as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create/update payload for a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDraft {
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,
}

impl DocumentDraft {
    pub fn normalized(mut self) -> Self {
        self.uploaded_by = non_empty(self.uploaded_by);
        self
    }
}

impl From<&Document> for DocumentDraft {
    fn from(document: &Document) -> Self {
        Self {
            title: document.title.clone(),
            link: document.link.clone(),
            uploaded_by: document.uploaded_by.clone(),
        }
    }
}

impl Resource for Document {
    type Draft = DocumentDraft;

    const KIND: ResourceKind = ResourceKind::Documents;

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(self.uploaded_by.as_deref());
        fields
    }
}
