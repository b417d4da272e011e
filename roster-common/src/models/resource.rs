//! Resource abstraction shared by contacts and documents

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// The two record collections exposed by the roster API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Contacts,
    Documents,
}

impl ResourceKind {
    /// Collection root below the API base URL
    pub fn collection_path(self) -> &'static str {
        match self {
            ResourceKind::Contacts => "/api/contacts",
            ResourceKind::Documents => "/api/documents",
        }
    }

    /// Singular entity name as used in admin endpoint names (`createContact`)
    pub fn entity(self) -> &'static str {
        match self {
            ResourceKind::Contacts => "Contact",
            ResourceKind::Documents => "Document",
        }
    }

    /// Lowercase plural, used in user-facing messages
    pub fn plural(self) -> &'static str {
        match self {
            ResourceKind::Contacts => "contacts",
            ResourceKind::Documents => "documents",
        }
    }

    /// Capitalized plural, used at the start of user-facing messages
    pub fn title(self) -> &'static str {
        match self {
            ResourceKind::Contacts => "Contacts",
            ResourceKind::Documents => "Documents",
        }
    }

    /// Only contacts expose the spreadsheet upload endpoint
    pub fn supports_file_upload(self) -> bool {
        matches!(self, ResourceKind::Contacts)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// A record type managed through the console
///
/// Implemented by [`crate::Contact`] and [`crate::Document`]. The API client,
/// record pages and import dialog are generic over this trait.
pub trait Resource:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Create/update payload for this record type
    type Draft: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    const KIND: ResourceKind;

    /// Opaque server-assigned identifier
    fn id(&self) -> &str;

    /// Fields consulted by the search filter
    fn search_fields(&self) -> Vec<&str>;

    /// Case-insensitive substring match against any search field
    ///
    /// An empty term matches every record.
    fn matches(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        self.search_fields()
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}
