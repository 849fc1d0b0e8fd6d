use serde::Deserialize;
use serde_json::Value;

/// One response unit of a paginated collection.
///
/// The backend answers either with a pagination envelope
/// (`{"count": .., "next": .., "previous": .., "results": [..]}`) or with a
/// bare array for unpaginated collections; the latter is a terminal page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "PageBody")]
pub struct Page {
    pub items: Vec<Value>,
    pub next: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageBody {
    Paginated {
        results: Vec<Value>,
        #[serde(default)]
        next: Option<String>,
    },
    Bare(Vec<Value>),
}

impl From<PageBody> for Page {
    fn from(body: PageBody) -> Self {
        match body {
            PageBody::Paginated { results, next } => Page {
                items: results,
                next: next.filter(|next| !next.is_empty()),
            },
            PageBody::Bare(items) => Page { items, next: None },
        }
    }
}

impl Page {
    pub fn is_terminal(&self) -> bool {
        self.next.is_none()
    }
}
