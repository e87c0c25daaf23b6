use crate::store::{StoreError, TemplateFilter, TemplateStore};
use crate::template::Template;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

#[derive(Clone)]
pub enum MockResponse {
    /// Found by the id lookup.
    ById(Template),
    /// Only found by the source lookup.
    BySource(Template),
    Empty,
    Unavailable,
}

/// Scripted store that records the filters it was queried with.
pub struct MockTemplateStore {
    response: Mutex<MockResponse>,
    filters: Mutex<Vec<TemplateFilter>>,
}

impl MockTemplateStore {
    pub fn new(response: MockResponse) -> Self {
        MockTemplateStore {
            response: Mutex::new(response),
            filters: Mutex::new(Vec::new()),
        }
    }

    pub fn respond_with(&self, response: MockResponse) {
        *self.response.lock() = response;
    }

    pub fn queries(&self) -> usize {
        self.filters.lock().len()
    }

    pub fn filters(&self) -> Vec<TemplateFilter> {
        self.filters.lock().clone()
    }
}

#[async_trait]
impl TemplateStore for MockTemplateStore {
    async fn find_one(&self, filter: &TemplateFilter) -> Result<Option<Template>, StoreError> {
        self.filters.lock().push(filter.clone());

        let response = self.response.lock().clone();
        match (response, filter) {
            (MockResponse::ById(template), TemplateFilter::ActiveById(_)) => Ok(Some(template)),
            (MockResponse::BySource(template), TemplateFilter::ActiveBySource(_)) => {
                Ok(Some(template))
            }
            (MockResponse::Unavailable, _) => Err(StoreError::Timeout),
            _ => Ok(None),
        }
    }
}

pub fn template_with_id(id: &str) -> Template {
    Template::from_document(json!({
        "_id": id,
        "active": true,
        "source": "meta",
        "channel": "ads",
        "require": ["campaign_id", "adset_id", "ad_id"],
        "mapping": {
            "context.click_signals": {
                "fbclid": "$query.fbclid"
            }
        }
    }))
    .unwrap()
}
