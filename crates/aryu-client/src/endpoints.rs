//! REST paths of the channel resources.

use aryu_core::ChannelConfig;
use aryu_proto::{ItemId, Resource};

/// Builds absolute URLs for every request the backend makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    config: ChannelConfig,
}

impl Endpoints {
    /// Endpoints under the configured API base.
    pub fn new(config: &ChannelConfig) -> Self {
        Self { config: config.clone() }
    }

    fn resource(&self, resource: &Resource, rest: &str) -> String {
        self.config.endpoint(&format!("{}/{}/{rest}", resource.kind, resource.id))
    }

    /// Item list of a resource. `POST` here creates an item.
    pub fn items(&self, resource: &Resource) -> String {
        self.resource(resource, "items/")
    }

    /// One item.
    pub fn item(&self, resource: &Resource, id: ItemId) -> String {
        self.resource(resource, &format!("items/{id}/"))
    }

    /// Read receipt for one item.
    pub fn mark_read(&self, resource: &Resource, id: ItemId) -> String {
        self.resource(resource, &format!("items/{id}/read/"))
    }

    /// Read receipt for every item of a resource.
    pub fn read_all(&self, resource: &Resource) -> String {
        self.resource(resource, "read-all/")
    }

    /// Question list of a quiz.
    pub fn questions(&self, resource: &Resource) -> String {
        self.resource(resource, "questions/")
    }
}
