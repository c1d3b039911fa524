use crate::{chat::ChatService, dataset::DatasetStore};
use std::sync::Arc;

pub struct AppServices {
    pub chat: ChatService,
}

impl AppServices {
    pub fn new(store: Arc<DatasetStore>) -> Self {
        Self {
            chat: ChatService::new(store),
        }
    }
}
