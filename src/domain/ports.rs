use crate::domain::model::{Locality, LocalityQuery};
use crate::utils::error::LookupError;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait LocalityLookup: Send + Sync {
    async fn fetch_localities(&self, query: &LocalityQuery) -> Result<Vec<Locality>, LookupError>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn debounce(&self) -> Duration;
    fn min_city_length(&self) -> usize;
    fn postal_code_length(&self) -> usize;
}
