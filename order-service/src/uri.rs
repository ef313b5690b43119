/// Placeholder host stored in catalog picture references.
pub const CATALOG_BASE_URL_PLACEHOLDER: &str = "http://catalogbaseurltobereplaced";

pub trait UriComposer: Send + Sync {
    fn compose_pic_uri(&self, picture_uri: &str) -> String;
}

pub struct CatalogUriComposer {
    catalog_base_url: String,
}

impl CatalogUriComposer {
    pub fn new(catalog_base_url: impl Into<String>) -> Self {
        Self {
            catalog_base_url: catalog_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl UriComposer for CatalogUriComposer {
    fn compose_pic_uri(&self, picture_uri: &str) -> String {
        picture_uri.replace(CATALOG_BASE_URL_PLACEHOLDER, &self.catalog_base_url)
    }
}
