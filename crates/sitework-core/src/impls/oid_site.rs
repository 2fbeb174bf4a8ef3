//! OidSiteResolver - oid で site を引くデフォルト実装

use async_trait::async_trait;

use crate::domain::{SiteRef, StoreError};
use crate::ports::{Connection, Site, SiteResolver};

/// Resolves a site by loading its oid through the given connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct OidSiteResolver;

impl OidSiteResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SiteResolver for OidSiteResolver {
    async fn resolve(
        &self,
        connection: &mut dyn Connection,
        site: &SiteRef,
    ) -> Result<Site, StoreError> {
        let data = connection.get(site.oid).await?;
        Ok(Site::new(site.oid, site.name.clone(), data, connection.store()))
    }
}
