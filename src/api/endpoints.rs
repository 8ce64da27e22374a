use crate::config::ServicesConfig;
use crate::models::VideoId;

/// Resolved collection URLs of the upload, catalog and admin services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    upload: String,
    catalog: String,
    admin: String,
}

impl Endpoints {
    pub fn direct(upload: &str, catalog: &str, admin: &str) -> Self {
        Self {
            upload: trim(upload),
            catalog: trim(catalog),
            admin: trim(admin),
        }
    }

    /// Every service behind one reverse-proxy path prefix, e.g. `http://host/api`.
    pub fn proxied(base: &str) -> Self {
        let base = trim(base);
        Self {
            upload: format!("{}/upload", base),
            catalog: format!("{}/catalog/videos", base),
            admin: format!("{}/admin/videos", base),
        }
    }

    pub fn from_config(config: &ServicesConfig) -> Self {
        match config.proxy_base.as_deref().filter(|b| !b.trim().is_empty()) {
            Some(base) => Self::proxied(base),
            None => Self::direct(&config.upload_url, &config.catalog_url, &config.admin_url),
        }
    }

    pub fn upload(&self) -> String {
        self.upload.clone()
    }

    pub fn list_videos(&self) -> String {
        self.catalog.clone()
    }

    pub fn view(&self, id: &VideoId) -> String {
        format!("{}/{}/view", self.catalog, id)
    }

    pub fn admin_videos(&self) -> String {
        self.admin.clone()
    }

    pub fn admin_video(&self, id: &VideoId) -> String {
        format!("{}/{}", self.admin, id)
    }
}

fn trim(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_base_wins_over_direct_urls() {
        let config = ServicesConfig {
            proxy_base: Some("http://gateway/api/".to_string()),
            ..ServicesConfig::default()
        };
        let endpoints = Endpoints::from_config(&config);
        let id = VideoId::new("abc");
        assert_eq!(endpoints.upload(), "http://gateway/api/upload");
        assert_eq!(endpoints.list_videos(), "http://gateway/api/catalog/videos");
        assert_eq!(endpoints.view(&id), "http://gateway/api/catalog/videos/abc/view");
        assert_eq!(endpoints.admin_video(&id), "http://gateway/api/admin/videos/abc");
    }

    #[test]
    fn direct_urls_are_used_verbatim() {
        let endpoints = Endpoints::from_config(&ServicesConfig::default());
        assert_eq!(endpoints.upload(), "http://localhost:5003/upload");
        assert_eq!(endpoints.list_videos(), "http://localhost:5001/videos");
        assert_eq!(endpoints.admin_videos(), "http://localhost:5004/admin/videos");
    }

    #[test]
    fn blank_proxy_base_falls_back_to_direct() {
        let config = ServicesConfig {
            proxy_base: Some("  ".to_string()),
            ..ServicesConfig::default()
        };
        assert_eq!(
            Endpoints::from_config(&config),
            Endpoints::from_config(&ServicesConfig::default())
        );
    }
}
