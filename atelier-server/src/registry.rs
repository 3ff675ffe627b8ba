use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
    sync::Arc,
};

use atelier_sandbox::{Handler, SandboxHost};
use atelier_types::{
    entity::{Endpoint, HttpMethod, Language, Page},
    methods::debug::{RouteKind, RouteSummary},
};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::{error::Error, repos::Repos};

/// In-memory record for one registered path.
pub enum RouteInfo {
    Endpoint(EndpointRoute),
    Page(PageRoute),
}

impl RouteInfo {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            RouteInfo::Endpoint(route) => &route.path,
            RouteInfo::Page(route) => &route.path,
        }
    }

    fn summary(&self) -> RouteSummary {
        match self {
            RouteInfo::Endpoint(route) => RouteSummary {
                path: route.path.clone(),
                kind: RouteKind::Endpoint,
                method: Some(route.method),
                language: Some(route.language),
            },
            RouteInfo::Page(route) => RouteSummary {
                path: route.path.clone(),
                kind: RouteKind::Page,
                method: None,
                language: None,
            },
        }
    }
}

pub struct EndpointRoute {
    pub path: String,
    pub parameters: Vec<String>,
    pub method: HttpMethod,
    pub language: Language,
    /// Refcounted sandbox handle. Replacing or removing the route drops
    /// this reference; the guest context is torn down when the last
    /// in-flight invocation lets go of its clone.
    pub handler: Arc<Handler>,
}

pub struct PageRoute {
    pub path: String,
    pub html_content: String,
}

/// The in-memory `path -> RouteInfo` mapping shared by the dispatcher and
/// the CRUD surface.
///
/// Lookups only take the map read lock and clone an `Arc`, so they never
/// observe a partially built route. All mutations serialize behind one
/// async mutex; they are rare next to dispatch.
pub struct Registry {
    routes: RwLock<HashMap<String, Arc<RouteInfo>>>,
    write_lock: Mutex<()>,
    initialized: AtomicBool,
    init_lock: Mutex<()>,
    repos: Repos,
    host: Arc<SandboxHost>,
}

impl Registry {
    #[must_use]
    pub fn new(repos: Repos, host: Arc<SandboxHost>) -> Self {
        Self {
            routes: RwLock::new(HashMap::default()),
            write_lock: Mutex::new(()),
            initialized: AtomicBool::new(false),
            init_lock: Mutex::new(()),
            repos,
            host,
        }
    }

    /// Hydrate the registry from the store on first call. Concurrent
    /// callers wait for the same hydration; a failed hydration leaves the
    /// registry uninitialized and is retried on the next call.
    pub async fn ensure_initialized(&self) -> Result<(), Error> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }
        let _guard = self.init_lock.lock().await;
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        self.hydrate().await?;
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn hydrate(&self) -> Result<(), Error> {
        let endpoints = self.repos.endpoint.list_all().await?;
        let pages = self.repos.page.list_all().await?;
        info!(
            endpoints = endpoints.len(),
            pages = pages.len(),
            "hydrating route registry from store"
        );

        let _guard = self.write_lock.lock().await;
        for endpoint in &endpoints {
            let info = self.compile_endpoint(endpoint).await;
            self.install(info).await;
        }
        for page in &pages {
            self.install(page_route(page)).await;
        }
        Ok(())
    }

    /// Compile (or re-compile) and install the route for an endpoint. A
    /// prior route at the same path is replaced atomically; its handler is
    /// released once no invocation holds it.
    #[tracing::instrument(skip(self, endpoint), fields(path = endpoint.path))]
    pub async fn register_endpoint(&self, endpoint: &Endpoint) {
        let _guard = self.write_lock.lock().await;
        let info = self.compile_endpoint(endpoint).await;
        self.install(info).await;
    }

    #[tracing::instrument(skip(self, page), fields(path = page.path))]
    pub async fn register_page(&self, page: &Page) {
        let _guard = self.write_lock.lock().await;
        self.install(page_route(page)).await;
    }

    /// Re-read the store by path: re-register when the endpoint is still
    /// there, drop the route when it is gone.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_endpoint(&self, path: &str) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        match self.repos.endpoint.get_by_path(path).await? {
            Some(endpoint) => {
                let info = self.compile_endpoint(&endpoint).await;
                self.install(info).await;
            }
            None => {
                self.routes.write().await.remove(path);
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn refresh_page(&self, path: &str) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        match self.repos.page.get_by_path(path).await? {
            Some(page) => self.install(page_route(&page)).await,
            None => {
                self.routes.write().await.remove(path);
            }
        }
        Ok(())
    }

    /// Drop the route at `path`. Returns whether anything was registered
    /// there.
    #[tracing::instrument(skip(self))]
    pub async fn unregister(&self, path: &str) -> bool {
        let _guard = self.write_lock.lock().await;
        self.routes.write().await.remove(path).is_some()
    }

    pub async fn lookup(&self, path: &str) -> Option<Arc<RouteInfo>> {
        let routes = self.routes.read().await;
        routes.get(path).map(Arc::clone)
    }

    pub async fn list_paths(&self) -> Vec<String> {
        let routes = self.routes.read().await;
        let mut paths: Vec<_> = routes.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub async fn route_summaries(&self) -> Vec<RouteSummary> {
        let routes = self.routes.read().await;
        let mut summaries: Vec<_> = routes.values().map(|route| route.summary()).collect();
        summaries.sort_by(|a, b| a.path.cmp(&b.path));
        summaries
    }

    async fn compile_endpoint(&self, endpoint: &Endpoint) -> RouteInfo {
        let compiled = self.host.compile(endpoint.language, &endpoint.code).await;
        if let Some(error) = &compiled.error {
            warn!(
                path = endpoint.path,
                %error,
                "endpoint failed to compile; registering stub handler"
            );
        }
        RouteInfo::Endpoint(EndpointRoute {
            path: endpoint.path.clone(),
            parameters: endpoint.parameters.clone(),
            method: endpoint.http_method,
            language: endpoint.language,
            handler: compiled.handler,
        })
    }

    // Callers hold `write_lock`.
    async fn install(&self, info: RouteInfo) {
        let mut routes = self.routes.write().await;
        routes.insert(info.path().to_string(), Arc::new(info));
    }
}

fn page_route(page: &Page) -> RouteInfo {
    RouteInfo::Page(PageRoute {
        path: page.path.clone(),
        html_content: page.html_content.clone(),
    })
}

#[cfg(test)]
mod tests {
    use atelier_types::entity::Project;
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::repos::test_support;

    async fn registry_with_store() -> (Registry, Project) {
        let repos = test_support::repos().await;
        repos.user.ensure("u1").await.unwrap();
        let project = Project::new("u1".into(), "demo".into(), None);
        repos.project.create(&project).await.unwrap();
        let registry = Registry::new(repos, Arc::new(SandboxHost::default()));
        (registry, project)
    }

    fn endpoint(project: &Project, path: &str) -> Endpoint {
        Endpoint {
            id: Uuid::new_v4().to_string(),
            path: path.to_string(),
            parameters: vec![],
            code: "function endpoint_function(p) { return p; }".into(),
            language: Language::Javascript,
            http_method: HttpMethod::Get,
            project_id: project.id.clone(),
            user_id: project.user_id.clone(),
            created_at: Utc::now(),
            user_email: None,
            project_name: None,
        }
    }

    fn page(project: &Project, path: &str) -> Page {
        Page {
            id: Uuid::new_v4().to_string(),
            path: path.to_string(),
            html_content: "<p>hi</p>".into(),
            project_id: project.id.clone(),
            user_id: project.user_id.clone(),
            created_at: Utc::now(),
            user_email: None,
            project_name: None,
        }
    }

    #[tokio::test]
    async fn hydrates_every_stored_route_once() {
        let (registry, project) = registry_with_store().await;
        registry
            .repos
            .endpoint
            .create(&endpoint(&project, "/api/demo/a"))
            .await
            .unwrap();
        registry
            .repos
            .page
            .create(&page(&project, "/demo/home"))
            .await
            .unwrap();

        registry.ensure_initialized().await.unwrap();
        assert_eq!(
            registry.list_paths().await,
            vec!["/api/demo/a".to_string(), "/demo/home".to_string()]
        );

        // Second call is a no-op even after the store changed.
        registry
            .repos
            .endpoint
            .create(&endpoint(&project, "/api/demo/late"))
            .await
            .unwrap();
        registry.ensure_initialized().await.unwrap();
        assert_eq!(registry.list_paths().await.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_initialization_hydrates_once() {
        let (registry, project) = registry_with_store().await;
        registry
            .repos
            .endpoint
            .create(&endpoint(&project, "/api/demo/a"))
            .await
            .unwrap();

        let registry = Arc::new(registry);
        let mut handles = vec![];
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(
                async move { registry.ensure_initialized().await },
            ));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(registry.list_paths().await, vec!["/api/demo/a".to_string()]);
    }

    #[tokio::test]
    async fn refresh_is_idempotent() {
        let (registry, project) = registry_with_store().await;
        let ep = endpoint(&project, "/api/demo/a");
        registry.repos.endpoint.create(&ep).await.unwrap();
        registry.ensure_initialized().await.unwrap();

        registry.refresh_endpoint("/api/demo/a").await.unwrap();
        let first = registry.route_summaries().await;
        registry.refresh_endpoint("/api/demo/a").await.unwrap();
        let second = registry.route_summaries().await;
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn refresh_removes_routes_gone_from_the_store() {
        let (registry, project) = registry_with_store().await;
        let ep = endpoint(&project, "/api/demo/a");
        registry.repos.endpoint.create(&ep).await.unwrap();
        registry.ensure_initialized().await.unwrap();
        assert!(registry.lookup("/api/demo/a").await.is_some());

        registry
            .repos
            .endpoint
            .delete(&ep.id, "u1")
            .await
            .unwrap();
        registry.refresh_endpoint("/api/demo/a").await.unwrap();
        assert!(registry.lookup("/api/demo/a").await.is_none());
    }

    #[tokio::test]
    async fn registry_converges_with_the_store() {
        let (registry, project) = registry_with_store().await;
        registry.ensure_initialized().await.unwrap();

        let ep = endpoint(&project, "/api/demo/a");
        registry.repos.endpoint.create(&ep).await.unwrap();
        registry.register_endpoint(&ep).await;
        let pg = page(&project, "/demo/home");
        registry.repos.page.create(&pg).await.unwrap();
        registry.register_page(&pg).await;

        assert_eq!(
            registry.list_paths().await,
            vec!["/api/demo/a".to_string(), "/demo/home".to_string()]
        );

        registry.repos.endpoint.delete(&ep.id, "u1").await.unwrap();
        assert!(registry.unregister("/api/demo/a").await);
        assert!(!registry.unregister("/api/demo/a").await);
        assert_eq!(registry.list_paths().await, vec!["/demo/home".to_string()]);
    }

    #[tokio::test]
    async fn broken_code_still_registers_a_stub() {
        let (registry, project) = registry_with_store().await;
        let mut ep = endpoint(&project, "/api/demo/broken");
        ep.code = "garbage syntax!".into();
        registry.repos.endpoint.create(&ep).await.unwrap();
        registry.ensure_initialized().await.unwrap();

        let route = registry.lookup("/api/demo/broken").await.unwrap();
        match route.as_ref() {
            RouteInfo::Endpoint(route) => assert!(route.handler.is_stub()),
            RouteInfo::Page(_) => panic!("expected an endpoint route"),
        }
    }
}
