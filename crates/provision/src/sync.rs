//! Keep the `antigravity` provider block identical across `openclaw.json`
//! and every agent's `models.json`.

use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    serde::Serialize,
    tracing::{debug, info},
};

use crate::{
    catalog::{DEFAULT_BASE_URL, DEFAULT_MODELS, ProviderBlock, upsert_provider},
    document::Document,
    error::{Error, Result},
    home::{OpenClawHome, resolve_path},
};

/// Where the provider block lives in the top-level document.
const CONFIG_PROVIDERS: &[&str] = &["models", "providers"];
/// Where the provider block lives in an agent catalog.
const CATALOG_PROVIDERS: &[&str] = &["providers"];

#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Path to `openclaw.json`; `~` is expanded.
    pub config_path: PathBuf,
    pub base_url: String,
    pub api_key: Secret<String>,
    /// Model ids to publish. Empty means [`DEFAULT_MODELS`].
    pub models: Vec<String>,
    /// Explicit agent catalogs. Empty means discover them next to
    /// `openclaw.json`.
    pub agent_catalogs: Vec<PathBuf>,
    pub dry_run: bool,
}

impl SyncRequest {
    pub fn new(config_path: impl Into<PathBuf>, api_key: Secret<String>) -> Self {
        Self {
            config_path: config_path.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            models: Vec::new(),
            agent_catalogs: Vec::new(),
            dry_run: false,
        }
    }

    fn model_ids(&self) -> Vec<String> {
        if self.models.is_empty() {
            DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
        } else {
            self.models.clone()
        }
    }
}

/// Files whose provider block changed (or would change, in a dry run), in
/// processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub changed: Vec<PathBuf>,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.changed.is_empty() {
            return write!(f, "No changes needed");
        }
        let action = if self.dry_run {
            "Would update"
        } else {
            "Updated"
        };
        write!(f, "{action} {} file(s):", self.changed.len())?;
        for path in &self.changed {
            write!(f, "\n{}", path.display())?;
        }
        Ok(())
    }
}

/// Rewrite the provider block in the top-level document and every agent
/// catalog. Files whose block already matches are left untouched.
///
/// The first file that cannot be read or parsed aborts the run; files
/// rewritten before it keep their new content.
pub fn sync_provider(request: &SyncRequest) -> Result<SyncReport> {
    let config_path = resolve_path(&request.config_path)?;
    if !config_path.is_file() {
        return Err(Error::MissingDocument { path: config_path });
    }

    let block = ProviderBlock::new(&request.base_url, request.api_key.clone(), &request.model_ids());
    let mut report = SyncReport {
        dry_run: request.dry_run,
        changed: Vec::new(),
    };

    if sync_file(&config_path, CONFIG_PROVIDERS, &block, request.dry_run)? {
        report.changed.push(config_path.clone());
    }

    for catalog in agent_catalogs(&config_path, &request.agent_catalogs)? {
        if !catalog.is_file() {
            debug!(path = %catalog.display(), "skipping missing agent catalog");
            continue;
        }
        if sync_file(&catalog, CATALOG_PROVIDERS, &block, request.dry_run)? {
            report.changed.push(catalog);
        }
    }

    info!(
        changed = report.changed.len(),
        dry_run = request.dry_run,
        "provider sync finished"
    );
    Ok(report)
}

fn agent_catalogs(config_path: &Path, explicit: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if explicit.is_empty() {
        let home = config_path.parent().unwrap_or(Path::new("."));
        return Ok(OpenClawHome::new(home).agent_catalogs());
    }
    explicit
        .iter()
        .map(|path| resolve_path(path))
        .collect()
}

fn sync_file(path: &Path, providers: &[&str], block: &ProviderBlock, dry_run: bool) -> Result<bool> {
    let mut document = Document::load(path)?;
    let section = document
        .object_at_mut(providers)
        .map_err(|e| e.at_path(path))?;
    let changed = upsert_provider(section, block)?;
    if !changed {
        debug!(path = %path.display(), "provider block already up to date");
        return Ok(false);
    }
    if dry_run {
        info!(path = %path.display(), "dry run: would update provider block");
    } else {
        document.save(path)?;
        info!(path = %path.display(), "updated provider block");
    }
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, crate::catalog::PROVIDER_NAME, serde_json::json};

    struct Fixture {
        _tmp: tempfile::TempDir,
        home: OpenClawHome,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let home = OpenClawHome::new(tmp.path().canonicalize().unwrap());
        std::fs::write(
            home.config_path(),
            r#"{"models": {"providers": {"openai": {"apiKey": "keep"}}}, "gateway": {"port": 18789}}"#,
        )
        .unwrap();
        for agent in ["main", "ops"] {
            std::fs::create_dir_all(home.agent_dir(agent)).unwrap();
            std::fs::write(home.agent_catalog(agent), r#"{"providers": {}}"#).unwrap();
        }
        Fixture { _tmp: tmp, home }
    }

    fn request(home: &OpenClawHome) -> SyncRequest {
        SyncRequest::new(home.config_path(), Secret::new("sk-live".into()))
    }

    #[test]
    fn first_sync_updates_all_files_then_nothing() {
        let fx = fixture();
        let req = request(&fx.home);

        let report = sync_provider(&req).unwrap();
        assert_eq!(report.changed, vec![
            fx.home.config_path(),
            fx.home.agent_catalog("main"),
            fx.home.agent_catalog("ops"),
        ]);

        let doc = Document::load(&fx.home.config_path()).unwrap();
        assert_eq!(doc.get(&["models", "providers", "openai", "apiKey"]), Some(&json!("keep")));
        assert_eq!(doc.get(&["gateway", "port"]), Some(&json!(18789)));
        let models = doc
            .get(&["models", "providers", PROVIDER_NAME, "models"])
            .and_then(|m| m.as_array())
            .unwrap();
        assert_eq!(models.len(), DEFAULT_MODELS.len());

        let before = std::fs::read_to_string(fx.home.agent_catalog("ops")).unwrap();
        let again = sync_provider(&req).unwrap();
        assert!(again.is_empty());
        assert_eq!(again.to_string(), "No changes needed");
        assert_eq!(
            std::fs::read_to_string(fx.home.agent_catalog("ops")).unwrap(),
            before
        );
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let fx = fixture();
        let original = std::fs::read_to_string(fx.home.config_path()).unwrap();
        let mut req = request(&fx.home);
        req.dry_run = true;

        let report = sync_provider(&req).unwrap();
        assert_eq!(report.changed.len(), 3);
        assert!(report.to_string().starts_with("Would update 3 file(s):\n"));
        assert_eq!(std::fs::read_to_string(fx.home.config_path()).unwrap(), original);
    }

    #[test]
    fn explicit_catalogs_skip_missing_files() {
        let fx = fixture();
        let mut req = request(&fx.home);
        req.models = vec!["claude-sonnet-4-6".into()];
        req.agent_catalogs = vec![
            fx.home.agent_catalog("ops"),
            fx.home.agent_catalog("ghost"),
        ];

        let report = sync_provider(&req).unwrap();
        assert_eq!(report.changed, vec![
            fx.home.config_path(),
            fx.home.agent_catalog("ops"),
        ]);
        assert_eq!(
            std::fs::read_to_string(fx.home.agent_catalog("main")).unwrap(),
            r#"{"providers": {}}"#
        );
        assert!(report.to_string().starts_with("Updated 2 file(s):\n"));
    }

    #[test]
    fn unparseable_catalog_aborts_with_its_path() {
        let fx = fixture();
        std::fs::write(fx.home.agent_catalog("ops"), "{not json").unwrap();

        let err = sync_provider(&request(&fx.home)).unwrap_err();
        match err {
            Error::Parse { path, .. } => assert_eq!(path, fx.home.agent_catalog("ops")),
            other => panic!("unexpected error: {other}"),
        }
        // Files processed before the failure keep their update.
        let doc = Document::load(&fx.home.config_path()).unwrap();
        assert!(doc.get(&["models", "providers", PROVIDER_NAME]).is_some());
    }

    #[test]
    fn missing_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let req = SyncRequest::new(tmp.path().join("openclaw.json"), Secret::new("k".into()));
        assert!(matches!(
            sync_provider(&req),
            Err(Error::MissingDocument { .. })
        ));
    }
}
