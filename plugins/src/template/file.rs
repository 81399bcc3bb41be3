use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use staterail_core::api::{failed, ready, TemplateError, TemplateFuture, TemplateResolver, TemplateSource};

/// Loads `Url` templates from files below a base directory.
///
/// A leading `/` is relative to the base directory; `..` segments are
/// rejected so a template reference cannot escape it.
#[derive(Debug, Clone)]
pub struct FileTemplateResolver {
    base_dir: PathBuf,
}

impl FileTemplateResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn locate(&self, url: &str) -> Result<PathBuf, TemplateError> {
        let relative = Path::new(url.trim_start_matches('/'));
        if url.trim().is_empty() {
            return Err(TemplateError::InvalidPath(url.to_string()));
        }
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(TemplateError::InvalidPath(url.to_string())),
            }
        }
        Ok(self.base_dir.join(relative))
    }
}

impl TemplateResolver for FileTemplateResolver {
    fn resolve(&self, source: &TemplateSource) -> TemplateFuture {
        match source.flatten() {
            TemplateSource::Inline(html) => ready(html),
            TemplateSource::Url(url) => match self.locate(&url) {
                Ok(path) => async move {
                    tracing::debug!(path = %path.display(), "loading template");
                    tokio::fs::read_to_string(&path)
                        .await
                        .map(Arc::<str>::from)
                        .map_err(|e| TemplateError::Io(format!("{}: {e}", path.display())))
                }
                .boxed()
                .shared(),
                Err(err) => {
                    tracing::warn!(url = %url, "template path rejected");
                    failed(err)
                }
            },
            TemplateSource::Computed(_) => failed(TemplateError::Unresolvable(
                "computed template did not settle".to_string(),
            )),
        }
    }
}
