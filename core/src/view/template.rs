//! Template sources and the resolver seam.
//!
//! A slot stores its template as a shared future: the store never waits for
//! resolution, consumers await it when they render.

use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::TemplateError;

/// Resolved template markup, shared between every consumer of a slot.
pub type TemplateFuture = Shared<BoxFuture<'static, Result<Arc<str>, TemplateError>>>;

/// Where a template comes from.
#[derive(Clone)]
pub enum TemplateSource {
    /// Literal markup.
    Inline(String),
    /// A reference the resolver knows how to load (path or URL).
    Url(String),
    /// Produces another source when resolved.
    Computed(Arc<dyn Fn() -> TemplateSource + Send + Sync>),
}

impl TemplateSource {
    pub fn inline(html: impl Into<String>) -> Self {
        Self::Inline(html.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn() -> TemplateSource + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    /// Follows `Computed` sources until a concrete one is produced.
    pub fn flatten(&self) -> TemplateSource {
        let mut current = self.clone();
        while let TemplateSource::Computed(f) = current {
            current = f();
        }
        current
    }
}

impl PartialEq for TemplateSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Inline(a), Self::Inline(b)) => a == b,
            (Self::Url(a), Self::Url(b)) => a == b,
            (Self::Computed(a), Self::Computed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(html) => f.debug_tuple("Inline").field(html).finish(),
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Turns a [`TemplateSource`] into markup. Implementations must not block:
/// the returned future is stored and awaited later by whoever renders the slot.
pub trait TemplateResolver: Send + Sync {
    fn resolve(&self, source: &TemplateSource) -> TemplateFuture;
}

/// Wraps already available markup.
pub fn ready(html: impl Into<Arc<str>>) -> TemplateFuture {
    let html: Arc<str> = html.into();
    futures::future::ready(Ok(html)).boxed().shared()
}

/// Wraps a resolution failure.
pub fn failed(err: TemplateError) -> TemplateFuture {
    futures::future::ready(Err(err)).boxed().shared()
}

/// Resolves inline and computed sources only. URL sources fail; attach a
/// loading resolver (see the plugins crate) to serve them.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineTemplateResolver;

impl TemplateResolver for InlineTemplateResolver {
    fn resolve(&self, source: &TemplateSource) -> TemplateFuture {
        match source.flatten() {
            TemplateSource::Inline(html) => ready(html),
            TemplateSource::Url(url) => failed(TemplateError::Unresolvable(url)),
            other => failed(TemplateError::Unresolvable(format!("{other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inline_resolves() {
        let fut = InlineTemplateResolver.resolve(&TemplateSource::inline("<p>hi</p>"));
        assert_eq!(&*fut.await.unwrap(), "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_computed_is_flattened() {
        let source = TemplateSource::computed(|| TemplateSource::inline("made"));
        let fut = InlineTemplateResolver.resolve(&source);
        assert_eq!(&*fut.await.unwrap(), "made");
    }

    #[tokio::test]
    async fn test_url_fails_without_loader() {
        let fut = InlineTemplateResolver.resolve(&TemplateSource::url("tpl/home.html"));
        assert_eq!(
            fut.await.unwrap_err(),
            TemplateError::Unresolvable("tpl/home.html".to_string())
        );
    }

    #[test]
    fn test_computed_equality_is_identity() {
        let a = TemplateSource::computed(|| TemplateSource::inline("x"));
        let b = TemplateSource::computed(|| TemplateSource::inline("x"));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
