//! Shared resource helpers: name validation, source filtering, and the
//! combine-capable resource core.
//!
//! Copyright (c) 2025 Posit, PBC

use once_cell::sync::Lazy;
use regex::Regex;

use crate::combine::CombineFiles;
use crate::error::{AssetError, Result};
use crate::url::UrlManager;

/// Identifier pattern shared by resource and group names.
static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]*$").unwrap());

/// Whether a resource or group name is a valid identifier. The empty
/// string is allowed; unnamed resources pick up their group's name at
/// registration.
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Path component of a source entry, with any query string or fragment
/// removed.
fn source_path(source: &str) -> &str {
    let end = source
        .find(['?', '#'])
        .unwrap_or(source.len());
    source[..end].trim()
}

/// Drop sources whose path appears in the ignore list. Applied before
/// first render so ignored files never reach the combine step.
pub(crate) fn filter_ignored_sources(sources: &mut Vec<String>, ignored: &[String]) {
    sources.retain(|source| {
        let path = source_path(source);
        path.is_empty() || !ignored.iter().any(|i| i == path)
    });
}

/// State shared by the combine-capable resource kinds (scripts and
/// stylesheets): identity, ordered sources, the optional combine
/// collaborator, and the once-per-render URL memo.
pub(crate) struct ResourceCore {
    name: String,
    sources: Vec<String>,
    combine: Option<Box<dyn CombineFiles>>,
    is_combine: bool,
    urls: Option<Vec<String>>,
}

impl ResourceCore {
    pub fn new(name: &str, sources: Vec<String>, is_combine: bool) -> Result<Self> {
        let mut core = Self {
            name: String::new(),
            sources,
            combine: None,
            is_combine,
            urls: None,
        };
        core.set_name(name)?;
        Ok(core)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename, keeping the combine collaborator's output name in sync.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if !is_valid_name(name) {
            return Err(AssetError::InvalidName {
                name: name.to_string(),
            });
        }
        self.name = name.to_string();
        if let Some(combine) = &mut self.combine {
            combine.set_output_file_name(name);
        }
        Ok(())
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn filter_ignored(&mut self, ignored: &[String]) {
        filter_ignored_sources(&mut self.sources, ignored);
    }

    pub fn set_combine_object(&mut self, mut combine: Box<dyn CombineFiles>) {
        combine.set_output_file_name(&self.name);
        self.combine = Some(combine);
    }

    pub fn combine_object_mut(&mut self) -> Option<&mut dyn CombineFiles> {
        match &mut self.combine {
            Some(combine) => Some(combine.as_mut()),
            None => None,
        }
    }

    pub fn is_combine(&self) -> bool {
        self.is_combine && self.combine.is_some()
    }

    /// URLs for this resource, produced once and memoized.
    ///
    /// A combine-capable resource triggers the merge on first call and
    /// yields the single combined artifact URL without the site base;
    /// otherwise one URL per source, base added and checked.
    pub fn urls(&mut self, url_manager: &dyn UrlManager) -> Result<&[String]> {
        if self.urls.is_none() {
            let combined = if self.is_combine {
                match self.combine.as_mut() {
                    Some(combine) => {
                        combine.combine()?;
                        Some(url_manager.url(&combine.path(), false, false))
                    }
                    None => None,
                }
            } else {
                None
            };

            let urls = match combined {
                Some(url) => vec![url],
                None => self.source_urls(url_manager),
            };
            self.urls = Some(urls);
        }
        Ok(self.urls.as_deref().unwrap_or_default())
    }

    fn source_urls(&self, url_manager: &dyn UrlManager) -> Vec<String> {
        self.sources
            .iter()
            .map(|source| url_manager.url(source, true, true))
            .collect()
    }
}

impl std::fmt::Debug for ResourceCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCore")
            .field("name", &self.name)
            .field("sources", &self.sources)
            .field("is_combine", &self.is_combine)
            .field("combine", &self.combine.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::testing::RecordingCombine;
    use crate::url::PlainUrlManager;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("framework"));
        assert!(is_valid_name("my-theme_2"));
        assert!(is_valid_name(""));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name("dot.dot"));
        assert!(!is_valid_name("sla/sh"));
    }

    #[test]
    fn test_filter_ignored_strips_query() {
        let mut sources = vec![
            "js/app.js".to_string(),
            "js/vendor.js?v=3".to_string(),
            "js/keep.js".to_string(),
        ];
        filter_ignored_sources(
            &mut sources,
            &["js/vendor.js".to_string()],
        );
        assert_eq!(sources, vec!["js/app.js", "js/keep.js"]);
    }

    #[test]
    fn test_filter_ignores_nothing_by_default() {
        let mut sources = vec!["a.js".to_string()];
        filter_ignored_sources(&mut sources, &[]);
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn test_urls_one_per_source_without_combine() {
        let mut core = ResourceCore::new(
            "app",
            vec!["js/a.js".to_string(), "js/b.js".to_string()],
            false,
        )
        .unwrap();
        let urls = core.urls(&PlainUrlManager).unwrap();
        assert_eq!(urls, ["js/a.js", "js/b.js"]);
    }

    #[test]
    fn test_combine_triggers_exactly_once() {
        let mut core =
            ResourceCore::new("app", vec!["js/a.js".to_string()], true).unwrap();
        let (combine, log) = RecordingCombine::new();
        core.set_combine_object(Box::new(combine));

        let first = core.urls(&PlainUrlManager).unwrap().to_vec();
        let second = core.urls(&PlainUrlManager).unwrap().to_vec();

        assert_eq!(first, vec!["combined/app.out"]);
        assert_eq!(first, second);
        assert_eq!(log.lock().unwrap().combine_calls, 1);
    }

    #[test]
    fn test_rename_updates_combine_output_name() {
        let mut core = ResourceCore::new("app", Vec::new(), true).unwrap();
        let (combine, _log) = RecordingCombine::new();
        core.set_combine_object(Box::new(combine));
        core.set_name("frame_app").unwrap();

        let urls = core.urls(&PlainUrlManager).unwrap();
        assert_eq!(urls, ["combined/frame_app.out"]);
    }

    #[test]
    fn test_invalid_rename_rejected() {
        let mut core = ResourceCore::new("app", Vec::new(), false).unwrap();
        assert!(core.set_name("bad name").is_err());
    }
}
