//! JavaScript resources.
//!
//! Copyright (c) 2025 Posit, PBC

use crate::combine::CombineFiles;
use crate::error::Result;
use crate::resource::ResourceCore;
use crate::url::UrlManager;

/// One named, ordered list of JavaScript sources.
pub struct ScriptResource {
    core: ResourceCore,
    async_load: bool,
}

/// Options accepted at construction.
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    /// Merge the sources into one physical output file.
    pub combine: bool,
    /// Emit the script for asynchronous loading.
    pub async_load: bool,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            combine: false,
            async_load: true,
        }
    }
}

impl ScriptResource {
    pub fn new(name: &str, sources: Vec<String>, options: ScriptOptions) -> Result<Self> {
        Ok(Self {
            core: ResourceCore::new(name, sources, options.combine)?,
            async_load: options.async_load,
        })
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.core.set_name(name)
    }

    pub fn sources(&self) -> &[String] {
        self.core.sources()
    }

    pub fn is_async(&self) -> bool {
        self.async_load
    }

    pub fn filter_ignored(&mut self, ignored: &[String]) {
        self.core.filter_ignored(ignored)
    }

    pub fn set_combine_object(&mut self, combine: Box<dyn CombineFiles>) {
        self.core.set_combine_object(combine)
    }

    pub fn combine_object_mut(&mut self) -> Option<&mut (dyn CombineFiles + '_)> {
        self.core.combine_object_mut()
    }

    pub fn is_combine(&self) -> bool {
        self.core.is_combine()
    }

    pub fn urls(&mut self, url_manager: &dyn UrlManager) -> Result<&[String]> {
        self.core.urls(url_manager)
    }
}
