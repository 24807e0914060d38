//! Typed resource managers: group registration, combine orchestration,
//! and render-format dispatch.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Each resource kind has its own manager accepting only that kind, so
//! mismatched registrations fail at compile time. The combine-capable
//! managers (scripts, stylesheets) prefix every resource name with its
//! group and resolve naming collisions by switching the collaborator to
//! auto output naming.

use std::collections::HashSet;
use std::fmt::Write as _;

use hashlink::LinkedHashMap;
use serde::Serialize;

use crate::combine::OutputStrategy;
use crate::error::{AssetError, Result};
use crate::groups::ResourceGroups;
use crate::html::{escape_html, srcset_value};
use crate::image::{ImageResource, ImageSet};
use crate::script::ScriptResource;
use crate::stylesheet::StylesheetResource;
use crate::url::UrlManager;

/// Output of a render-format dispatch.
#[derive(Debug)]
pub enum Rendered {
    Html(String),
    Json(String),
    Manifest(ScriptManifest),
    /// One HTML fragment per image resource.
    Fragments(Vec<String>),
}

/// The `array` render format: per-group URLs with async flags, group
/// dependency lists, and the unknown-bucket entries.
#[derive(Debug, Serialize)]
pub struct ScriptManifest {
    pub resources: LinkedHashMap<String, Vec<ManifestEntry>>,
    pub dependencies: LinkedHashMap<String, Vec<String>>,
    pub unknown: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub urls: Vec<String>,
    #[serde(rename = "async")]
    pub async_load: bool,
}

/// `{group}_{name}`, or the bare group name for unnamed resources.
fn prefixed_name(group: Option<&str>, name: &str) -> String {
    let group = group.unwrap_or("");
    if name.is_empty() {
        group.to_string()
    } else {
        format!("{group}_{name}")
    }
}

// ============================================================================
// Scripts
// ============================================================================

/// Manager for JavaScript resources.
pub struct ScriptResources {
    groups: ResourceGroups<ScriptResource>,
    url_manager: Box<dyn UrlManager>,
    registered_names: HashSet<String>,
    length: usize,
}

impl ScriptResources {
    pub const SUPPORTED_FORMATS: &'static [&'static str] = &["html", "json", "array"];

    pub fn new(url_manager: Box<dyn UrlManager>) -> Self {
        Self {
            groups: ResourceGroups::new(),
            url_manager,
            registered_names: HashSet::new(),
            length: 0,
        }
    }

    pub fn add_group(&mut self, name: &str, dependencies: &[&str]) -> Result<()> {
        self.groups.add_group(name, dependencies)
    }

    /// Register a resource into a group.
    ///
    /// Combine-capable resources get every source queued into their
    /// collaborator; the resource is renamed `{group}_{name}`, and a name
    /// collision switches the collaborator to auto output naming instead
    /// of overwriting a distinct asset.
    pub fn add(&mut self, mut resource: ScriptResource, group: Option<&str>) -> Result<()> {
        let sources = resource.sources().to_vec();
        if resource.is_combine() {
            if let Some(combine) = resource.combine_object_mut() {
                for source in &sources {
                    combine.add_source(source);
                }
            }
        }

        let name = prefixed_name(group, resource.name());
        resource.set_name(&name)?;

        if !self.registered_names.insert(name.clone()) {
            tracing::debug!(%name, "resource name collision, switching to auto naming");
            if let Some(combine) = resource.combine_object_mut() {
                combine.set_output_strategy(OutputStrategy::Auto);
            }
        }

        self.groups.add_resource(resource, group);
        self.length += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn groups(&self) -> &ResourceGroups<ScriptResource> {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut ResourceGroups<ScriptResource> {
        &mut self.groups
    }

    pub fn render(&mut self, format: &str, group: Option<&str>) -> Result<Rendered> {
        match format {
            "html" => Ok(Rendered::Html(self.render_html(group)?)),
            "json" => Ok(Rendered::Json(self.to_json()?)),
            "array" => Ok(Rendered::Manifest(self.manifest()?)),
            other => Err(AssetError::UnsupportedFormat {
                format: other.to_string(),
                kind: "script",
            }),
        }
    }

    /// `<script>` tags in dependency order.
    pub fn render_html(&mut self, group: Option<&str>) -> Result<String> {
        let mut output = String::new();
        let url_manager = self.url_manager.as_ref();

        match group {
            Some(name) => {
                if let Some(entry) = self.groups.get_mut(name) {
                    for resource in &mut entry.resources {
                        write_script_tags(&mut output, resource, url_manager)?;
                    }
                }
            }
            None => {
                let order = self.groups.resolve()?;
                for name in &order {
                    if let Some(entry) = self.groups.get_mut(name) {
                        for resource in &mut entry.resources {
                            write_script_tags(&mut output, resource, url_manager)?;
                        }
                    }
                }
                for resource in self.groups.unknown_mut() {
                    write_script_tags(&mut output, resource, url_manager)?;
                }
            }
        }

        Ok(output)
    }

    /// The `array` format as a serializable manifest.
    pub fn manifest(&mut self) -> Result<ScriptManifest> {
        let url_manager = self.url_manager.as_ref();
        let mut manifest = ScriptManifest {
            resources: LinkedHashMap::new(),
            dependencies: LinkedHashMap::new(),
            unknown: Vec::new(),
        };

        let order = self.groups.resolve()?;
        for name in &order {
            let Some(entry) = self.groups.get_mut(name) else {
                continue;
            };
            manifest
                .dependencies
                .insert(name.clone(), entry.dependencies.clone());

            let mut entries = Vec::new();
            for resource in &mut entry.resources {
                let urls = resource.urls(url_manager)?.to_vec();
                if !urls.is_empty() {
                    entries.push(ManifestEntry {
                        urls,
                        async_load: resource.is_async(),
                    });
                }
            }
            manifest.resources.insert(name.clone(), entries);
        }

        for resource in self.groups.unknown_mut() {
            let urls = resource.urls(url_manager)?.to_vec();
            if !urls.is_empty() {
                manifest.unknown.push(ManifestEntry {
                    urls,
                    async_load: resource.is_async(),
                });
            }
        }

        Ok(manifest)
    }

    /// The manifest in its JSON encoding.
    pub fn to_json(&mut self) -> Result<String> {
        Ok(serde_json::to_string(&self.manifest()?)?)
    }
}

fn write_script_tags(
    output: &mut String,
    resource: &mut ScriptResource,
    url_manager: &dyn UrlManager,
) -> Result<()> {
    for url in resource.urls(url_manager)? {
        let _ = write!(
            output,
            "<script src=\"{}\" type=\"text/javascript\"></script>",
            escape_html(url)
        );
    }
    Ok(())
}

// ============================================================================
// Stylesheets
// ============================================================================

/// Manager for stylesheet resources.
pub struct StylesheetResources {
    groups: ResourceGroups<StylesheetResource>,
    url_manager: Box<dyn UrlManager>,
    registered_names: HashSet<String>,
    length: usize,
}

impl StylesheetResources {
    pub const SUPPORTED_FORMATS: &'static [&'static str] = &["html"];

    pub fn new(url_manager: Box<dyn UrlManager>) -> Self {
        Self {
            groups: ResourceGroups::new(),
            url_manager,
            registered_names: HashSet::new(),
            length: 0,
        }
    }

    pub fn add_group(&mut self, name: &str, dependencies: &[&str]) -> Result<()> {
        self.groups.add_group(name, dependencies)
    }

    pub fn add(&mut self, mut resource: StylesheetResource, group: Option<&str>) -> Result<()> {
        let sources = resource.sources().to_vec();
        if resource.is_combine() {
            if let Some(combine) = resource.combine_object_mut() {
                for source in &sources {
                    combine.add_source(source);
                }
            }
        }

        let name = prefixed_name(group, resource.name());
        resource.set_name(&name)?;

        if !self.registered_names.insert(name.clone()) {
            tracing::debug!(%name, "resource name collision, switching to auto naming");
            if let Some(combine) = resource.combine_object_mut() {
                combine.set_output_strategy(OutputStrategy::Auto);
            }
        }

        self.groups.add_resource(resource, group);
        self.length += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn groups(&self) -> &ResourceGroups<StylesheetResource> {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut ResourceGroups<StylesheetResource> {
        &mut self.groups
    }

    pub fn render(&mut self, format: &str, group: Option<&str>) -> Result<Rendered> {
        match format {
            "html" => Ok(Rendered::Html(self.render_html(group)?)),
            other => Err(AssetError::UnsupportedFormat {
                format: other.to_string(),
                kind: "stylesheet",
            }),
        }
    }

    /// `<link rel="stylesheet">` tags in dependency order.
    pub fn render_html(&mut self, group: Option<&str>) -> Result<String> {
        let mut output = String::new();
        let url_manager = self.url_manager.as_ref();

        match group {
            Some(name) => {
                if let Some(entry) = self.groups.get_mut(name) {
                    for resource in &mut entry.resources {
                        write_link_tags(&mut output, resource, url_manager)?;
                    }
                }
            }
            None => {
                let order = self.groups.resolve()?;
                for name in &order {
                    if let Some(entry) = self.groups.get_mut(name) {
                        for resource in &mut entry.resources {
                            write_link_tags(&mut output, resource, url_manager)?;
                        }
                    }
                }
                for resource in self.groups.unknown_mut() {
                    write_link_tags(&mut output, resource, url_manager)?;
                }
            }
        }

        Ok(output)
    }
}

fn write_link_tags(
    output: &mut String,
    resource: &mut StylesheetResource,
    url_manager: &dyn UrlManager,
) -> Result<()> {
    for url in resource.urls(url_manager)? {
        let _ = write!(
            output,
            "<link href=\"{}\" rel=\"stylesheet\" type=\"text/css\">",
            escape_html(url)
        );
    }
    Ok(())
}

// ============================================================================
// Images
// ============================================================================

/// Manager for image resources.
///
/// Images are never combined or renamed; the manager only groups them
/// and renders the responsive markup.
pub struct ImageResources {
    groups: ResourceGroups<ImageResource>,
    url_manager: Box<dyn UrlManager>,
    length: usize,
}

impl ImageResources {
    pub const SUPPORTED_FORMATS: &'static [&'static str] = &["html", "html_img", "html_picture"];

    pub fn new(url_manager: Box<dyn UrlManager>) -> Self {
        Self {
            groups: ResourceGroups::new(),
            url_manager,
            length: 0,
        }
    }

    pub fn add_group(&mut self, name: &str, dependencies: &[&str]) -> Result<()> {
        self.groups.add_group(name, dependencies)
    }

    pub fn add(&mut self, resource: ImageResource, group: Option<&str>) {
        self.groups.add_resource(resource, group);
        self.length += 1;
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn groups(&self) -> &ResourceGroups<ImageResource> {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut ResourceGroups<ImageResource> {
        &mut self.groups
    }

    pub fn render(&mut self, format: &str, group: Option<&str>) -> Result<Rendered> {
        let fragments = match format {
            "html" | "html_picture" => self.collect(group, picture_tag)?,
            "html_img" => self.collect(group, img_tag)?,
            other => {
                return Err(AssetError::UnsupportedFormat {
                    format: other.to_string(),
                    kind: "image",
                });
            }
        };
        Ok(Rendered::Fragments(fragments))
    }

    fn collect(
        &mut self,
        group: Option<&str>,
        render: fn(&mut ImageResource, &dyn UrlManager) -> String,
    ) -> Result<Vec<String>> {
        let mut fragments = Vec::new();
        let url_manager = self.url_manager.as_ref();

        match group {
            Some(name) => {
                if let Some(entry) = self.groups.get_mut(name) {
                    for resource in &mut entry.resources {
                        fragments.push(render(resource, url_manager));
                    }
                }
            }
            None => {
                let order = self.groups.resolve()?;
                for name in &order {
                    if let Some(entry) = self.groups.get_mut(name) {
                        for resource in &mut entry.resources {
                            fragments.push(render(resource, url_manager));
                        }
                    }
                }
                for resource in self.groups.unknown_mut() {
                    fragments.push(render(resource, url_manager));
                }
            }
        }

        Ok(fragments)
    }
}

fn descriptor_suffix(entry: &crate::image::ImageSetEntry, density_only: bool) -> String {
    let mut suffix = String::new();
    if !density_only {
        if entry.variant.srcset_width > 0 {
            let _ = write!(suffix, " {}w", entry.variant.srcset_width);
        }
        if entry.variant.srcset_height > 0 {
            let _ = write!(suffix, " {}h", entry.variant.srcset_height);
        }
    }
    if entry.variant.srcset_density > 0 {
        let _ = write!(suffix, " {}x", entry.variant.srcset_density);
    }
    suffix
}

fn img_tag(resource: &mut ImageResource, url_manager: &dyn UrlManager) -> String {
    let set = resource.image_set(url_manager);
    let urls = resource.urls(url_manager).to_vec();
    let name = resource.name().to_string();

    let mut tag = String::from("<img");
    if !set.sizes.is_empty() {
        let _ = write!(tag, " sizes=\"{}\"", escape_html(&set.sizes));
    }

    let src = urls.get(set.src_index).cloned().unwrap_or_default();
    let _ = write!(tag, " src=\"{}\"", escape_html(&src));

    let srcset_entries: Vec<(String, String)> = set
        .default
        .iter()
        .map(|entry| (entry.url.clone(), descriptor_suffix(entry, false)))
        .collect();
    let srcset = srcset_value(&srcset_entries);
    if !srcset.is_empty() && srcset != src {
        let _ = write!(tag, " srcset=\"{}\"", escape_html(&srcset));
    }

    let _ = write!(tag, " alt=\"{}\"", escape_html(&name));
    for (key, value) in &set.attributes {
        let _ = write!(tag, " {}=\"{}\"", escape_html(key), escape_html(value));
    }
    tag.push('>');
    tag
}

fn source_tag(set: &ImageSet, entries: &[crate::image::ImageSetEntry]) -> String {
    let srcset_entries: Vec<(String, String)> = entries
        .iter()
        .map(|entry| (entry.url.clone(), descriptor_suffix(entry, true)))
        .collect();

    let mut tag = String::from("<source");
    let _ = write!(tag, " srcset=\"{}\"", escape_html(&srcset_value(&srcset_entries)));

    if let Some(first) = entries.first() {
        if first.variant.media_index >= 0 {
            if let Some(media) = set.media.get(first.variant.media_index as usize) {
                let _ = write!(tag, " media=\"{}\"", escape_html(media));
            }
        }
    }
    tag.push('>');
    tag
}

fn picture_tag(resource: &mut ImageResource, url_manager: &dyn UrlManager) -> String {
    let set = resource.image_set(url_manager);
    let urls = resource.urls(url_manager).to_vec();
    let name = resource.name().to_string();

    let mut tag = String::from("<picture");
    for (key, value) in &set.attributes {
        let _ = write!(tag, " {}=\"{}\"", escape_html(key), escape_html(value));
    }
    tag.push_str(">\n");

    // media-specific sources first, the default bucket last so it wins
    // only when no media query matched
    for entries in set.by_media.values() {
        tag.push_str(&source_tag(&set, entries));
        tag.push('\n');
    }
    if !set.default.is_empty() {
        tag.push_str(&source_tag(&set, &set.default));
        tag.push('\n');
    }

    let src = urls.get(set.src_index).cloned().unwrap_or_default();
    let _ = write!(
        tag,
        "<img src=\"{}\" alt=\"{}\">\n</picture>",
        escape_html(&src),
        escape_html(&name)
    );
    tag
}
