//! End-to-end asset pipeline tests.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use vellum_assets::{
    CombineFiles, CompareMode, ImageFormat, ImageOptions, ImageResource, ImageResources,
    OutputStrategy, PlainUrlManager, Rendered, Result, ScriptOptions, ScriptResource,
    ScriptResources, UrlManager, VariantSpec,
};

/// Combine collaborator that concatenates its sources into one file on
/// disk, the way the external combine store would.
struct FileCombine {
    root: PathBuf,
    sources: Vec<String>,
    output_name: String,
    strategy: Arc<Mutex<OutputStrategy>>,
}

impl FileCombine {
    fn new(root: PathBuf) -> (Self, Arc<Mutex<OutputStrategy>>) {
        let strategy = Arc::new(Mutex::new(OutputStrategy::Manual));
        (
            Self {
                root,
                sources: Vec::new(),
                output_name: String::new(),
                strategy: strategy.clone(),
            },
            strategy,
        )
    }
}

impl CombineFiles for FileCombine {
    fn add_source(&mut self, source: &str) {
        self.sources.push(source.to_string());
    }

    fn set_output_file_name(&mut self, name: &str) {
        self.output_name = name.to_string();
    }

    fn set_output_strategy(&mut self, strategy: OutputStrategy) {
        *self.strategy.lock().unwrap() = strategy;
    }

    fn combine(&mut self) -> Result<()> {
        let mut content = String::new();
        for source in &self.sources {
            if let Ok(text) = std::fs::read_to_string(self.root.join(source)) {
                content.push_str(&text);
                content.push('\n');
            }
        }
        std::fs::write(self.root.join(self.path()), content)?;
        Ok(())
    }

    fn path(&self) -> String {
        format!("{}.js", self.output_name)
    }
}

/// Prefixes every path with a site base.
struct BaseUrlManager;

impl UrlManager for BaseUrlManager {
    fn url(&self, path: &str, add_base: bool, _check_base: bool) -> String {
        if add_base {
            format!("https://cdn.example/{path}")
        } else {
            format!("/{path}")
        }
    }
}

#[test]
fn combined_scripts_merge_into_one_artifact() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("a.js"), "var a = 1;").unwrap();
    std::fs::write(temp.path().join("b.js"), "var b = 2;").unwrap();

    let mut manager = ScriptResources::new(Box::new(BaseUrlManager));
    manager.add_group("frame", &[]).unwrap();

    let mut resource = ScriptResource::new(
        "app",
        vec!["a.js".to_string(), "b.js".to_string()],
        ScriptOptions {
            combine: true,
            async_load: true,
        },
    )
    .unwrap();
    let (combine, _strategy) = FileCombine::new(temp.path().to_path_buf());
    resource.set_combine_object(Box::new(combine));
    manager.add(resource, Some("frame")).unwrap();

    let html = manager.render_html(None).unwrap();

    // one script tag, combined URL without the site base
    assert_eq!(
        html,
        "<script src=\"/frame_app.js\" type=\"text/javascript\"></script>"
    );
    let merged = std::fs::read_to_string(temp.path().join("frame_app.js")).unwrap();
    assert!(merged.contains("var a = 1;"));
    assert!(merged.contains("var b = 2;"));
}

#[test]
fn colliding_names_switch_to_auto_naming() {
    let temp = tempfile::tempdir().unwrap();
    let mut manager = ScriptResources::new(Box::new(BaseUrlManager));
    manager.add_group("bar", &[]).unwrap();

    let mut strategies = Vec::new();
    for _ in 0..2 {
        let mut resource = ScriptResource::new(
            "foo",
            vec!["a.js".to_string()],
            ScriptOptions {
                combine: true,
                async_load: true,
            },
        )
        .unwrap();
        let (combine, strategy) = FileCombine::new(temp.path().to_path_buf());
        resource.set_combine_object(Box::new(combine));
        manager.add(resource, Some("bar")).unwrap();
        strategies.push(strategy);
    }

    assert_eq!(*strategies[0].lock().unwrap(), OutputStrategy::Manual);
    assert_eq!(*strategies[1].lock().unwrap(), OutputStrategy::Auto);
}

#[test]
fn image_pipeline_builds_then_skips_then_renders() {
    let temp = tempfile::tempdir().unwrap();
    image::RgbImage::from_pixel(400, 200, image::Rgb([10, 20, 30]))
        .save(temp.path().join("hero.png"))
        .unwrap();

    let mut options = ImageOptions::new(temp.path(), "cache");
    options.compare_mode = CompareMode::Full;
    let mut variant = VariantSpec::new(200, 100, ImageFormat::Png);
    variant.srcset_width = 200;
    options.variants = vec![variant];

    let resource =
        ImageResource::new("hero", vec!["hero.png".to_string()], options).unwrap();

    let records = resource.save(None).unwrap();
    assert_eq!(records.len(), 1);
    assert!(temp.path().join("cache/hero_200x100.png").exists());

    // second build against the recorded provenance is a no-op
    let rebuilt = resource.save(Some(&records)).unwrap();
    assert!(rebuilt.is_empty());

    let mut manager = ImageResources::new(Box::new(PlainUrlManager));
    manager.add(resource, None);
    let Rendered::Fragments(fragments) = manager.render("html_img", None).unwrap() else {
        panic!("expected fragments");
    };
    assert!(fragments[0].contains("src=\"cache/hero_200x100.png\""));
}
