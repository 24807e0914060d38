//! Named resource groups with dependency-ordered emission.
//!
//! Copyright (c) 2025 Posit, PBC

use std::collections::HashSet;

use hashlink::LinkedHashMap;

use crate::error::{AssetError, Result};
use crate::resource::is_valid_name;

/// One declared group: its dependencies and registered resources.
#[derive(Debug, Clone)]
pub struct GroupEntry<R> {
    pub dependencies: Vec<String>,
    pub resources: Vec<R>,
}

/// Named groups of same-type resources plus an `unknown` bucket for
/// resources registered without a group.
///
/// Groups emit in dependency order: every group appears after all of its
/// transitive dependencies, exactly once, stable on registration order
/// otherwise.
#[derive(Debug, Default)]
pub struct ResourceGroups<R> {
    groups: LinkedHashMap<String, GroupEntry<R>>,
    unknown: Vec<R>,
}

impl<R> ResourceGroups<R> {
    pub fn new() -> Self {
        Self {
            groups: LinkedHashMap::new(),
            unknown: Vec::new(),
        }
    }

    /// Declare a group. Re-declaring an existing name is a no-op; the
    /// original dependency list wins.
    pub fn add_group(&mut self, name: &str, dependencies: &[&str]) -> Result<()> {
        if !is_valid_name(name) {
            return Err(AssetError::InvalidName {
                name: name.to_string(),
            });
        }

        if !self.groups.contains_key(name) {
            self.groups.insert(
                name.to_string(),
                GroupEntry {
                    dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
                    resources: Vec::new(),
                },
            );
        }

        Ok(())
    }

    /// Register a resource. A missing or undeclared group lands the
    /// resource in the `unknown` bucket.
    pub fn add_resource(&mut self, resource: R, group: Option<&str>) {
        match group.and_then(|g| self.groups.get_mut(g)) {
            Some(entry) => entry.resources.push(resource),
            None => self.unknown.push(resource),
        }
    }

    /// Empty every group's resource list and the unknown bucket, keeping
    /// the group declarations.
    pub fn clear_resources(&mut self) {
        self.unknown.clear();
        for (_, entry) in self.groups.iter_mut() {
            entry.resources.clear();
        }
    }

    pub fn get(&self, name: &str) -> Option<&GroupEntry<R>> {
        self.groups.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut GroupEntry<R>> {
        self.groups.get_mut(name)
    }

    pub fn unknown(&self) -> &[R] {
        &self.unknown
    }

    pub fn unknown_mut(&mut self) -> &mut [R] {
        &mut self.unknown
    }

    /// Group names in dependency-topological order.
    pub fn resolve(&self) -> Result<Vec<String>> {
        let mut emitted = Vec::new();
        let mut done = HashSet::new();
        let mut trail = Vec::new();

        for name in self.groups.keys() {
            self.visit(name, &mut done, &mut trail, &mut emitted)?;
        }

        Ok(emitted)
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        done: &mut HashSet<&'a str>,
        trail: &mut Vec<&'a str>,
        emitted: &mut Vec<String>,
    ) -> Result<()> {
        if done.contains(name) {
            return Ok(());
        }

        if trail.contains(&name) {
            let mut cycle: Vec<String> = trail
                .iter()
                .skip_while(|n| **n != name)
                .map(|n| n.to_string())
                .collect();
            cycle.push(name.to_string());
            return Err(AssetError::CyclicDependency { cycle });
        }

        let entry = self
            .groups
            .get(name)
            .ok_or_else(|| AssetError::UnknownDependency {
                group: trail.last().unwrap_or(&"").to_string(),
                dependency: name.to_string(),
            })?;

        trail.push(name);
        for dependency in &entry.dependencies {
            self.visit(dependency, done, trail, emitted)?;
        }
        trail.pop();

        done.insert(name);
        emitted.push(name.to_string());
        Ok(())
    }
}
