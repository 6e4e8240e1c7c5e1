//! Node registry: the class and display-name mappings the host loads.

use crate::core::node::{Category, FilterNode, NodeMetadata};
use indexmap::IndexMap;
use serde_json::json;
use std::sync::Arc;

/// Factory function for creating node instances.
pub type FilterFactory = Arc<dyn Fn() -> Box<dyn FilterNode> + Send + Sync>;

/// Registry entry containing metadata and factory.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Factory function to create instances.
    pub factory: FilterFactory,
    /// Cached metadata (avoids creating an instance just to read it).
    pub metadata: NodeMetadata,
    /// Whether this node is offered to the host.
    pub enabled: bool,
    /// Tags for organization and search.
    pub tags: Vec<String>,
}

/// Registry of node types keyed by their host identifier.
///
/// Registration order is preserved so the host lists nodes the way they
/// were registered.
pub struct FilterRegistry {
    filters: IndexMap<String, RegistryEntry>,
    categories: IndexMap<Category, Vec<String>>,
}

impl FilterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            filters: IndexMap::new(),
            categories: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in nodes.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::filters::builtin::register_all(&mut registry);
        registry
    }

    /// Register a node type.
    ///
    /// Registering an id twice replaces the earlier entry.
    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn FilterNode> + Send + Sync + 'static,
    {
        self.register_with_tags(factory, Vec::new());
    }

    /// Register a node type with additional tags.
    pub fn register_with_tags<F>(&mut self, factory: F, tags: Vec<String>)
    where
        F: Fn() -> Box<dyn FilterNode> + Send + Sync + 'static,
    {
        let metadata = factory().metadata();
        let id = metadata.id.clone();
        let category = metadata.category;

        if self.filters.contains_key(&id) {
            log::warn!("Node type '{}' registered twice; replacing", id);
            self.unregister(&id);
        }

        let mut all_tags = metadata.tags.clone();
        all_tags.extend(tags);
        let entry = RegistryEntry {
            factory: Arc::new(factory),
            metadata,
            enabled: true,
            tags: all_tags,
        };

        log::debug!("Registered node type '{}'", id);
        self.filters.insert(id.clone(), entry);
        self.categories.entry(category).or_default().push(id);
    }

    /// Create a new instance of a node by id.
    pub fn create(&self, id: &str) -> Option<Box<dyn FilterNode>> {
        self.filters.get(id).filter(|e| e.enabled).map(|e| (e.factory)())
    }

    /// Get metadata for a node without creating an instance.
    pub fn get_metadata(&self, id: &str) -> Option<&NodeMetadata> {
        self.filters.get(id).map(|e| &e.metadata)
    }

    pub fn get_entry(&self, id: &str) -> Option<&RegistryEntry> {
        self.filters.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.filters.contains_key(id)
    }

    /// All registered node ids in registration order.
    pub fn filter_ids(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(|s| s.as_str())
    }

    pub fn filters(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Ids of the nodes in `category`.
    pub fn filters_by_category(&self, category: &Category) -> Vec<&str> {
        self.categories
            .get(category)
            .map(|ids| ids.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.keys()
    }

    /// Search nodes by id, name, description or tag.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();

        self.filters
            .iter()
            .filter(|(_, entry)| {
                let name_match = entry.metadata.name.to_lowercase().contains(&query);
                let desc_match = entry.metadata.description.to_lowercase().contains(&query);
                let tag_match = entry.tags.iter().any(|t| t.to_lowercase().contains(&query));
                let id_match = entry.metadata.id.to_lowercase().contains(&query);

                name_match || desc_match || tag_match || id_match
            })
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Enable or disable a node. Returns false for unknown ids.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        if let Some(entry) = self.filters.get_mut(id) {
            entry.enabled = enabled;
            true
        } else {
            false
        }
    }

    /// Unregister a node. Returns false for unknown ids.
    pub fn unregister(&mut self, id: &str) -> bool {
        if let Some(entry) = self.filters.shift_remove(id) {
            if let Some(ids) = self.categories.get_mut(&entry.metadata.category) {
                ids.retain(|i| i != id);
            }
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.filters.values().filter(|e| e.enabled).count()
    }

    /// Map of node id to human-readable name for every enabled node.
    pub fn display_name_mappings(&self) -> IndexMap<&str, &str> {
        self.filters
            .iter()
            .filter(|(_, e)| e.enabled)
            .map(|(id, e)| (id.as_str(), e.metadata.name.as_str()))
            .collect()
    }

    /// Registration document for the host: per node its inputs, return
    /// types, menu category and display name.
    pub fn schema_json(&self) -> serde_json::Value {
        let nodes: serde_json::Map<String, serde_json::Value> = self
            .filters
            .iter()
            .filter(|(_, e)| e.enabled)
            .map(|(id, e)| {
                let meta = &e.metadata;
                let schema = json!({
                    "display_name": meta.name,
                    "category": meta.category.host_path(),
                    "description": meta.description,
                    "input": meta.input_types(),
                    "output": meta.return_types(),
                    "output_name": meta.output_names(),
                    "output_node": meta.has_ui_output,
                });
                (id.clone(), schema)
            })
            .collect();
        serde_json::Value::Object(nodes)
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Builder for a customized registry.
pub struct RegistryBuilder {
    registry: FilterRegistry,
    include_builtins: bool,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: FilterRegistry::new(),
            include_builtins: true,
        }
    }

    /// Include or exclude the built-in nodes.
    pub fn with_builtins(mut self, include: bool) -> Self {
        self.include_builtins = include;
        self
    }

    /// Register a custom node.
    pub fn register<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn FilterNode> + Send + Sync + 'static,
    {
        self.registry.register(factory);
        self
    }

    pub fn build(mut self) -> FilterRegistry {
        if self.include_builtins {
            crate::filters::builtin::register_all(&mut self.registry);
        }
        self.registry
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
