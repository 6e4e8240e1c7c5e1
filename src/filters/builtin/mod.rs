//! Built-in node implementations.

mod free_drag_crop;

use crate::filters::registry::FilterRegistry;

/// Register all built-in nodes.
pub fn register_all(registry: &mut FilterRegistry) {
    free_drag_crop::register(registry);
}

pub use free_drag_crop::FreeDragCrop;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = FilterRegistry::with_builtins();
        assert!(registry.contains(FreeDragCrop::ID));
        assert_eq!(
            registry.display_name_mappings().get(FreeDragCrop::ID),
            Some(&"Free Drag Crop (Interactive)")
        );
        assert_eq!(registry.search("interactive"), vec![FreeDragCrop::ID]);
    }
}
