//! FreeDragCrop: interactive crop of image and mask batches.

use crate::config::CropConfig;
use crate::core::context::{ExecutionContext, ValidationContext};
use crate::core::error::{ExecutionError, ValidationError};
use crate::core::node::{Category, FilterNode, NodeMetadata};
use crate::core::port::{ParameterDefinition, PortDefinition, UiHint};
use crate::core::types::{PortType, UiPayload, Value};
use crate::crop::{AspectRatio, CropExecutor, MAX_INSET, RATIO_PRESETS};
use crate::filters::registry::FilterRegistry;

/// Register the crop node.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(|| Box::new(FreeDragCrop));
}

/// Crops a batch by four edge insets chosen in the host's interactive UI.
///
/// Outputs the cropped images, the matching mask (all ones when no mask is
/// connected) and a JSON crop rectangle. When the context carries a preview
/// store, the un-cropped first image is saved as a preview and announced in
/// the UI payload.
#[derive(Debug, Clone)]
pub struct FreeDragCrop;

impl FreeDragCrop {
    /// Host identifier.
    pub const ID: &'static str = "FreeDragCrop";
    /// Host menu label.
    pub const DISPLAY_NAME: &'static str = "Free Drag Crop (Interactive)";
}

fn inset_parameter(name: &str, edge: &str) -> ParameterDefinition {
    ParameterDefinition::new(name, PortType::Integer, Value::Integer(0))
        .with_description(format!("Pixels removed from the {} edge", edge))
        .with_range(0.0, f64::from(MAX_INSET))
        .with_step(1.0)
        .with_ui_hint(UiHint::SpinBox)
}

impl FilterNode for FreeDragCrop {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::builder(Self::ID, Self::DISPLAY_NAME)
            .category(Category::Process)
            .description("Crop images and masks by dragging a rectangle over a preview")
            .version("1.0.0")
            .input(
                PortDefinition::input("image", PortType::Image)
                    .with_description("Batch of images to crop"),
            )
            .input(
                PortDefinition::input("mask", PortType::Mask)
                    .optional()
                    .with_description("Mask cropped alongside the image"),
            )
            .parameter(inset_parameter("crop_left", "left"))
            .parameter(inset_parameter("crop_right", "right"))
            .parameter(inset_parameter("crop_top", "top"))
            .parameter(inset_parameter("crop_bottom", "bottom"))
            .parameter(
                ParameterDefinition::new(
                    "aspect_ratio",
                    PortType::String,
                    Value::String("1:1".to_string()),
                )
                .optional()
                .with_description("Ratio the UI keeps while dragging, as W:H")
                .with_ui_hint(UiHint::Dropdown {
                    options: RATIO_PRESETS
                        .iter()
                        .chain(std::iter::once(&"Custom"))
                        .map(|s| s.to_string())
                        .collect(),
                }),
            )
            .parameter(
                ParameterDefinition::new("ratio_lock", PortType::Boolean, Value::Boolean(false))
                    .optional()
                    .with_description("Whether the UI enforces the aspect ratio")
                    .with_ui_hint(UiHint::Checkbox),
            )
            .output(PortDefinition::output("image", PortType::Image).with_description("Cropped images"))
            .output(PortDefinition::output("mask", PortType::Mask).with_description("Cropped mask"))
            .output(
                PortDefinition::output("crop_json", PortType::CropJson)
                    .with_description("Crop rectangle in original-image pixels"),
            )
            .tags(["crop", "interactive", "mask"])
            .ui_output()
            .build()
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), ValidationError> {
        let image = ctx.get_input_image("image")?;

        if let Some(mask) = ctx.get_input_mask_optional("mask")? {
            let expected = image.shape().mask_dims();
            let got = mask.dims();
            if expected != got {
                return Err(ValidationError::ShapeMismatch {
                    node_id: ctx.node_id,
                    port: "mask".to_string(),
                    expected: expected.to_vec(),
                    got: got.to_vec(),
                });
            }
        }

        // The ratio only drives the UI overlay; an unset one is fine.
        if ctx.has_parameter("aspect_ratio") {
            let ratio = ctx.get_string("aspect_ratio")?;
            if let Err(err) = AspectRatio::parse_strict(ratio) {
                log::warn!("Node {}: {}; the UI will use 1:1", ctx.node_id, err);
            }
        }

        Ok(())
    }

    fn execute(&self, ctx: &mut ExecutionContext) -> Result<(), ExecutionError> {
        let node_id = ctx.node_id;
        let config = CropConfig::from_parameters(ctx.parameters());
        let executor = CropExecutor::new(ctx.max_preview_dimension());
        let store = ctx.preview_store();

        let (output, preview) = {
            let image = ctx.get_input_image("image")?;
            let mask = ctx.get_input_mask_optional("mask")?;
            let output = executor
                .crop(image, mask, config.insets())
                .map_err(|source| ExecutionError::InvalidTensor { node_id, source })?;
            let preview = store.as_ref().map(|_| executor.preview(image));
            (output, preview)
        };

        let rect = output.rect;
        log::info!(
            "Node {}: cropped {} image(s) to {}x{} at ({}, {}) from {}x{}",
            node_id,
            output.image.batch_size(),
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            rect.orig_width,
            rect.orig_height
        );

        if let (Some(store), Some(preview)) = (store, preview) {
            let preview_ref = store
                .save_preview(&preview.raster)
                .map_err(|source| ExecutionError::Preview { node_id, source })?;
            ctx.set_ui(UiPayload::single(
                preview_ref,
                preview.scale,
                rect.orig_width,
                rect.orig_height,
            ));
        } else {
            log::debug!("Node {}: no preview store, skipping preview", node_id);
        }

        ctx.set_output("image", Value::Image(output.image))?;
        ctx.set_output("mask", Value::Mask(output.mask))?;
        ctx.set_output("crop_json", Value::String(rect.to_json()?))?;

        Ok(())
    }

    fn clone_box(&self) -> Box<dyn FilterNode> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::NodeId;
    use crate::core::tensor::{ImageBatch, MaskBatch};
    use crate::core::types::StorageKind;
    use crate::crop::CropRect;
    use crate::storage::{PreviewStore, TempDirStore};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context_with(image: ImageBatch, config: &CropConfig) -> ExecutionContext {
        let mut ctx = ExecutionContext::new(NodeId::new());
        ctx.add_input("image", Value::Image(image));
        for (name, value) in config.to_parameters() {
            ctx.add_parameter(name, value);
        }
        ctx
    }

    fn crop_config(left: u32, right: u32, top: u32, bottom: u32) -> CropConfig {
        CropConfig {
            crop_left: left,
            crop_right: right,
            crop_top: top,
            crop_bottom: bottom,
            ..CropConfig::default()
        }
    }

    #[test]
    fn test_metadata_matches_host_registration() {
        let metadata = FreeDragCrop.metadata();
        assert_eq!(metadata.id, "FreeDragCrop");
        assert_eq!(metadata.name, "Free Drag Crop (Interactive)");
        assert_eq!(metadata.category.host_path(), "image/process");
        assert_eq!(metadata.return_types(), vec!["IMAGE", "MASK", "CROP_JSON"]);
        assert!(metadata.has_ui_output);

        let types = metadata.input_types();
        assert_eq!(types["required"]["image"], json!(["IMAGE"]));
        assert_eq!(
            types["required"]["crop_left"],
            json!(["INT", {"default": 0, "min": 0, "max": 8192, "step": 1}])
        );
        assert_eq!(types["optional"]["mask"], json!(["MASK"]));
        assert_eq!(types["optional"]["aspect_ratio"], json!(["STRING", {"default": "1:1"}]));
        assert_eq!(types["optional"]["ratio_lock"], json!(["BOOLEAN", {"default": false}]));
    }

    #[test]
    fn test_execute_crops_and_reports_rect() {
        let image = ImageBatch::filled((2, 10, 10, 3), 0.5).unwrap();
        let mut ctx = context_with(image, &crop_config(8, 8, 2, 3));

        FreeDragCrop.execute(&mut ctx).unwrap();
        assert!(ctx.ui().is_none());

        let (outputs, _) = ctx.take_outputs();
        let cropped = outputs["image"].as_image().unwrap();
        assert_eq!(cropped.shape().width, 1);
        assert_eq!(cropped.shape().height, 5);
        assert_eq!(outputs["mask"].as_mask().unwrap().dims(), [2, 5, 1]);

        let rect = CropRect::from_json(outputs["crop_json"].as_string().unwrap()).unwrap();
        assert_eq!(
            rect,
            CropRect {
                x: 8,
                y: 2,
                width: 1,
                height: 5,
                orig_width: 10,
                orig_height: 10
            }
        );
    }

    #[test]
    fn test_execute_ignores_aspect_ratio() {
        let image = ImageBatch::filled((1, 20, 40, 3), 0.0).unwrap();
        let config = CropConfig {
            aspect_ratio: "16:9".to_string(),
            ratio_lock: true,
            ..crop_config(5, 5, 0, 0)
        };
        let mut ctx = context_with(image, &config);
        FreeDragCrop.execute(&mut ctx).unwrap();

        let (outputs, _) = ctx.take_outputs();
        assert_eq!(outputs["image"].as_image().unwrap().shape().width, 30);
        assert_eq!(outputs["image"].as_image().unwrap().shape().height, 20);
    }

    #[test]
    fn test_execute_writes_preview() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(TempDirStore::new(dir.path(), "dragcrop"));
        let image = ImageBatch::filled((1, 1080, 1920, 3), 0.25).unwrap();

        let mut ctx = ExecutionContext::with_preview(NodeId::new(), store.clone(), 1024);
        ctx.add_input("image", Value::Image(image));
        FreeDragCrop.execute(&mut ctx).unwrap();

        let ui = ctx.ui().unwrap().clone();
        assert_eq!(ui.orig_size, [1920, 1080]);
        assert!((ui.preview_scale[0] - 1024.0 / 1920.0).abs() < 1e-9);
        assert_eq!(ui.images[0].kind, StorageKind::Temp);

        let saved = image::open(store.path_of(&ui.images[0])).unwrap();
        assert_eq!((saved.width(), saved.height()), (1024, 576));
    }

    #[test]
    fn test_execute_rejects_misaligned_mask() {
        let image = ImageBatch::filled((1, 4, 4, 3), 0.0).unwrap();
        let mut ctx = context_with(image, &CropConfig::default());
        ctx.add_input("mask", Value::Mask(MaskBatch::ones(1, 4, 3).unwrap()));

        let err = FreeDragCrop.execute(&mut ctx).unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidTensor { .. }));
    }

    #[test]
    fn test_execute_rejects_non_mask_value() {
        let image = ImageBatch::filled((1, 4, 4, 3), 0.0).unwrap();
        let mut ctx = context_with(image, &CropConfig::default());
        ctx.add_input("mask", Value::Integer(7));

        let err = FreeDragCrop.execute(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Validation(ValidationError::TypeMismatch {
                expected: PortType::Mask,
                got: PortType::Integer,
            })
        ));
        assert!(!ctx.has_output("image"));
    }

    #[test]
    fn test_execute_treats_none_mask_as_absent() {
        let image = ImageBatch::filled((2, 4, 4, 3), 0.0).unwrap();
        let mut ctx = context_with(image, &crop_config(1, 0, 0, 1));
        ctx.add_input("mask", Value::None);

        FreeDragCrop.execute(&mut ctx).unwrap();
        let mask = ctx.outputs().get("mask").unwrap().as_mask().unwrap();
        assert_eq!(mask.dims(), [2, 3, 3]);
    }

    #[test]
    fn test_validate_mask_shape() {
        let mut ctx = ValidationContext::new(NodeId::new());
        ctx.add_input("image", Value::Image(ImageBatch::filled((2, 4, 4, 3), 0.0).unwrap()));
        assert!(FreeDragCrop.validate(&ctx).is_ok());

        ctx.add_input("mask", Value::Mask(MaskBatch::ones(1, 4, 4).unwrap()));
        let err = FreeDragCrop.validate(&ctx).unwrap_err();
        assert!(matches!(err, ValidationError::ShapeMismatch { ref port, .. } if port == "mask"));
    }

    #[test]
    fn test_validate_tolerates_bad_ratio() {
        let mut ctx = ValidationContext::new(NodeId::new());
        ctx.add_input("image", Value::Image(ImageBatch::filled((1, 4, 4, 3), 0.0).unwrap()));
        ctx.add_parameter("aspect_ratio", Value::String("Custom".to_string()));
        assert!(FreeDragCrop.validate(&ctx).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_string_ratio() {
        let mut ctx = ValidationContext::new(NodeId::new());
        ctx.add_input("image", Value::Image(ImageBatch::filled((1, 4, 4, 3), 0.0).unwrap()));
        ctx.add_parameter("aspect_ratio", Value::Integer(3));
        assert!(matches!(
            FreeDragCrop.validate(&ctx),
            Err(ValidationError::TypeMismatch { expected: PortType::String, got: PortType::Integer })
        ));
    }

    #[test]
    fn test_validate_allows_unset_ratio() {
        let mut ctx = ValidationContext::new(NodeId::new());
        ctx.add_input("image", Value::Image(ImageBatch::filled((1, 4, 4, 3), 0.0).unwrap()));
        assert!(!ctx.has_parameter("aspect_ratio"));
        assert!(FreeDragCrop.validate(&ctx).is_ok());
    }

    #[test]
    fn test_validate_requires_image() {
        let ctx = ValidationContext::new(NodeId::new());
        assert!(matches!(
            FreeDragCrop.validate(&ctx),
            Err(ValidationError::MissingRequiredInput { .. })
        ));
    }

    #[derive(Debug)]
    struct FailingStore;

    impl PreviewStore for FailingStore {
        fn save_preview(
            &self,
            _preview: &image::RgbImage,
        ) -> Result<crate::core::types::PreviewRef, crate::core::error::StorageError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[test]
    fn test_preview_failure_is_reported() {
        let mut ctx = ExecutionContext::with_preview(NodeId::new(), Arc::new(FailingStore), 1024);
        ctx.add_input("image", Value::Image(ImageBatch::filled((1, 2, 2, 3), 0.0).unwrap()));
        assert!(matches!(
            FreeDragCrop.execute(&mut ctx),
            Err(ExecutionError::Preview { .. })
        ));
    }
}
