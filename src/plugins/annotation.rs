use std::sync::Arc;

use log::{debug, info};

use crate::capability::AnnotationCapability;
use crate::store::{AnnotationObject, AnnotationRef, Store, StoreAction, ToolDefaults};
use crate::variant::{AnnotationSubtype, VariantKey};

/// Keeps annotations in the store, one list per page.
pub struct AnnotationPlugin {
    store: Arc<Store>,
}

impl AnnotationPlugin {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl AnnotationCapability for AnnotationPlugin {
    fn set_active_variant(&self, variant: Option<VariantKey>) {
        debug!(
            "Active tool: {}",
            variant.as_ref().map_or("none".to_string(), |v| v.to_string())
        );
        self.store.dispatch(StoreAction::SetActiveVariant(variant));
    }

    fn active_variant(&self) -> Option<VariantKey> {
        self.store.snapshot().plugins.annotation.active_variant.clone()
    }

    fn tool_defaults(&self, subtype: AnnotationSubtype) -> ToolDefaults {
        self.store.snapshot().plugins.annotation.tool_defaults(subtype)
    }

    fn create_annotation(&self, annotation: AnnotationObject) {
        debug!(
            "Creating {} annotation {} on page {}",
            annotation.subtype, annotation.id, annotation.page_index
        );
        self.store.dispatch(StoreAction::AddAnnotation(annotation));
    }

    fn select_annotation(&self, page_index: usize, id: &str) {
        self.store
            .dispatch(StoreAction::SelectAnnotation(Some(AnnotationRef {
                page_index,
                id: id.to_string(),
            })));
    }

    fn deselect_annotation(&self) {
        self.store.dispatch(StoreAction::SelectAnnotation(None));
    }

    fn selected_annotation(&self) -> Option<AnnotationObject> {
        self.store
            .snapshot()
            .plugins
            .annotation
            .selected_annotation()
            .cloned()
    }

    fn delete_annotation(&self, target: &AnnotationRef) {
        self.store
            .dispatch(StoreAction::RemoveAnnotation(target.clone()));
    }

    fn commit(&self) {
        let count = self.store.snapshot().plugins.annotation.count();
        if self.store.dispatch(StoreAction::CommitAnnotations) {
            info!("Committed {count} annotation(s)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BlendMode, PageRect};
    use chrono::Utc;

    fn markup(id: &str) -> AnnotationObject {
        AnnotationObject {
            id: id.into(),
            subtype: AnnotationSubtype::Underline,
            page_index: 0,
            rect: PageRect::new(1.0, 2.0, 3.0, 4.0),
            segment_rects: vec![],
            blend_mode: BlendMode::Normal,
            color: Some("#E44234".into()),
            opacity: 1.0,
            created: Utc::now(),
            text: None,
        }
    }

    #[test]
    fn create_select_delete() {
        let store = Arc::new(Store::default());
        let plugin = AnnotationPlugin::new(store.clone());

        plugin.create_annotation(markup("a1"));
        plugin.select_annotation(0, "a1");
        assert_eq!(plugin.selected_annotation().map(|a| a.id), Some("a1".into()));
        assert!(store.snapshot().plugins.annotation.has_pending_changes);

        plugin.commit();
        assert!(!store.snapshot().plugins.annotation.has_pending_changes);

        plugin.delete_annotation(&AnnotationRef {
            page_index: 0,
            id: "a1".into(),
        });
        assert!(plugin.selected_annotation().is_none());
        assert_eq!(store.snapshot().plugins.annotation.count(), 0);
    }
}
