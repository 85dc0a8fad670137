//! Region layout: which component trees go where, for one snapshot.

use std::fmt;

use crate::component::ComponentKind;
use crate::props::Props;

/// Width used when the caller has no surface to measure.
pub const DEFAULT_LAYOUT_WIDTH_PX: u32 = 1024;

/// Maximum slot nesting; deeper trees are cut off.
pub(super) const MAX_DEPTH: usize = 32;

/// One component instance ready for its renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub id: String,
    pub kind: ComponentKind,
    pub renderer: String,
    pub props: Props,
    /// Context handed down by ancestors.
    pub context: Props,
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    /// Depth-first search by component id.
    pub fn find(&self, id: &str) -> Option<&RenderNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn command_id(&self) -> Option<&str> {
        self.props.str("commandId")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLayer {
    Render,
    Tiling,
    Search,
    Annotation,
    MarqueeZoom,
    MarqueeCapture,
    Selection,
}

impl PageLayer {
    /// Bottom to top.
    pub const STACK: [PageLayer; 7] = [
        PageLayer::Render,
        PageLayer::Tiling,
        PageLayer::Search,
        PageLayer::Annotation,
        PageLayer::MarqueeZoom,
        PageLayer::MarqueeCapture,
        PageLayer::Selection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageLayer::Render => "render",
            PageLayer::Tiling => "tiling",
            PageLayer::Search => "search",
            PageLayer::Annotation => "annotation",
            PageLayer::MarqueeZoom => "marqueeZoom",
            PageLayer::MarqueeCapture => "marqueeCapture",
            PageLayer::Selection => "selection",
        }
    }
}

impl fmt::Display for PageLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewportContent {
    Loading(&'static str),
    Pages {
        /// 1-based page numbers on screen, two when spread.
        visible_pages: Vec<usize>,
        layers: Vec<PageLayer>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderRegions {
    pub top: Vec<RenderNode>,
    pub bottom: Vec<RenderNode>,
    pub left: Vec<RenderNode>,
    pub right: Vec<RenderNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelRegions {
    pub left: Vec<RenderNode>,
    pub right: Vec<RenderNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatingRegions {
    pub inside_scroller: Vec<RenderNode>,
    pub outside_scroller: Vec<RenderNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerLayout {
    pub headers: HeaderRegions,
    pub panels: PanelRegions,
    pub viewport: ViewportContent,
    pub floating: FloatingRegions,
    pub command_menu: Option<RenderNode>,
}

impl ViewerLayout {
    /// Every root node, in region order.
    pub fn roots(&self) -> impl Iterator<Item = &RenderNode> {
        self.headers
            .top
            .iter()
            .chain(&self.headers.left)
            .chain(&self.panels.left)
            .chain(&self.floating.inside_scroller)
            .chain(&self.floating.outside_scroller)
            .chain(&self.panels.right)
            .chain(&self.headers.right)
            .chain(&self.headers.bottom)
            .chain(self.command_menu.iter())
    }

    pub fn find(&self, id: &str) -> Option<&RenderNode> {
        self.roots().find_map(|root| root.find(id))
    }
}

/// Whether a slot with `class_name` shows at `width_px`.
///
/// Tokens apply left to right: `hidden` hides, `block`/`flex` show, and
/// `@min-[Npx]:token` applies `token` only when `width_px >= N`.
pub fn slot_visible(class_name: Option<&str>, width_px: u32) -> bool {
    let Some(class_name) = class_name else {
        return true;
    };
    let mut visible = true;
    for token in class_name.split_whitespace() {
        let effect = match token.strip_prefix("@min-[") {
            Some(rest) => {
                let Some((bound, effect)) = rest.split_once("]:") else {
                    continue;
                };
                let Some(min) = bound.strip_suffix("px").and_then(|n| n.parse::<u32>().ok())
                else {
                    continue;
                };
                if width_px < min {
                    continue;
                }
                effect
            }
            None => token,
        };
        match effect {
            "hidden" => visible = false,
            "block" | "flex" | "inline" | "inline-flex" => visible = true,
            _ => {}
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_apply_in_order() {
        let class = Some("hidden @min-[400px]:block @min-[600px]:hidden");
        assert!(!slot_visible(class, 300));
        assert!(slot_visible(class, 400));
        assert!(slot_visible(class, 599));
        assert!(!slot_visible(class, 600));
    }

    #[test]
    fn plain_classes() {
        assert!(slot_visible(None, 0));
        assert!(slot_visible(Some("flex"), 0));
        assert!(!slot_visible(Some("hidden"), 10_000));
        assert!(slot_visible(Some("@min-[400px]:hidden"), 399));
        assert!(!slot_visible(Some("@min-[400px]:hidden"), 400));
        assert!(slot_visible(Some("@min-[bogus]:hidden"), 400));
    }

    #[test]
    fn layer_stack_order() {
        let names: Vec<_> = PageLayer::STACK.iter().map(PageLayer::as_str).collect();
        assert_eq!(
            names,
            vec![
                "render",
                "tiling",
                "search",
                "annotation",
                "marqueeZoom",
                "marqueeCapture",
                "selection"
            ]
        );
    }
}
