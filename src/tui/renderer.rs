use std::sync::Arc;

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::Line;

use crate::command::CommandRegistry;
use crate::store::GlobalState;
use crate::theme::Base16Palette;
use crate::viewer::{RenderNode, Viewer};

use super::{containers, custom, controls};

/// Draws one kind of component into a buffer.
pub trait ComponentRenderer: Send + Sync {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer);

    /// Columns wanted when laid out in a row.
    fn width(&self, node: &RenderNode, cx: &RenderContext<'_>) -> u16 {
        let _ = (node, cx);
        1
    }

    /// Rows wanted when laid out in a column.
    fn height(&self, node: &RenderNode, cx: &RenderContext<'_>) -> u16 {
        let _ = (node, cx);
        1
    }
}

/// A clickable area and the command it activates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitTarget {
    pub area: Rect,
    pub command_id: String,
    /// Component that owns the area, passed on as a menu trigger.
    pub trigger: Option<String>,
}

/// Everything a renderer may read while drawing one frame.
pub struct RenderContext<'a> {
    pub viewer: &'a Viewer,
    pub state: &'a GlobalState,
    pub palette: &'a Base16Palette,
    hits: Vec<HitTarget>,
}

impl<'a> RenderContext<'a> {
    pub fn new(viewer: &'a Viewer, state: &'a GlobalState, palette: &'a Base16Palette) -> Self {
        Self {
            viewer,
            state,
            palette,
            hits: Vec::new(),
        }
    }

    pub fn commands(&self) -> &'a CommandRegistry {
        self.viewer.commands()
    }

    /// Hands `node` to its registered renderer.
    pub fn render_node(&mut self, node: &RenderNode, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let viewer = self.viewer;
        if let Some(renderer) = viewer.renderer(&node.renderer) {
            renderer.render(node, self, area, buf);
        }
    }

    pub fn node_width(&self, node: &RenderNode) -> u16 {
        self.viewer
            .renderer(&node.renderer)
            .map_or(0, |r| r.width(node, self))
    }

    pub fn node_height(&self, node: &RenderNode) -> u16 {
        self.viewer
            .renderer(&node.renderer)
            .map_or(0, |r| r.height(node, self))
    }

    pub fn add_hit(&mut self, area: Rect, command_id: &str, trigger: Option<&str>) {
        if area.is_empty() {
            return;
        }
        self.hits.push(HitTarget {
            area,
            command_id: command_id.to_string(),
            trigger: trigger.map(str::to_string),
        });
    }

    pub fn into_hits(self) -> Vec<HitTarget> {
        self.hits
    }

    /// Lays `children` left to right from `area.x`, clipped to `area`.
    pub fn render_row(&mut self, children: &[RenderNode], area: Rect, buf: &mut Buffer, gap: u16) {
        let mut x = area.x;
        let right = area.right();
        for child in children {
            if x >= right {
                break;
            }
            let width = self.node_width(child).min(right - x);
            if width == 0 {
                continue;
            }
            self.render_node(child, Rect::new(x, area.y, width, 1), buf);
            x = x.saturating_add(width).saturating_add(gap);
        }
    }

    /// Stacks `children` top to bottom, clipped to `area`.
    pub fn render_column(&mut self, children: &[RenderNode], area: Rect, buf: &mut Buffer) {
        let mut y = area.y;
        let bottom = area.bottom();
        for child in children {
            if y >= bottom {
                break;
            }
            let height = self.node_height(child).min(bottom - y);
            if height == 0 {
                continue;
            }
            self.render_node(child, Rect::new(area.x, y, area.width, height), buf);
            y += height;
        }
    }

    pub fn row_width(&self, children: &[RenderNode], gap: u16) -> u16 {
        let widths: Vec<u16> = children
            .iter()
            .map(|c| self.node_width(c))
            .filter(|w| *w > 0)
            .collect();
        let gaps = gap.saturating_mul(widths.len().saturating_sub(1) as u16);
        widths.iter().fold(gaps, |acc, w| acc.saturating_add(*w))
    }
}

/// Writes `line` into the first row of `area`, clipped.
pub(super) fn draw_line(buf: &mut Buffer, area: Rect, line: &Line<'_>) {
    if area.is_empty() {
        return;
    }
    buf.set_line(area.x, area.y, line, area.width);
}

/// Whether a container lays its children out top to bottom.
pub(super) fn is_vertical(node: &RenderNode) -> bool {
    node.context.str("direction") == Some("vertical")
}

/// Columns between row items for a pixel gap.
pub(super) fn gap_columns(node: &RenderNode) -> u16 {
    node.props
        .u64("gap")
        .map_or(1, |px| if px == 0 { 0 } else { 1 })
}

/// A `percent_x` by `percent_y` rect centered in `r`.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn entry<R>(key: &'static str, renderer: R) -> (&'static str, Arc<dyn ComponentRenderer>)
where
    R: ComponentRenderer + 'static,
{
    (key, Arc::new(renderer))
}

/// One terminal renderer per renderer key the catalog uses.
pub fn default_renderers() -> Vec<(&'static str, Arc<dyn ComponentRenderer>)> {
    vec![
        entry("iconButton", controls::IconButtonRenderer),
        entry("tabButton", controls::TabButtonRenderer),
        entry("selectButton", controls::SelectButtonRenderer),
        entry("divider", controls::DividerRenderer),
        entry("groupedItems", containers::GroupedItemsRenderer),
        entry("header", containers::HeaderRenderer),
        entry("panel", containers::PanelRenderer),
        entry("pageControlsContainer", containers::FloatingRenderer),
        entry("textSelectionMenu", containers::TextSelectionMenuRenderer),
        entry("commandMenu", super::command_menu::CommandMenuRenderer),
        entry("zoom", custom::ZoomRenderer),
        entry("pageControls", custom::PageControlsRenderer),
        entry("search", custom::SearchRenderer),
        entry("thumbnails", custom::ThumbnailsRenderer),
        entry("outline", custom::DocumentListRenderer::outline()),
        entry("attachments", custom::DocumentListRenderer::attachments()),
        entry("leftPanelMain", custom::LeftPanelMainRenderer),
        entry("leftPanelAnnotationStyle", custom::AnnotationStyleRenderer),
        entry("printModal", custom::PrintModalRenderer),
    ]
}
