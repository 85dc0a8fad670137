//! Components whose only job is arranging their children.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Widget};

use crate::viewer::RenderNode;

use super::renderer::{ComponentRenderer, RenderContext, gap_columns, is_vertical};

fn max_child_width(node: &RenderNode, cx: &RenderContext<'_>) -> u16 {
    node.children
        .iter()
        .map(|c| cx.node_width(c))
        .max()
        .unwrap_or(0)
}

fn column_height(node: &RenderNode, cx: &RenderContext<'_>) -> u16 {
    node.children
        .iter()
        .fold(0u16, |acc, c| acc.saturating_add(cx.node_height(c)))
}

pub struct GroupedItemsRenderer;

impl ComponentRenderer for GroupedItemsRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        if is_vertical(node) {
            cx.render_column(&node.children, area, buf);
        } else {
            cx.render_row(&node.children, area, buf, gap_columns(node));
        }
    }

    fn width(&self, node: &RenderNode, cx: &RenderContext<'_>) -> u16 {
        if is_vertical(node) {
            max_child_width(node, cx)
        } else {
            cx.row_width(&node.children, gap_columns(node))
        }
    }

    fn height(&self, node: &RenderNode, cx: &RenderContext<'_>) -> u16 {
        if is_vertical(node) { column_height(node, cx) } else { 1 }
    }
}

/// Toolbars along an edge of the viewer.
pub struct HeaderRenderer;

impl ComponentRenderer for HeaderRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, cx.palette.header_style());
        let placement = node.props.str("placement").unwrap_or("top");
        if matches!(placement, "left" | "right") {
            cx.render_column(&node.children, area, buf);
            return;
        }

        let centered = node
            .props
            .get("style")
            .and_then(|s| s.get("justifyContent"))
            .and_then(|v| v.as_str())
            == Some("center");
        if centered {
            let total = cx.row_width(&node.children, 1);
            let offset = area.width.saturating_sub(total) / 2;
            let row = Rect::new(area.x + offset, area.y, area.width - offset, 1);
            cx.render_row(&node.children, row, buf, 1);
            return;
        }

        // First child hugs the start edge, the last the end edge, the rest
        // share the middle.
        let Some((first, rest)) = node.children.split_first() else {
            return;
        };
        let first_width = cx.node_width(first).min(area.width);
        cx.render_node(first, Rect::new(area.x, area.y, first_width, 1), buf);

        let Some((last, middle)) = rest.split_last() else {
            return;
        };
        let last_width = cx.node_width(last).min(area.width.saturating_sub(first_width));
        let last_x = area.right() - last_width;
        cx.render_node(last, Rect::new(last_x, area.y, last_width, 1), buf);

        let free = Rect::new(
            area.x + first_width,
            area.y,
            last_x.saturating_sub(area.x + first_width),
            1,
        );
        let middle_width = cx.row_width(middle, 1);
        let offset = free.width.saturating_sub(middle_width) / 2;
        let row = Rect::new(free.x + offset, free.y, free.width - offset, 1);
        cx.render_row(middle, row, buf, 1);
    }

    fn width(&self, node: &RenderNode, cx: &RenderContext<'_>) -> u16 {
        max_child_width(node, cx)
    }

    fn height(&self, node: &RenderNode, cx: &RenderContext<'_>) -> u16 {
        match node.props.str("placement") {
            Some("left" | "right") => column_height(node, cx),
            _ => 1,
        }
    }
}

fn panel_title(child: Option<&RenderNode>) -> &str {
    match child.map(|c| c.id.as_str()) {
        Some("search") => "Search",
        Some("leftPanelMain") => "Sidebar",
        Some("leftPanelAnnotationStyle") => "Annotation Style",
        Some(other) => other,
        None => "",
    }
}

/// A bordered sidebar showing its single visible child.
pub struct PanelRenderer;

impl ComponentRenderer for PanelRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let (border, title, background) = cx.palette.panel_colors(true);
        let child = node.children.first();
        let block = Block::default()
            .title(format!(" {} ", panel_title(child)))
            .title_style(Style::default().fg(title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(background));
        let inner = block.inner(area);
        block.render(area, buf);
        if let Some(child) = child {
            cx.render_node(child, inner, buf);
        }
    }

    fn width(&self, _node: &RenderNode, _cx: &RenderContext<'_>) -> u16 {
        28
    }
}

/// Floating surfaces anchored to the viewport; children sit centered.
pub struct FloatingRenderer;

impl ComponentRenderer for FloatingRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let total = cx.row_width(&node.children, 1).min(area.width);
        let offset = (area.width - total) / 2;
        let row = Rect::new(area.x + offset, area.y, total, 1);
        Clear.render(row, buf);
        buf.set_style(row, cx.palette.header_style());
        cx.render_row(&node.children, row, buf, 1);
    }

    fn width(&self, node: &RenderNode, cx: &RenderContext<'_>) -> u16 {
        cx.row_width(&node.children, 1)
    }
}

/// Bordered toolbar over the current text selection.
pub struct TextSelectionMenuRenderer;

impl ComponentRenderer for TextSelectionMenuRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let width = self.width(node, cx).min(area.width);
        let popup = Rect::new(area.x, area.y, width, area.height.min(3));
        Clear.render(popup, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(cx.palette.base_0c))
            .style(Style::default().bg(cx.palette.base_01));
        let inner = block.inner(popup);
        block.render(popup, buf);
        cx.render_row(&node.children, inner, buf, 1);
    }

    fn width(&self, node: &RenderNode, cx: &RenderContext<'_>) -> u16 {
        cx.row_width(&node.children, 1).saturating_add(2)
    }

    fn height(&self, _node: &RenderNode, _cx: &RenderContext<'_>) -> u16 {
        3
    }
}
