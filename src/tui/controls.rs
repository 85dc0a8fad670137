//! Single-row controls: buttons, tabs, select buttons and dividers.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use serde_json::Value;

use crate::theme::parse_hex_color;
use crate::viewer::RenderNode;

use super::renderer::{ComponentRenderer, RenderContext, draw_line, is_vertical};

fn flag(node: &RenderNode, key: &str) -> bool {
    node.props.bool(key).unwrap_or(false)
}

fn label(node: &RenderNode) -> &str {
    node.props.str("label").unwrap_or(&node.id)
}

/// Annotation tools tint their icon; the terminal shows it as a swatch.
fn swatch(node: &RenderNode) -> Option<Span<'static>> {
    let color = node
        .props
        .get("iconProps")
        .and_then(|p| p.get("primaryColor"))
        .and_then(Value::as_str)
        .and_then(parse_hex_color)?;
    Some(Span::styled("■", Style::default().fg(color)))
}

fn text_width(text: &str) -> u16 {
    u16::try_from(text.chars().count()).unwrap_or(u16::MAX)
}

pub struct IconButtonRenderer;

impl ComponentRenderer for IconButtonRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let disabled = flag(node, "disabled");
        let style = cx.palette.control_style(flag(node, "active"), disabled);
        let mut spans: Vec<Span> = swatch(node).into_iter().collect();
        spans.push(Span::styled(format!(" {} ", label(node)), style));
        draw_line(buf, area, &Line::from(spans));

        if !disabled {
            if let Some(command_id) = node.command_id() {
                cx.add_hit(area, command_id, Some(&node.id));
            }
        }
    }

    fn width(&self, node: &RenderNode, _cx: &RenderContext<'_>) -> u16 {
        let swatch = u16::from(swatch(node).is_some());
        text_width(label(node)) + 2 + swatch
    }
}

pub struct TabButtonRenderer;

impl ComponentRenderer for TabButtonRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let active = flag(node, "active");
        let disabled = flag(node, "disabled");
        let mut style = if active {
            Style::default()
                .fg(cx.palette.base_0d)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            cx.palette.control_style(false, disabled)
        };
        if disabled {
            style = style.add_modifier(Modifier::DIM);
        }
        draw_line(buf, area, &Line::from(Span::styled(format!(" {} ", label(node)), style)));

        if !disabled {
            if let Some(command_id) = node.command_id() {
                cx.add_hit(area, command_id, Some(&node.id));
            }
        }
    }

    fn width(&self, node: &RenderNode, _cx: &RenderContext<'_>) -> u16 {
        text_width(label(node)) + 2
    }
}

/// Shows whichever of `commandIds` is active and opens `menuCommandId`.
pub struct SelectButtonRenderer;

impl SelectButtonRenderer {
    fn text(node: &RenderNode, cx: &RenderContext<'_>) -> String {
        let current = node
            .props
            .str("activeCommandId")
            .and_then(|id| cx.commands().resolve(id))
            .map(|item| item.label(cx.state))
            .unwrap_or_else(|| label(node).to_string());
        format!(" {current} ▾ ")
    }
}

impl ComponentRenderer for SelectButtonRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let style = cx.palette.control_style(flag(node, "active"), false);
        let text = Self::text(node, cx);
        draw_line(buf, area, &Line::from(Span::styled(text, style)));
        if let Some(menu) = node.props.str("menuCommandId") {
            cx.add_hit(area, menu, Some(&node.id));
        }
    }

    fn width(&self, node: &RenderNode, cx: &RenderContext<'_>) -> u16 {
        text_width(&Self::text(node, cx))
    }
}

pub struct DividerRenderer;

impl ComponentRenderer for DividerRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let glyph = if is_vertical(node) { "─" } else { "│" };
        let style = Style::default().fg(cx.palette.base_03);
        draw_line(buf, area, &Line::from(Span::styled(glyph, style)));
    }
}
