//! Renderers for the viewer's custom components.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};
use serde_json::Value;

use crate::theme::parse_hex_color;
use crate::viewer::RenderNode;

use super::renderer::{ComponentRenderer, RenderContext, centered_rect, draw_line};

/// Draws `text` at `x` on `area`'s first row and registers it as clickable.
#[allow(clippy::too_many_arguments)]
fn clickable(
    cx: &mut RenderContext<'_>,
    buf: &mut Buffer,
    area: Rect,
    x: u16,
    text: &str,
    style: Style,
    command_id: Option<&str>,
    trigger: &str,
) -> u16 {
    let width = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
    if x >= area.right() {
        return x;
    }
    let cell = Rect::new(x, area.y, width.min(area.right() - x), 1);
    draw_line(buf, cell, &Line::from(Span::styled(text.to_string(), style)));
    if let Some(command_id) = command_id {
        cx.add_hit(cell, command_id, Some(trigger));
    }
    x + width
}

/// `- 125% +`, with the percentage opening the zoom menu.
pub struct ZoomRenderer;

impl ZoomRenderer {
    fn percent(node: &RenderNode) -> String {
        let level = node.props.f64("zoomLevel").unwrap_or(1.0);
        format!(" {:.0}% ", level * 100.0)
    }
}

impl ComponentRenderer for ZoomRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let props = &node.props;
        let plain = cx.palette.control_style(false, false);
        let menu_style = cx
            .palette
            .control_style(props.bool("zoomMenuActive").unwrap_or(false), false);

        let mut x = area.x;
        x = clickable(cx, buf, area, x, "[-]", plain, props.str("commandZoomOut"), &node.id);
        let percent = Self::percent(node);
        x = clickable(cx, buf, area, x, &percent, menu_style, props.str("commandZoomMenu"), &node.id);
        clickable(cx, buf, area, x, "[+]", plain, props.str("commandZoomIn"), &node.id);
    }

    fn width(&self, node: &RenderNode, _cx: &RenderContext<'_>) -> u16 {
        6 + u16::try_from(Self::percent(node).len()).unwrap_or(0)
    }
}

/// `< 3 / 10 >`
pub struct PageControlsRenderer;

impl PageControlsRenderer {
    fn counter(node: &RenderNode) -> String {
        let current = node.props.u64("currentPage").unwrap_or(1);
        let total = node.props.u64("pageCount").unwrap_or(1);
        format!(" {current} / {total} ")
    }
}

impl ComponentRenderer for PageControlsRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let props = &node.props;
        let current = props.u64("currentPage").unwrap_or(1);
        let total = props.u64("pageCount").unwrap_or(1);
        let style = cx.palette.control_style(false, false);
        let edge = cx.palette.control_style(false, true);

        let previous = (current > 1).then(|| props.str("previousPageCommandId")).flatten();
        let next = (current < total).then(|| props.str("nextPageCommandId")).flatten();

        let mut x = area.x;
        let prev_style = if previous.is_some() { style } else { edge };
        x = clickable(cx, buf, area, x, " ‹", prev_style, previous, &node.id);
        let counter = Self::counter(node);
        x = clickable(cx, buf, area, x, &counter, style.add_modifier(Modifier::BOLD), None, &node.id);
        let next_style = if next.is_some() { style } else { edge };
        clickable(cx, buf, area, x, "› ", next_style, next, &node.id);
    }

    fn width(&self, node: &RenderNode, _cx: &RenderContext<'_>) -> u16 {
        4 + u16::try_from(Self::counter(node).len()).unwrap_or(0)
    }
}

pub struct SearchRenderer;

impl ComponentRenderer for SearchRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let props = &node.props;
        let palette = cx.palette;
        let query = props.str("query").unwrap_or_default();
        let mut lines = vec![if query.is_empty() {
            Line::from(Span::styled("Press / to search", Style::default().fg(palette.base_03)))
        } else {
            Line::from(vec![
                Span::styled("Query: ", Style::default().fg(palette.base_04)),
                Span::styled(query.to_string(), Style::default().fg(palette.base_06)),
            ])
        }];

        if props.bool("loading").unwrap_or(false) {
            lines.push(Line::from("Searching..."));
        } else if props.bool("active").unwrap_or(false) {
            let total = props.u64("total").unwrap_or(0);
            lines.push(Line::from(format!("{total} result(s)")));
        }

        let active = props.u64("activeResultIndex");
        let results = props
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for (index, hit) in results.iter().enumerate() {
            let page = hit.get("pageIndex").and_then(Value::as_u64).unwrap_or(0) + 1;
            let excerpt = hit.get("excerpt").and_then(Value::as_str).unwrap_or_default();
            let style = if active == Some(index as u64) {
                palette.selection_style()
            } else {
                Style::default().fg(palette.base_05)
            };
            lines.push(Line::from(Span::styled(format!("p.{page} {excerpt}"), style)));
        }

        Paragraph::new(lines).render(area, buf);
    }

    fn height(&self, node: &RenderNode, _cx: &RenderContext<'_>) -> u16 {
        let results = node
            .props
            .get("results")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        u16::try_from(results + 2).unwrap_or(u16::MAX)
    }
}

pub struct ThumbnailsRenderer;

impl ComponentRenderer for ThumbnailsRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let count = node.props.u64("pageCount").unwrap_or(0);
        if count == 0 {
            draw_line(buf, area, &Line::from("No pages"));
            return;
        }
        let current = node.props.u64("currentPage").unwrap_or(1);
        let rows = u64::from(area.height.max(1));
        // Keep the current page on screen.
        let first = current.saturating_sub(rows).saturating_add(1).max(1);

        for (row, page) in (first..=count).take(rows as usize).enumerate() {
            let style = if page == current {
                cx.palette.selection_style()
            } else {
                Style::default().fg(cx.palette.base_05)
            };
            let line = Rect::new(area.x, area.y + row as u16, area.width, 1);
            draw_line(buf, line, &Line::from(Span::styled(format!(" Page {page}"), style)));
        }
    }

    fn height(&self, node: &RenderNode, _cx: &RenderContext<'_>) -> u16 {
        u16::try_from(node.props.u64("pageCount").unwrap_or(1).max(1)).unwrap_or(u16::MAX)
    }
}

/// Outline and attachment lists. Neither is read from the file, so a
/// loaded document shows the empty state.
pub struct DocumentListRenderer {
    empty: &'static str,
}

impl DocumentListRenderer {
    pub fn outline() -> Self {
        Self {
            empty: "No outline entries",
        }
    }

    pub fn attachments() -> Self {
        Self {
            empty: "No attachments",
        }
    }
}

impl ComponentRenderer for DocumentListRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let text = match node.props.get("document") {
            Some(Value::Null) | None => "No document",
            Some(_) => self.empty,
        };
        let style = Style::default().fg(cx.palette.base_03);
        draw_line(buf, area, &Line::from(Span::styled(text, style)));
    }
}

/// Sidebar tabs from `tabsCommandId` over the visible child.
pub struct LeftPanelMainRenderer;

impl ComponentRenderer for LeftPanelMainRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let commands = cx.commands();
        let state = cx.state;
        let mut x = area.x;
        if let Some(menu) = node.props.str("tabsCommandId").and_then(|id| commands.resolve(id)) {
            for tab in commands.children(menu).filter(|t| t.is_visible(state)) {
                let style = cx
                    .palette
                    .control_style(tab.is_active(state), tab.is_disabled(state));
                let text = format!(" {} ", tab.label(state));
                x = clickable(cx, buf, area, x, &text, style, Some(&tab.id), &node.id);
            }
        }

        let body = Rect::new(
            area.x,
            area.y.saturating_add(2),
            area.width,
            area.height.saturating_sub(2),
        );
        let shown = node.props.str("visibleChild");
        let child = node
            .children
            .iter()
            .find(|c| Some(c.id.as_str()) == shown)
            .or(node.children.first());
        if let Some(child) = child {
            cx.render_node(child, body, buf);
        }
    }
}

/// Style controls for the armed tool or selected annotation.
pub struct AnnotationStyleRenderer;

impl ComponentRenderer for AnnotationStyleRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let props = &node.props;
        let palette = cx.palette;
        let dim = Style::default().fg(palette.base_04);
        let mut lines = Vec::new();

        match props.get("selectedAnnotation") {
            Some(selected) if !selected.is_null() => {
                let subtype = selected.get("subtype").and_then(Value::as_str).unwrap_or("?");
                let page = selected.get("page_index").and_then(Value::as_u64).unwrap_or(0) + 1;
                lines.push(Line::from(format!("{subtype} on page {page}")));
                if let Some(color) = selected.get("color").and_then(Value::as_str) {
                    lines.push(swatch_line("Color ", color, dim));
                }
            }
            _ => {
                let variant = props.str("activeVariant").unwrap_or("none");
                lines.push(Line::from(vec![
                    Span::styled("Tool: ", dim),
                    Span::raw(variant.to_string()),
                ]));
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Presets", dim)));
        let presets: Vec<Span> = props
            .strings("colorPresets")
            .iter()
            .filter_map(|hex| parse_hex_color(hex))
            .map(|color| Span::styled("■ ", Style::default().fg(color)))
            .collect();
        lines.push(Line::from(presets));

        Paragraph::new(lines).wrap(Wrap { trim: true }).render(area, buf);
    }
}

fn swatch_line(label: &'static str, hex: &str, style: Style) -> Line<'static> {
    let mut spans = vec![Span::styled(label, style)];
    if let Some(color) = parse_hex_color(hex) {
        spans.push(Span::styled("■ ", Style::default().fg(color)));
    }
    spans.push(Span::raw(hex.to_string()));
    Line::from(spans)
}

/// Print dialog. The terminal cannot print, so it offers a download instead.
pub struct PrintModalRenderer;

impl ComponentRenderer for PrintModalRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(50, 30, area);
        Clear.render(popup, buf);
        let palette = cx.palette;
        let block = Block::default()
            .title(" Print ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.base_0c))
            .style(Style::default().bg(palette.base_00));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let text = vec![
            Line::from("Printing is not available in the terminal."),
            Line::from(""),
            Line::from(Span::styled(
                "[ Save a copy ]",
                palette.control_style(false, false).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled("Esc to close", Style::default().fg(palette.base_03))),
        ];
        Paragraph::new(text).wrap(Wrap { trim: true }).render(inner, buf);
        if inner.height > 2 {
            let button = Rect::new(inner.x, inner.y + 2, 15.min(inner.width), 1);
            cx.add_hit(button, "download", Some(&node.id));
        }
    }

    fn height(&self, _node: &RenderNode, _cx: &RenderContext<'_>) -> u16 {
        u16::MAX
    }
}
