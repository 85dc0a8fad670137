//! The popup listing a menu command's children.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, StatefulWidget, Widget};

use crate::command::{CommandRegistry, MenuItemKind};
use crate::store::GlobalState;
use crate::viewer::{COMMAND_MENU, RenderNode};

use super::renderer::{ComponentRenderer, RenderContext, centered_rect};

const MAX_GROUP_DEPTH: usize = 8;

/// One selectable row of the command menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub command_id: String,
    pub label: String,
    pub shortcut: Option<String>,
    pub active: bool,
    pub disabled: bool,
    pub submenu: bool,
    pub divider_before: bool,
}

/// Visible children of `menu_id`, with groups spliced in place.
pub fn menu_entries(commands: &CommandRegistry, state: &GlobalState, menu_id: &str) -> Vec<MenuEntry> {
    let mut entries = Vec::new();
    if let Some(menu) = commands.resolve(menu_id) {
        collect(commands, state, menu, false, 0, &mut entries);
    }
    entries
}

fn collect(
    commands: &CommandRegistry,
    state: &GlobalState,
    parent: &crate::command::MenuItem,
    divider: bool,
    depth: usize,
    out: &mut Vec<MenuEntry>,
) {
    if depth > MAX_GROUP_DEPTH {
        return;
    }
    let mut pending_divider = divider;
    for item in commands.children(parent).filter(|i| i.is_visible(state)) {
        if item.kind == MenuItemKind::Group {
            collect(commands, state, item, true, depth + 1, out);
            pending_divider = true;
            continue;
        }
        out.push(MenuEntry {
            command_id: item.id.clone(),
            label: item.label(state),
            shortcut: item.shortcut.as_ref().map(|s| s.label.clone()),
            active: item.is_active(state),
            disabled: item.is_disabled(state),
            submenu: item.kind == MenuItemKind::Menu,
            divider_before: pending_divider || item.divider_before,
        });
        pending_divider = false;
    }
}

/// Cursor position stored in the menu's local state, clamped to `len`.
pub fn selected_index(node: &RenderNode, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let selected = node.props.u64("selected").unwrap_or(0) as usize;
    Some(selected.min(len - 1))
}

pub struct CommandMenuRenderer;

impl ComponentRenderer for CommandMenuRenderer {
    fn render(&self, node: &RenderNode, cx: &mut RenderContext<'_>, area: Rect, buf: &mut Buffer) {
        let Some(menu_id) = node.props.str("activeCommand") else {
            return;
        };
        let commands = cx.commands();
        let Some(menu) = commands.resolve(menu_id) else {
            return;
        };
        let entries = menu_entries(commands, cx.state, menu_id);
        let palette = cx.palette;

        let popup = centered_rect(40, 60, area);
        let wanted = u16::try_from(entries.len() + 2).unwrap_or(u16::MAX).max(3);
        let popup = Rect {
            height: popup.height.min(wanted),
            ..popup
        };
        Clear.render(popup, buf);

        let items: Vec<ListItem> = entries
            .iter()
            .map(|entry| {
                let style = if entry.disabled {
                    Style::default().fg(palette.base_03)
                } else {
                    Style::default().fg(palette.base_05)
                };
                let mut style = style;
                if entry.divider_before {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                let mut spans = vec![
                    Span::styled(if entry.active { "✓ " } else { "  " }, style),
                    Span::styled(entry.label.clone(), style),
                ];
                if let Some(shortcut) = &entry.shortcut {
                    spans.push(Span::styled(
                        format!("  {shortcut}"),
                        Style::default().fg(palette.base_04),
                    ));
                }
                if entry.submenu {
                    spans.push(Span::styled(" ›", style));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let block = Block::default()
            .title(format!(" {} ", menu.label(cx.state)))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.base_0c))
            .style(Style::default().bg(palette.base_00));
        let inner = block.inner(popup);
        let list = List::new(items)
            .block(block)
            .highlight_style(palette.selection_style())
            .highlight_symbol("» ");

        let mut list_state = ListState::default();
        list_state.select(selected_index(node, entries.len()));
        StatefulWidget::render(list, popup, buf, &mut list_state);

        let offset = list_state.offset();
        for (row, entry) in entries.iter().enumerate().skip(offset) {
            let y = inner.y + (row - offset) as u16;
            if y >= inner.bottom() {
                break;
            }
            if !entry.disabled {
                cx.add_hit(
                    Rect::new(inner.x, y, inner.width, 1),
                    &entry.command_id,
                    Some(COMMAND_MENU),
                );
            }
        }
    }
}
