//! TextBlock Component
//!
//! A borderless, scrollable text region with a one-line title. Editable
//! blocks accept typed keys and pasted text and show the cursor at the end
//! of their content while focused.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Clear, Widget};
use termshell_core::{
    Component, ComponentRef, FocusDelegate, Gesture, KeyCode, KeyEvent, KeyModifiers,
    MouseButton, PointerOutcome, PointerSample, ScrollDirection, Surface,
};
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

/// Lines moved per wheel tick
const SCROLL_STEP: i32 = 3;

/// State for a scrollable text block
#[derive(Debug, Default)]
pub struct TextBlockState {
    /// Scroll offset (lines from top)
    pub scroll_offset: usize,
    /// Total content lines at the last draw
    pub total_lines: usize,
    /// Visible content lines at the last draw
    pub visible_lines: usize,
}

impl TextBlockState {
    /// Scroll by delta (positive = down)
    pub fn scroll(&mut self, delta: i32) {
        let offset = i64::try_from(self.scroll_offset).unwrap_or(i64::MAX) + i64::from(delta);
        self.scroll_offset = usize::try_from(offset.max(0)).unwrap_or(0);
    }

    /// Scroll to bottom
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.total_lines.saturating_sub(self.visible_lines);
    }

    fn at_bottom(&self) -> bool {
        self.scroll_offset + self.visible_lines >= self.total_lines
    }
}

struct Inner {
    content: String,
    rect: Rect,
    state: TextBlockState,
    focused: bool,
}

/// A titled, scrollable block of wrapped text
pub struct TextBlock {
    me: Weak<TextBlock>,
    title: String,
    editable: bool,
    style: Style,
    inner: Mutex<Inner>,
}

impl TextBlock {
    /// A read-only block
    #[must_use]
    pub fn new(title: impl Into<String>) -> Arc<Self> {
        Self::build(title.into(), false)
    }

    /// A block that takes keys and pasted text
    #[must_use]
    pub fn editable(title: impl Into<String>) -> Arc<Self> {
        Self::build(title.into(), true)
    }

    fn build(title: String, editable: bool) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            title,
            editable,
            style: Style::default(),
            inner: Mutex::new(Inner {
                content: String::new(),
                rect: Rect::default(),
                state: TextBlockState::default(),
                focused: false,
            }),
        })
    }

    /// This block as a component handle
    #[must_use]
    pub fn component(self: &Arc<Self>) -> ComponentRef {
        Arc::clone(self) as ComponentRef
    }

    /// Append text, following the tail if the view was at the bottom
    pub fn append(&self, text: &str) {
        let mut inner = self.inner.lock();
        let follow = inner.state.at_bottom();
        inner.content.push_str(text);
        if follow {
            inner.state.total_lines = wrap_lines(&inner.content, inner.rect.width).len();
            inner.state.scroll_to_bottom();
        }
    }

    /// Append a line of text
    pub fn push_line(&self, line: &str) {
        let mut text = String::with_capacity(line.len() + 1);
        if !self.inner.lock().content.is_empty() {
            text.push('\n');
        }
        text.push_str(line);
        self.append(&text);
    }

    /// Current content
    #[must_use]
    pub fn content(&self) -> String {
        self.inner.lock().content.clone()
    }

    /// Current scroll offset
    #[must_use]
    pub fn scroll_offset(&self) -> usize {
        self.inner.lock().state.scroll_offset
    }

    fn scroll(&self, delta: i32) {
        self.inner.lock().state.scroll(delta);
    }

    fn edit(&self, key: KeyEvent) -> bool {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return false;
        }
        let mut inner = self.inner.lock();
        match key.code {
            KeyCode::Char(c) => inner.content.push(c),
            KeyCode::Enter => inner.content.push('\n'),
            KeyCode::Backspace => {
                inner.content.pop();
            }
            _ => return false,
        }
        inner.state.total_lines = wrap_lines(&inner.content, inner.rect.width).len();
        inner.state.scroll_to_bottom();
        true
    }
}

impl Component for TextBlock {
    fn draw(&self, surface: &dyn Surface) {
        let (cursor, focused) = {
            let mut inner = self.inner.lock();
            let rect = inner.rect;
            let focused = inner.focused;
            let Inner { content, state, .. } = &mut *inner;
            let mut cursor = None;
            surface.with_buffer(&mut |buf| {
                let area = buf.area.intersection(rect);
                if area.is_empty() {
                    return;
                }
                Clear.render(area, buf);
                let title_style = if focused {
                    self.style.add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    self.style.add_modifier(Modifier::BOLD)
                };
                buf.set_stringn(
                    area.x,
                    area.y,
                    &self.title,
                    usize::from(area.width),
                    title_style,
                );

                let body = Rect {
                    y: area.y + 1,
                    height: area.height.saturating_sub(1),
                    ..area
                };
                cursor = render_body(content, body, buf, state, self.style);
            });
            (cursor, focused)
        };

        if self.editable && focused {
            if let Some((x, y)) = cursor {
                surface.show_cursor(x, y);
            }
        }
    }

    fn set_rect(&self, rect: Rect) {
        self.inner.lock().rect = rect;
    }

    fn rect(&self) -> Rect {
        self.inner.lock().rect
    }

    fn handle_key(&self, key: KeyEvent, _set_focus: FocusDelegate<'_>) {
        if self.editable && self.edit(key) {
            return;
        }
        let page = i32::try_from(self.inner.lock().state.visible_lines.max(1)).unwrap_or(1);
        match key.code {
            KeyCode::Up => self.scroll(-1),
            KeyCode::Down => self.scroll(1),
            KeyCode::PageUp => self.scroll(-page),
            KeyCode::PageDown => self.scroll(page),
            KeyCode::Home => self.inner.lock().state.scroll_offset = 0,
            KeyCode::End => self.inner.lock().state.scroll_to_bottom(),
            _ => {}
        }
    }

    fn handle_paste(&self, text: &str, _set_focus: FocusDelegate<'_>) {
        if self.editable {
            self.append(text);
        }
    }

    fn handle_pointer(
        &self,
        gesture: Gesture,
        _sample: &PointerSample,
        set_focus: FocusDelegate<'_>,
    ) -> PointerOutcome {
        match gesture {
            Gesture::Scroll(ScrollDirection::Up) => self.scroll(-SCROLL_STEP),
            Gesture::Scroll(ScrollDirection::Down) => self.scroll(SCROLL_STEP),
            Gesture::Down(MouseButton::Primary) => {
                if let Some(me) = self.me.upgrade() {
                    set_focus(me);
                }
            }
            _ => return PointerOutcome::ignored(),
        }
        PointerOutcome::consumed()
    }

    fn focus(&self, _delegate: FocusDelegate<'_>) {
        self.inner.lock().focused = true;
    }

    fn blur(&self) {
        self.inner.lock().focused = false;
    }

    fn has_focus(&self) -> bool {
        self.inner.lock().focused
    }
}

/// Wrap text to width, keeping empty lines
fn wrap_lines(content: &str, width: u16) -> Vec<String> {
    let width = usize::from(width.max(1));
    let mut lines: Vec<String> = content
        .split('\n')
        .flat_map(|line| {
            if line.is_empty() {
                vec![String::new()]
            } else {
                wrap(line, width)
                    .into_iter()
                    .map(|cow| cow.to_string())
                    .collect()
            }
        })
        .collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Render wrapped text into `area`; returns the end-of-text cursor if visible
fn render_body(
    content: &str,
    area: Rect,
    buf: &mut Buffer,
    state: &mut TextBlockState,
    style: Style,
) -> Option<(u16, u16)> {
    if area.is_empty() {
        return None;
    }
    let wrapped = wrap_lines(content, area.width);

    state.total_lines = wrapped.len();
    state.visible_lines = usize::from(area.height);

    // Clamp scroll
    let max_scroll = state.total_lines.saturating_sub(state.visible_lines);
    state.scroll_offset = state.scroll_offset.min(max_scroll);

    let mut cursor = None;
    for (i, line) in wrapped
        .iter()
        .enumerate()
        .skip(state.scroll_offset)
        .take(state.visible_lines)
    {
        let row = u16::try_from(i - state.scroll_offset).unwrap_or(u16::MAX);
        let y = area.y.saturating_add(row);
        buf.set_stringn(area.x, y, line, usize::from(area.width), style);
        if i + 1 == wrapped.len() {
            let column = u16::try_from(line.width()).unwrap_or(u16::MAX);
            cursor = Some((area.x + column.min(area.width - 1), y));
        }
    }
    cursor
}
