//! SplitPane Container
//!
//! Two children side by side with a draggable divider. The pane never keeps
//! focus itself: focusing it hands focus to the active child, and a press
//! inside a child makes that child active. Dragging the divider captures the
//! pointer until the button is released.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use termshell_core::{
    rect_contains, Component, ComponentRef, FocusDelegate, Gesture, MouseButton, PointerOutcome,
    PointerSample, Surface,
};

/// Divider position bounds, in percent of the pane width
const MIN_PERCENT: u16 = 10;
const MAX_PERCENT: u16 = 90;

struct Inner {
    rect: Rect,
    percent: u16,
    active: usize,
    dragging: bool,
}

/// Horizontal split of two components
pub struct SplitPane {
    me: Weak<SplitPane>,
    children: [ComponentRef; 2],
    inner: Mutex<Inner>,
}

impl SplitPane {
    /// Split `left` and `right` evenly; `left` starts active
    #[must_use]
    pub fn new(left: ComponentRef, right: ComponentRef) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            children: [left, right],
            inner: Mutex::new(Inner {
                rect: Rect::default(),
                percent: 50,
                active: 0,
                dragging: false,
            }),
        })
    }

    /// This pane as a component handle
    #[must_use]
    pub fn component(self: &Arc<Self>) -> ComponentRef {
        Arc::clone(self) as ComponentRef
    }

    /// Width share of the left child
    #[must_use]
    pub fn percent(&self) -> u16 {
        self.inner.lock().percent
    }

    /// Whether the divider is being dragged
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.inner.lock().dragging
    }

    /// Make the other child active and return it
    pub fn cycle(&self) -> ComponentRef {
        let mut inner = self.inner.lock();
        inner.active = 1 - inner.active;
        Arc::clone(&self.children[inner.active])
    }

    /// The active child
    #[must_use]
    pub fn active(&self) -> ComponentRef {
        Arc::clone(&self.children[self.inner.lock().active])
    }

    fn areas(rect: Rect, percent: u16) -> [Rect; 3] {
        Layout::horizontal([
            Constraint::Percentage(percent),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(rect)
    }

    fn relayout(&self) {
        let (rect, percent) = {
            let inner = self.inner.lock();
            (inner.rect, inner.percent)
        };
        let [left, _, right] = Self::areas(rect, percent);
        self.children[0].set_rect(left);
        self.children[1].set_rect(right);
    }

    fn drag(&self, gesture: Gesture, sample: &PointerSample) -> PointerOutcome {
        match gesture {
            Gesture::Up(MouseButton::Primary) => {
                self.inner.lock().dragging = false;
                return PointerOutcome::consumed();
            }
            Gesture::Move => {
                {
                    let mut inner = self.inner.lock();
                    let rect = inner.rect;
                    if rect.width > 0 {
                        let offset = u32::from(sample.x.saturating_sub(rect.x));
                        let percent = offset * 100 / u32::from(rect.width);
                        inner.percent = u16::try_from(percent)
                            .unwrap_or(MAX_PERCENT)
                            .clamp(MIN_PERCENT, MAX_PERCENT);
                    }
                }
                self.relayout();
            }
            _ => {}
        }
        match self.me.upgrade() {
            Some(me) => PointerOutcome::capture(me),
            None => PointerOutcome::consumed(),
        }
    }
}

impl Component for SplitPane {
    fn draw(&self, surface: &dyn Surface) {
        for child in &self.children {
            child.draw(surface);
        }

        let (rect, percent, dragging) = {
            let inner = self.inner.lock();
            (inner.rect, inner.percent, inner.dragging)
        };
        let [_, divider, _] = Self::areas(rect, percent);
        let style = if dragging {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        surface.with_buffer(&mut |buf| {
            let area = buf.area.intersection(divider);
            for y in area.top()..area.bottom() {
                buf.set_string(area.x, y, "│", style);
            }
        });
    }

    fn set_rect(&self, rect: Rect) {
        self.inner.lock().rect = rect;
        self.relayout();
    }

    fn rect(&self) -> Rect {
        self.inner.lock().rect
    }

    fn handle_pointer(
        &self,
        gesture: Gesture,
        sample: &PointerSample,
        set_focus: FocusDelegate<'_>,
    ) -> PointerOutcome {
        if self.is_dragging() {
            return self.drag(gesture, sample);
        }

        let (rect, percent) = {
            let inner = self.inner.lock();
            (inner.rect, inner.percent)
        };
        let [_, divider, _] = Self::areas(rect, percent);
        if gesture == Gesture::Down(MouseButton::Primary)
            && rect_contains(divider, sample.x, sample.y)
        {
            self.inner.lock().dragging = true;
            return self.drag(gesture, sample);
        }

        let hit = self
            .children
            .iter()
            .position(|child| rect_contains(child.rect(), sample.x, sample.y));
        let Some(index) = hit else {
            return PointerOutcome::ignored();
        };
        let child = Arc::clone(&self.children[index]);
        if gesture.is_down() {
            self.inner.lock().active = index;
            set_focus(Arc::clone(&child));
        }
        child.handle_pointer(gesture, sample, set_focus)
    }

    fn focus(&self, delegate: FocusDelegate<'_>) {
        delegate(self.active());
    }

    fn blur(&self) {}

    fn has_focus(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::TextBlock;
    use termshell_core::Buttons;

    fn pane() -> (Arc<SplitPane>, Arc<TextBlock>, Arc<TextBlock>) {
        let left = TextBlock::new("left");
        let right = TextBlock::new("right");
        let split = SplitPane::new(left.component(), right.component());
        split.set_rect(Rect::new(0, 0, 41, 10));
        (split, left, right)
    }

    #[test]
    fn test_children_share_width_around_divider() {
        let (split, left, right) = pane();
        let (l, r) = (left.rect(), right.rect());
        assert_eq!(l.x, 0);
        assert_eq!(l.width + 1 + r.width, split.rect().width);
        assert_eq!(r.x, l.width + 1);
    }

    #[test]
    fn test_focus_is_delegated_to_active_child() {
        let (split, left, right) = pane();
        let focused = Mutex::new(None);
        split.focus(&|c| *focused.lock() = Some(c));
        let target = focused.lock().take().expect("delegated");
        assert!(termshell_core::same_component(&target, &left.component()));

        let next = split.cycle();
        assert!(termshell_core::same_component(&next, &right.component()));
    }

    #[test]
    fn test_press_on_divider_captures() {
        let (split, left, _) = pane();
        let x = left.rect().width;
        let sample = PointerSample::new(x, 3, Buttons::PRIMARY);

        let outcome = split.handle_pointer(Gesture::Down(MouseButton::Primary), &sample, &|_| {});

        assert!(outcome.consumed);
        assert!(outcome.capture.is_some());
        assert!(split.is_dragging());
    }
}
