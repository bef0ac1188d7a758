use eframe::egui::{Pos2, Vec2};

use crate::animation::ease_in_out_cubic;
use crate::options::{TooltipContent, TooltipStyle};

/// Seconds to fade the overlay in.
pub const FADE_IN: f64 = 0.2;
/// Seconds to fade the overlay out.
pub const FADE_OUT: f64 = 0.5;
/// Distance between the pointer and the overlay corner.
pub const POINTER_OFFSET: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipPhase {
    Hidden,
    Showing,
    Visible,
    Hiding,
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f32,
    to: f32,
    started_at: f64,
    duration: f64,
}

impl Fade {
    fn is_done(&self, now: f64) -> bool {
        now - self.started_at >= self.duration
    }

    fn opacity(&self, now: f64) -> f32 {
        if self.is_done(now) {
            return self.to;
        }
        let t = ((now - self.started_at) / self.duration).max(0.0);
        self.from + (self.to - self.from) * ease_in_out_cubic(t) as f32
    }
}

/// Top-left corner for an overlay of `size` next to `pointer`.
///
/// Bottom-right of the pointer by default; an axis that would overflow `viewport`
/// flips to the other side of the pointer.
pub fn tooltip_position(pointer: Pos2, size: Vec2, viewport: Vec2) -> Pos2 {
    let mut left = pointer.x + POINTER_OFFSET;
    let mut top = pointer.y + POINTER_OFFSET;

    if left + size.x > viewport.x {
        left = pointer.x - size.x - POINTER_OFFSET;
    }
    if top + size.y > viewport.y {
        top = pointer.y - size.y - POINTER_OFFSET;
    }

    Pos2::new(left, top)
}

/// The chart's single hover overlay: content, placement and fade state.
#[derive(Debug, Clone)]
pub struct TooltipController {
    style: TooltipStyle,
    content: TooltipContent,
    document: Option<usize>,
    displayed: bool,
    /// Opacity while no fade is running
    opacity: f32,
    fade: Option<Fade>,
    pointer: Pos2,
    viewport: Vec2,
    position: Pos2,
    size: Vec2,
}

impl TooltipController {
    pub fn new(style: TooltipStyle) -> Self {
        Self {
            size: Vec2::new(style.width, style.width / 2.0),
            style,
            content: TooltipContent::default(),
            document: None,
            displayed: false,
            opacity: 0.0,
            fade: None,
            pointer: Pos2::ZERO,
            viewport: Vec2::INFINITY,
            position: Pos2::ZERO,
        }
    }

    pub fn show(
        &mut self,
        document: usize,
        content: TooltipContent,
        pointer: Pos2,
        viewport: Vec2,
        now: f64,
    ) {
        self.interrupt(now);
        self.content = content;
        self.document = Some(document);
        self.displayed = true;
        self.fade = Some(Fade {
            from: self.opacity,
            to: 1.0,
            started_at: now,
            duration: FADE_IN,
        });
        self.move_to(pointer, viewport);
    }

    /// Reposition only; visibility and fades are untouched.
    pub fn move_to(&mut self, pointer: Pos2, viewport: Vec2) {
        self.pointer = pointer;
        self.viewport = viewport;
        self.position = tooltip_position(pointer, self.size, viewport);
    }

    pub fn hide(&mut self, now: f64) {
        self.interrupt(now);
        self.fade = Some(Fade {
            from: self.opacity,
            to: 0.0,
            started_at: now,
            duration: FADE_OUT,
        });
    }

    /// Settle a finished fade. A finished fade-out takes the overlay off screen.
    pub fn update(&mut self, now: f64) {
        let Some(fade) = self.fade else {
            return;
        };
        if fade.is_done(now) {
            self.opacity = fade.to;
            self.fade = None;
            if fade.to <= 0.0 {
                self.displayed = false;
                self.document = None;
            }
        }
    }

    /// Report the measured overlay size and re-clamp against the last pointer.
    pub fn set_size(&mut self, size: Vec2) {
        if size != self.size {
            self.size = size;
            self.position = tooltip_position(self.pointer, size, self.viewport);
        }
    }

    fn interrupt(&mut self, now: f64) {
        if let Some(fade) = self.fade.take() {
            self.opacity = fade.opacity(now);
        }
    }

    pub fn opacity(&self, now: f64) -> f32 {
        self.fade.map_or(self.opacity, |f| f.opacity(now))
    }

    pub fn phase(&self, now: f64) -> TooltipPhase {
        match self.fade {
            Some(f) if !f.is_done(now) && f.to > 0.0 => TooltipPhase::Showing,
            Some(f) if !f.is_done(now) => TooltipPhase::Hiding,
            Some(f) if f.to > 0.0 => TooltipPhase::Visible,
            Some(_) => TooltipPhase::Hidden,
            None if self.displayed && self.opacity > 0.0 => TooltipPhase::Visible,
            None => TooltipPhase::Hidden,
        }
    }

    pub fn is_transitioning(&self, now: f64) -> bool {
        self.fade.is_some_and(|f| !f.is_done(now))
    }

    pub fn is_displayed(&self) -> bool {
        self.displayed
    }

    pub fn document(&self) -> Option<usize> {
        self.document
    }

    pub fn content(&self) -> &TooltipContent {
        &self.content
    }

    pub fn style(&self) -> &TooltipStyle {
        &self.style
    }

    pub fn position(&self) -> Pos2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }
}
