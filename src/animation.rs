/// Rectangle geometry in its group's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl AnimRect {
    /// A `width` x `height` rectangle grown to fraction `t`, anchored on its own center.
    pub fn grown(width: f32, height: f32, t: f32) -> Self {
        Self {
            x: width / 2.0 * (1.0 - t),
            y: height / 2.0 * (1.0 - t),
            w: width * t,
            h: height * t,
        }
    }
}

/// Ease-out cubic: fast start, smooth deceleration
pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

/// Symmetric cubic ease-in-out, the default curve for fades
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// One timed transition, scheduled at a fixed offset from the start of the entrance.
#[derive(Debug, Clone, Copy)]
pub struct Stage {
    /// Seconds after the render instant
    pub delay: f64,
    /// Seconds
    pub duration: f64,
    pub ease: fn(f64) -> f64,
}

impl Stage {
    /// Eased progress in [0, 1] at `elapsed` seconds since the render instant.
    pub fn progress(&self, elapsed: f64) -> f64 {
        let local = elapsed - self.delay;
        if local <= 0.0 {
            return (self.ease)(0.0);
        }
        if self.duration <= 0.0 || local >= self.duration {
            return 1.0;
        }
        (self.ease)(local / self.duration)
    }

    pub fn end(&self) -> f64 {
        self.delay + self.duration
    }
}

/// Content group zooms from [`INITIAL_ZOOM`] to full size.
pub const ZOOM_STAGE: Stage = Stage {
    delay: 0.0,
    duration: 1.0,
    ease: ease_out_cubic,
};

/// Each rectangle grows out of its own midpoint.
pub const GROW_STAGE: Stage = Stage {
    delay: 0.0,
    duration: 2.0,
    ease: ease_out_cubic,
};

/// Labels fade in once the rectangles are fully grown.
pub const LABEL_FADE_STAGE: Stage = Stage {
    delay: 2.0,
    duration: 0.6,
    ease: ease_in_out_cubic,
};

pub const INITIAL_ZOOM: f32 = 0.01;

/// Interpolated values of all three stages at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    /// Content group scale about the visual center
    pub zoom: f32,
    /// Rectangle growth fraction
    pub grow: f32,
    pub label_opacity: f32,
}

impl AnimationState {
    pub const FINAL: Self = Self {
        zoom: 1.0,
        grow: 1.0,
        label_opacity: 1.0,
    };
}

/// Entrance sequence of one rendered chart. Stages are evaluated independently from the
/// elapsed time, so a late frame never delays a later stage.
#[derive(Debug, Clone, Copy)]
pub struct EntranceAnimation {
    started_at: f64,
    enabled: bool,
}

impl EntranceAnimation {
    pub fn start(now: f64, enabled: bool) -> Self {
        Self {
            started_at: now,
            enabled,
        }
    }

    pub fn state(&self, now: f64) -> AnimationState {
        if !self.enabled {
            return AnimationState::FINAL;
        }

        let elapsed = now - self.started_at;
        let zoom = ZOOM_STAGE.progress(elapsed) as f32;
        AnimationState {
            zoom: INITIAL_ZOOM * (1.0 - zoom) + zoom,
            grow: GROW_STAGE.progress(elapsed) as f32,
            label_opacity: LABEL_FADE_STAGE.progress(elapsed) as f32,
        }
    }

    /// True while any stage still has frames to play.
    pub fn is_animating(&self, now: f64) -> bool {
        let end = [ZOOM_STAGE, GROW_STAGE, LABEL_FADE_STAGE]
            .iter()
            .map(Stage::end)
            .fold(0.0, f64::max);
        self.enabled && now - self.started_at < end
    }

    /// Skip straight to the final frame.
    pub fn finish_immediately(&mut self) {
        self.enabled = false;
    }
}
