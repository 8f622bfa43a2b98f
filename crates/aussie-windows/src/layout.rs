use crate::window::Bounds;

/// Viewport and sizing rules for window placement.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowLayout {
    /// Viewport width.
    pub viewport_width: f64,
    /// Viewport height.
    pub viewport_height: f64,
    /// Gap kept between windows and the viewport edges.
    pub margin: f64,
    /// Height reserved at the bottom for the taskbar.
    pub taskbar_height: f64,
    /// Offset between successively opened windows.
    pub cascade_step: f64,
    /// Width of a newly opened window.
    pub default_width: f64,
    /// Height of a newly opened window.
    pub default_height: f64,
    /// Smallest width a resize may produce.
    pub min_width: f64,
    /// Smallest height a resize may produce.
    pub min_height: f64,
}

impl Default for WindowLayout {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 800.0,
            margin: 8.0,
            taskbar_height: 48.0,
            cascade_step: 32.0,
            default_width: 720.0,
            default_height: 480.0,
            min_width: 320.0,
            min_height: 240.0,
        }
    }
}

impl WindowLayout {
    /// The area windows may occupy.
    ///
    /// Never smaller than the minimum window size, so a tiny viewport
    /// still yields a placeable area anchored at the margin.
    #[must_use]
    pub fn usable_area(&self) -> Bounds {
        let width = (self.viewport_width - 2.0 * self.margin).max(self.min_width);
        let height =
            (self.viewport_height - self.taskbar_height - 2.0 * self.margin).max(self.min_height);
        Bounds::new(self.margin, self.margin, width, height)
    }

    /// Clamp `bounds` into the usable area.
    ///
    /// Size is limited to `[min, usable]` first, then the position is
    /// shifted so the whole rectangle fits.
    #[must_use]
    pub fn clamp(&self, bounds: Bounds) -> Bounds {
        let area = self.usable_area();
        let width = bounds.width.clamp(self.min_width, area.width);
        let height = bounds.height.clamp(self.min_height, area.height);
        let x = bounds.x.clamp(area.x, area.right() - width);
        let y = bounds.y.clamp(area.y, area.bottom() - height);
        Bounds::new(x, y, width, height)
    }

    /// Bounds for the `n`th cascaded window, or `None` once the cascade
    /// would push a default-sized window past the usable area.
    #[must_use]
    pub fn cascade(&self, n: u32) -> Option<Bounds> {
        let area = self.usable_area();
        let offset = self.cascade_step * f64::from(n);
        let bounds = Bounds::new(
            area.x + offset,
            area.y + offset,
            self.default_width.min(area.width),
            self.default_height.min(area.height),
        );
        area.contains(&bounds).then_some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_area_excludes_margin_and_taskbar() {
        let area = WindowLayout::default().usable_area();
        assert_eq!(area, Bounds::new(8.0, 8.0, 1264.0, 736.0));
    }

    #[test]
    fn test_clamp_pulls_window_inside() {
        let layout = WindowLayout::default();
        let clamped = layout.clamp(Bounds::new(-50.0, 5000.0, 400.0, 300.0));
        assert_eq!(clamped.x, 8.0);
        assert_eq!(clamped.bottom(), 744.0);
        assert!(layout.usable_area().contains(&clamped));
    }

    #[test]
    fn test_clamp_enforces_size_limits() {
        let layout = WindowLayout::default();
        let tiny = layout.clamp(Bounds::new(100.0, 100.0, 10.0, 10.0));
        assert_eq!((tiny.width, tiny.height), (320.0, 240.0));

        let huge = layout.clamp(Bounds::new(0.0, 0.0, 9999.0, 9999.0));
        assert_eq!(huge, layout.usable_area());
    }

    #[test]
    fn test_cascade_offsets_then_wraps() {
        let layout = WindowLayout::default();
        let first = layout.cascade(0).unwrap();
        let second = layout.cascade(1).unwrap();
        assert_eq!(second.x - first.x, 32.0);
        assert_eq!(second.y - first.y, 32.0);
        // 736 - 480 = 256 of vertical room, so step 9 no longer fits.
        assert!(layout.cascade(8).is_some());
        assert!(layout.cascade(9).is_none());
    }
}
