use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A window rectangle in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Bounds {
    /// Create a rectangle.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether `other` lies entirely within `self`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// A window as seen by callers. Always a detached copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsWindow {
    /// Unique window id.
    pub id: String,
    /// App this window belongs to. At most one window per app.
    pub app_id: String,
    /// Title bar text.
    pub title: String,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Hidden in the taskbar.
    pub is_minimized: bool,
    /// Filling the usable viewport.
    pub is_maximized: bool,
    /// Stacking order; higher is in front.
    pub z_index: u64,
    /// App-defined launch properties.
    #[serde(default)]
    pub props: Value,
}

impl OsWindow {
    /// Current geometry.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub(crate) fn set_bounds(&mut self, bounds: Bounds) {
        self.x = bounds.x;
        self.y = bounds.y;
        self.width = bounds.width;
        self.height = bounds.height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_wire_names() {
        let window = OsWindow {
            id: "w1".into(),
            app_id: "chat".into(),
            title: "Chat".into(),
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
            is_minimized: false,
            is_maximized: true,
            z_index: 9,
            props: Value::Null,
        };
        let json = serde_json::to_value(&window).unwrap();
        assert_eq!(json["appId"], "chat");
        assert_eq!(json["isMaximized"], true);
        assert_eq!(json["zIndex"], 9);
    }

    #[test]
    fn test_bounds_contains() {
        let outer = Bounds::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains(&Bounds::new(10.0, 10.0, 90.0, 90.0)));
        assert!(!outer.contains(&Bounds::new(10.0, 10.0, 91.0, 10.0)));
    }
}
