//! Sidebar and annotation-panel visibility, driven by viewport size and
//! edge swipes.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Widths below this are `Mobile`
pub const TABLET_MIN_WIDTH: u32 = 768;
/// Widths at or above this are `Desktop`
pub const DESKTOP_MIN_WIDTH: u32 = 1024;

pub const DEFAULT_EDGE_ZONE_PX: u32 = 50;
pub const DEFAULT_SWIPE_THRESHOLD_PX: u32 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportClass {
    Mobile,
    Tablet,
    Desktop,
}

impl ViewportClass {
    pub fn from_width(width: u32) -> Self {
        if width < TABLET_MIN_WIDTH {
            ViewportClass::Mobile
        } else if width < DESKTOP_MIN_WIDTH {
            ViewportClass::Tablet
        } else {
            ViewportClass::Desktop
        }
    }
}

/// Source of the current viewport size, injected instead of read from a
/// global window object
pub trait ViewportObserver {
    fn viewport(&self) -> Size;
}

impl ViewportObserver for Size {
    fn viewport(&self) -> Size {
        *self
    }
}

/// Tunables for edge-swipe detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureConfig {
    /// Distance from a screen edge within which a swipe may open a panel
    pub edge_zone_px: u32,
    /// Minimum horizontal travel for a swipe
    pub swipe_threshold_px: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            edge_zone_px: DEFAULT_EDGE_ZONE_PX,
            swipe_threshold_px: DEFAULT_SWIPE_THRESHOLD_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Sidebar,
    Annotations,
}

/// Result of a recognized swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelChange {
    Opened(Panel),
    Closed(Panel),
}

#[derive(Debug, Clone)]
pub struct PanelState {
    sidebar_open: bool,
    annotation_panel_open: bool,
    viewport: Size,
    viewport_class: ViewportClass,
    gestures: GestureConfig,
    touch_start: Option<Point>,
}

impl PanelState {
    pub fn new(observer: &impl ViewportObserver, gestures: GestureConfig) -> Self {
        let viewport = observer.viewport();
        let viewport_class = ViewportClass::from_width(viewport.width);
        let mut state = Self {
            sidebar_open: false,
            annotation_panel_open: false,
            viewport,
            viewport_class,
            gestures,
            touch_start: None,
        };
        state.enter_class(viewport_class);
        state
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn annotation_panel_open(&self) -> bool {
        self.annotation_panel_open
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn viewport_class(&self) -> ViewportClass {
        self.viewport_class
    }

    /// Re-read the observer. Panel policy applies only when the class changes.
    pub fn sync_viewport(&mut self, observer: &impl ViewportObserver) -> bool {
        self.viewport = observer.viewport();
        let class = ViewportClass::from_width(self.viewport.width);
        if class == self.viewport_class {
            return false;
        }
        debug!(from = ?self.viewport_class, to = ?class, "viewport class changed");
        self.viewport_class = class;
        self.enter_class(class);
        true
    }

    fn enter_class(&mut self, class: ViewportClass) {
        match class {
            ViewportClass::Desktop => self.sidebar_open = true,
            ViewportClass::Mobile | ViewportClass::Tablet => {
                self.sidebar_open = false;
                self.annotation_panel_open = false;
            }
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub fn toggle_annotation_panel(&mut self) {
        self.annotation_panel_open = !self.annotation_panel_open;
    }

    pub fn set_open(&mut self, panel: Panel, open: bool) {
        match panel {
            Panel::Sidebar => self.sidebar_open = open,
            Panel::Annotations => self.annotation_panel_open = open,
        }
    }

    pub fn is_open(&self, panel: Panel) -> bool {
        match panel {
            Panel::Sidebar => self.sidebar_open,
            Panel::Annotations => self.annotation_panel_open,
        }
    }

    pub fn touch_start(&mut self, at: Point) {
        self.touch_start = Some(at);
    }

    pub fn touch_cancel(&mut self) {
        self.touch_start = None;
    }

    /// Finish a gesture. Returns the panel change, if the gesture was a swipe.
    pub fn touch_end(&mut self, at: Point) -> Option<PanelChange> {
        let start = self.touch_start.take()?;
        let change = self.classify_swipe(start, at)?;
        match change {
            PanelChange::Opened(panel) => self.set_open(panel, true),
            PanelChange::Closed(panel) => self.set_open(panel, false),
        }
        debug!(?change, "edge swipe");
        Some(change)
    }

    fn classify_swipe(&self, start: Point, end: Point) -> Option<PanelChange> {
        let dx = end.x - start.x;
        let dy = end.y - start.y;

        // Vertical scroll intent
        if dy.unsigned_abs() > dx.unsigned_abs() {
            return None;
        }
        if dx.unsigned_abs() < self.gestures.swipe_threshold_px {
            return None;
        }

        let edge = self.gestures.edge_zone_px as i32;
        let right_edge = self.viewport.width as i32 - edge;

        if dx > 0 {
            if self.annotation_panel_open {
                Some(PanelChange::Closed(Panel::Annotations))
            } else if start.x <= edge && !self.sidebar_open {
                Some(PanelChange::Opened(Panel::Sidebar))
            } else {
                None
            }
        } else if self.sidebar_open {
            Some(PanelChange::Closed(Panel::Sidebar))
        } else if start.x >= right_edge && !self.annotation_panel_open {
            Some(PanelChange::Opened(Panel::Annotations))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn width(w: u32) -> Size {
        Size {
            width: w,
            height: 800,
        }
    }

    fn swipe(state: &mut PanelState, from: (i32, i32), to: (i32, i32)) -> Option<PanelChange> {
        state.touch_start(Point {
            x: from.0,
            y: from.1,
        });
        state.touch_end(Point { x: to.0, y: to.1 })
    }

    #[test]
    fn test_breakpoints() {
        assert_eq!(ViewportClass::from_width(767), ViewportClass::Mobile);
        assert_eq!(ViewportClass::from_width(768), ViewportClass::Tablet);
        assert_eq!(ViewportClass::from_width(1023), ViewportClass::Tablet);
        assert_eq!(ViewportClass::from_width(1024), ViewportClass::Desktop);
    }

    #[test]
    fn test_desktop_to_mobile_closes_sidebar() {
        let mut state = PanelState::new(&width(1200), GestureConfig::default());
        assert_eq!(state.viewport_class(), ViewportClass::Desktop);
        assert!(state.sidebar_open());

        state.toggle_annotation_panel();
        assert!(state.sync_viewport(&width(500)));
        assert_eq!(state.viewport_class(), ViewportClass::Mobile);
        assert!(!state.sidebar_open());
        assert!(!state.annotation_panel_open());
    }

    #[test]
    fn test_user_toggle_survives_same_class_resize() {
        let mut state = PanelState::new(&width(500), GestureConfig::default());
        state.toggle_sidebar();
        assert!(!state.sync_viewport(&width(600)));
        assert!(state.sidebar_open());

        assert!(state.sync_viewport(&width(1100)));
        assert!(state.sidebar_open());
    }

    #[test]
    fn test_left_edge_swipe_opens_sidebar() {
        let mut state = PanelState::new(&width(500), GestureConfig::default());
        assert_eq!(
            swipe(&mut state, (10, 300), (120, 310)),
            Some(PanelChange::Opened(Panel::Sidebar))
        );
        assert!(state.sidebar_open());

        // Same gesture again: sidebar already open, annotation panel untouched
        assert_eq!(swipe(&mut state, (10, 300), (120, 310)), None);
        assert!(state.sidebar_open());
        assert!(!state.annotation_panel_open());
    }

    #[test]
    fn test_right_edge_swipe_opens_annotations_and_closes_back() {
        let mut state = PanelState::new(&width(500), GestureConfig::default());
        assert_eq!(
            swipe(&mut state, (480, 300), (350, 300)),
            Some(PanelChange::Opened(Panel::Annotations))
        );
        assert_eq!(
            swipe(&mut state, (200, 300), (320, 300)),
            Some(PanelChange::Closed(Panel::Annotations))
        );
        assert!(!state.annotation_panel_open());
    }

    #[test]
    fn test_leftward_swipe_closes_sidebar() {
        let mut state = PanelState::new(&width(500), GestureConfig::default());
        state.toggle_sidebar();
        assert_eq!(
            swipe(&mut state, (250, 100), (100, 120)),
            Some(PanelChange::Closed(Panel::Sidebar))
        );
    }

    #[test]
    fn test_vertical_and_short_gestures_are_ignored() {
        let mut state = PanelState::new(&width(500), GestureConfig::default());
        assert_eq!(swipe(&mut state, (10, 100), (90, 300)), None);
        assert_eq!(swipe(&mut state, (10, 100), (40, 100)), None);
        // Starting away from the edge
        assert_eq!(swipe(&mut state, (200, 100), (330, 100)), None);
        assert!(!state.sidebar_open());
        assert_eq!(state.touch_end(Point::default()), None);
    }
}
