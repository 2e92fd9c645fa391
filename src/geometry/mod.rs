//! Position and size math for the floating sticky note.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Size {
    pub width: f64,
    pub height: f64,
}

pub(crate) const MIN_STICKY_SIZE: Size = Size {
    width: 200.0,
    height: 150.0,
};

pub(crate) const DEFAULT_STICKY_SIZE: Size = Size {
    width: 300.0,
    height: 300.0,
};

/// Opening position: 30% across the viewport, 50px down.
pub(crate) fn initial_placement(viewport_width: f64) -> Point {
    Point {
        x: viewport_width * 0.3,
        y: 50.0,
    }
}

/// Keep a box of `size` inside `viewport`. A box larger than the viewport
/// is pinned to the top-left edge.
pub(crate) fn clamp_to_viewport(position: Point, size: Size, viewport: Size) -> Point {
    let max_x = (viewport.width - size.width).max(0.0);
    let max_y = (viewport.height - size.height).max(0.0);
    Point {
        x: position.x.clamp(0.0, max_x),
        y: position.y.clamp(0.0, max_y),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Gesture {
    /// Pointer offset from the top-left corner at grab time.
    Drag { grab: Point },
    Resize,
}

/// Geometry of an open sticky overlay plus the gesture in progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StickyFrame {
    pub position: Point,
    pub size: Size,
    pub gesture: Option<Gesture>,
}

impl StickyFrame {
    pub fn open(viewport_width: f64) -> Self {
        Self {
            position: initial_placement(viewport_width),
            size: DEFAULT_STICKY_SIZE,
            gesture: None,
        }
    }

    pub fn start_drag(&mut self, pointer: Point) {
        self.gesture = Some(Gesture::Drag {
            grab: Point {
                x: pointer.x - self.position.x,
                y: pointer.y - self.position.y,
            },
        });
    }

    pub fn start_resize(&mut self) {
        self.gesture = Some(Gesture::Resize);
    }

    /// Apply a pointer move. Returns false when no gesture is active.
    pub fn pointer_moved(&mut self, pointer: Point, viewport: Size) -> bool {
        match self.gesture {
            Some(Gesture::Drag { grab }) => {
                let wanted = Point {
                    x: pointer.x - grab.x,
                    y: pointer.y - grab.y,
                };
                self.position = clamp_to_viewport(wanted, self.size, viewport);
                true
            }
            Some(Gesture::Resize) => {
                self.size = Size {
                    width: (pointer.x - self.position.x).max(MIN_STICKY_SIZE.width),
                    height: (pointer.y - self.position.y).max(MIN_STICKY_SIZE.height),
                };
                true
            }
            None => false,
        }
    }

    pub fn release(&mut self) {
        self.gesture = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Size = Size {
        width: 1000.0,
        height: 800.0,
    };

    fn pt(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    #[test]
    fn test_open_places_overlay() {
        let f = StickyFrame::open(1000.0);
        assert_eq!(f.position, pt(300.0, 50.0));
        assert_eq!(f.size, DEFAULT_STICKY_SIZE);
        assert_eq!(f.gesture, None);
    }

    #[test]
    fn test_drag_keeps_grab_offset() {
        let mut f = StickyFrame::open(1000.0);
        f.start_drag(pt(310.0, 60.0));
        assert!(f.pointer_moved(pt(410.0, 160.0), SCREEN));
        assert_eq!(f.position, pt(400.0, 150.0));
        assert_eq!(f.size, DEFAULT_STICKY_SIZE);

        f.release();
        assert!(!f.pointer_moved(pt(0.0, 0.0), SCREEN));
        assert_eq!(f.position, pt(400.0, 150.0));
    }

    #[test]
    fn test_drag_stays_inside_viewport() {
        let mut f = StickyFrame::open(1000.0);
        f.start_drag(pt(300.0, 50.0));
        f.pointer_moved(pt(-500.0, -20.0), SCREEN);
        assert_eq!(f.position, pt(0.0, 0.0));
        f.pointer_moved(pt(5000.0, 5000.0), SCREEN);
        assert_eq!(f.position, pt(700.0, 500.0));
    }

    #[test]
    fn test_clamp_oversized_box_pins_to_origin() {
        let big = Size {
            width: 2000.0,
            height: 2000.0,
        };
        assert_eq!(clamp_to_viewport(pt(50.0, 50.0), big, SCREEN), pt(0.0, 0.0));
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let mut f = StickyFrame::open(1000.0);
        f.start_resize();
        f.pointer_moved(pt(800.0, 500.0), SCREEN);
        assert_eq!(f.size, Size { width: 500.0, height: 450.0 });

        // Pointer left of / above the corner.
        f.pointer_moved(pt(310.0, 20.0), SCREEN);
        assert_eq!(f.size, MIN_STICKY_SIZE);
        assert_eq!(f.position, pt(300.0, 50.0));
    }
}
