pub const MIN_LEFT_PERCENT: f64 = 30.0;
pub const MAX_LEFT_PERCENT: f64 = 70.0;
pub const DEFAULT_LEFT_PERCENT: f64 = 50.0;

/// Horizontal extent of the split container in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSpan {
    pub left: f64,
    pub width: f64,
}

/// Divider between the page pane and the chunk list.
///
/// Pointer tracking is held only between [`begin_drag`](SplitState::begin_drag)
/// and [`end_drag`](SplitState::end_drag); both report whether the capture
/// state actually changed so the caller can acquire or release exactly once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitState {
    left_width_percent: f64,
    dragging: bool,
}

impl Default for SplitState {
    fn default() -> Self {
        Self {
            left_width_percent: DEFAULT_LEFT_PERCENT,
            dragging: false,
        }
    }
}

impl SplitState {
    pub fn left_width_percent(&self) -> f64 {
        self.left_width_percent
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn begin_drag(&mut self) -> bool {
        let started = !self.dragging;
        self.dragging = true;
        started
    }

    /// Move the divider under the pointer. Ignored unless dragging.
    pub fn drag_to(&mut self, pointer_x: f64, container: ContainerSpan) -> bool {
        if !self.dragging || container.width.is_nan() || container.width <= 0.0 {
            return false;
        }
        let raw = (pointer_x - container.left) / container.width * 100.0;
        if raw.is_nan() {
            return false;
        }
        let next = raw.clamp(MIN_LEFT_PERCENT, MAX_LEFT_PERCENT);
        let changed = next != self.left_width_percent;
        self.left_width_percent = next;
        changed
    }

    pub fn end_drag(&mut self) -> bool {
        let was_dragging = self.dragging;
        self.dragging = false;
        was_dragging
    }
}
