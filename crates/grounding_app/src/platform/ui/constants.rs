/// Fixed height of one chunk card in the list pane.
pub const CARD_HEIGHT_PX: f64 = 96.0;
/// Characters of chunk or result text shown before eliding.
pub const TEXT_PREVIEW_CHARS: usize = 160;
/// Width of the split container the divider is dragged across.
pub const SPLIT_CONTAINER_WIDTH_PX: f64 = 1_280.0;
pub const RULE: &str = "----------------------------------------";
