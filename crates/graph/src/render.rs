use crate::canvas::{Canvas, Rgb};
use diskicon_core::MovingAverage;

/// Baseline row the bars rise from.
const BASELINE: usize = 30;
/// Rightmost column a bar may occupy (column 31 belongs to the border).
const LAST_COLUMN: i32 = 30;
/// Tallest bar in pixels; keeps a 100% bar off the top border.
const MAX_BAR: f32 = 29.0;

/// Render the graph history into a fresh canvas.
///
/// Layout: black background, light-gray border ring, one green bar per
/// history value rising from row 30. Bars are laid out oldest-to-newest
/// starting at column `31 - len`, so the newest value always lands at
/// column 30 and a short history leaves empty space on the left.
pub fn draw_graph(history: &MovingAverage) -> Canvas {
    let mut canvas = Canvas::filled(Rgb::BLACK);
    canvas.outline(Rgb::LIGHT_GRAY);

    let mut x = 31 - history.len() as i32;
    for value in history.iter() {
        if x > LAST_COLUMN {
            break;
        }
        if x >= 0 {
            let bar = (BASELINE as f32 * value.max(0.0) / 100.0).min(MAX_BAR) as usize;
            canvas.vline(x as usize, BASELINE - bar, BASELINE, Rgb::GREEN);
        }
        x += 1;
    }

    canvas
}

/// Tooltip / status text for the current smoothed reading, e.g. `HDD: 37.42%`.
///
/// At most two fractional digits, trailing zeros trimmed.
pub fn status_label(percent: f32) -> String {
    let mut text = format!("{percent:.2}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    format!("HDD: {text}%")
}
