pub mod canvas;
pub mod render;

pub use canvas::{Canvas, Rgb, HEIGHT, WIDTH};
pub use render::{draw_graph, status_label};
