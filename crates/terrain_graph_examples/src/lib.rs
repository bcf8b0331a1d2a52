#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{init_tracing, intensity_to_png, load_png_texture, vector_to_png};
