/// PixelPro core: everything except the window
///
/// - `inference` - pretrained EDSR models behind the `Upscaler` trait
/// - `gallery` - timestamped generation directories and the generation flow
/// - `compare` - aligned crops for side-by-side comparison
/// - `state` - page state driven by the UI
/// - `config` / `error` - settings file and error types

pub mod compare;
pub mod config;
pub mod error;
pub mod gallery;
pub mod inference;
pub mod state;
