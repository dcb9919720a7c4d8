pub mod error;
pub mod format;
pub mod web_gui;

pub use error::AdminError;

#[cfg(all(target_arch = "wasm32", not(feature = "web-gui")))]
compile_error!("the browser build needs the `web-gui` feature: wasm-pack build --target web --features web-gui");

// Re-export WASM functions for wasm-pack
#[cfg(all(target_arch = "wasm32", feature = "web-gui"))]
pub use web_gui::wasm::*;
