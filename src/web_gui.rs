pub mod api;
pub mod app;
pub mod records;
pub mod response;
pub mod state;
pub mod ui;
#[cfg(not(target_arch = "wasm32"))]
pub mod http;
#[cfg(all(target_arch = "wasm32", feature = "web-gui"))]
pub mod wasm_api;
#[cfg(all(target_arch = "wasm32", feature = "web-gui"))]
pub mod wasm;

pub use app::{AdminOperation, AdminView, Effect, ViewAction};
pub use records::{EventRecord, QrEventRecord, ResidentId, ResidentRecord};
pub use state::{AdminSettings, Tab};
