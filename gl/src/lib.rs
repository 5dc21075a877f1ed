mod api;
mod api_glow;
#[cfg(any(test, feature = "headless"))]
mod glsl;
#[cfg(any(test, feature = "headless"))]
pub mod headless;

pub use api::*;
pub use api_glow::GlowApi;
