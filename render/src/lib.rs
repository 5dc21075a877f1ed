mod frame;
mod host;
mod program;
mod scene;
mod shader;
mod vertex;

pub use frame::*;
pub use host::*;
pub use program::*;
pub use scene::*;
pub use shader::*;
pub use vertex::*;
