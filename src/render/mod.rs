pub mod backend;
pub mod gpu;

pub use backend::RenderBackend;
pub use gpu::Renderer;
