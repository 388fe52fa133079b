pub mod clock;
pub mod framing;
pub mod orbit;
pub mod session;

pub use clock::Clock;
pub use orbit::OrbitControls;
pub use session::{LoadState, ViewerSession};
