//! # What is This?
//!
//! Pastel is the render backend layer of a small 3D engine. Scene code records
//! passes and batches into a `RenderBackendService`, which keeps dirty flags
//! on everything it holds and converts only the changed parts into a stream
//! of submit commands once per tick. The stream lives in a double-buffered
//! `Frame`, handed over to a dedicated render thread that owns the actual
//! graphics API executor.
//!
//! ```rust,ignore
//! use pastel::prelude::*;
//!
//! let mut service = RenderBackendService::new(Settings::headless());
//! service.open()?;
//!
//! let mesh = service.create_mesh(MeshParams::default(), vec![0; 24]);
//! service.begin_pass("RenderPass");
//! service.begin_render_batch("b1");
//! service.set_matrix(MatrixType::Model, &Matrix4::identity());
//! service.add_mesh(&mesh, 0);
//! service.end_render_batch();
//! service.end_pass();
//!
//! service.on_update()?;
//! service.on_close();
//! ```

#[macro_use]
extern crate log;
#[macro_use]
extern crate failure;

#[macro_use]
pub mod utils;
pub mod errors;
pub mod math;
pub mod settings;
pub mod video;

pub mod prelude {
    pub use crate::math::prelude::*;
    pub use crate::settings::{DirtyDispatch, RenderApi, Settings};
    pub use crate::utils::prelude::*;
    pub use crate::video::prelude::*;
}
