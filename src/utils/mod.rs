//! Commonly used utilities like handles, pools and double buffers.

#[macro_use]
pub mod handle;
pub mod double_buf;
pub mod handle_pool;
pub mod object_pool;

pub mod prelude {
    pub use super::double_buf::DoubleBuf;
    pub use super::handle::{Handle, HandleIndex, HandleLike};
    pub use super::handle_pool::HandlePool;
    pub use super::object_pool::ObjectPool;
}
