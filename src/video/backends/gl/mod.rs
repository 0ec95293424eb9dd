pub mod resources;
pub mod types;
pub mod visitor;

use super::VisitorFactory;

/// Creates a factory that loads the GL function pointers with `loader` on the
/// render thread, before building a `GLVisitor`. The context behind `loader`
/// must be current on that thread.
pub fn factory<F>(loader: F) -> VisitorFactory
where
    F: FnMut(&'static str) -> *const std::os::raw::c_void + Send + 'static,
{
    Box::new(move || {
        let visitor = unsafe { visitor::GLVisitor::with_loader(loader)? };
        Ok(Box::new(visitor) as Box<dyn super::Visitor>)
    })
}
