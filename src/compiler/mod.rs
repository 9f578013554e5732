//! Compilers
//!
//! - [`CompilerAdapter`]: the contract one external compiler implements
//! - [`Compiler`]: an adapter bound to one source file
//! - [`CompileError`]: a normalized compile failure
//! - [`render`]: the error artifact written in place of the compiled file

mod adapter;
mod builtin;
mod instance;
mod library;
mod normalize;
mod render;
mod target;


pub use adapter::{
    AdapterRef, CompilerAdapter, Family, TransformContext, TransformFailure, Transformed,
};
pub use builtin::{builtin_adapters, CommandAdapter, MarkdownAdapter, SourceMapSpec};
pub use instance::Compiler;
pub use library::{
    load_requirement, ExecutableLoader, LibraryLoader, LibraryRequirement, LoadFailure,
};
pub use normalize::CompileError;
pub use render::{render, strip_colors, ErrorRenderKind};
pub use target::{compiled_dir_for, CompiledTarget};
