mod existing;
pub use existing::ExistingOutputStrategy;
