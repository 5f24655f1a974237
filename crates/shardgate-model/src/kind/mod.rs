mod line;
pub use line::LineClass;
