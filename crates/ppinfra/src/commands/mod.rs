pub mod outputs;
pub mod preview;
pub mod render;
pub mod up;
pub mod validate;
