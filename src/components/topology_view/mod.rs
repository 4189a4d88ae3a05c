mod component;
mod render;
pub mod state;

pub use component::TopologyView;
