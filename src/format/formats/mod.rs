//! Dataset exporter implementations.

mod coco;
mod yolo;

#[cfg(test)]
mod tests;

pub use coco::CocoFormat;
pub use yolo::YoloFormat;
