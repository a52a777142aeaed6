//! Region-of-interest editing: the shape collection and the pointer state machine.

mod drawing;
mod store;

pub use drawing::{
    DrawingContext, DrawingMachine, DrawingState, PointerButton, PointerCapture, PointerEvent,
};
pub use store::RoiStore;
