//! Implementation of multiple devices using serial transfer (Link Cable).
//!
//! Some of the devices are purely virtual and are used for testing purposes
//! (eg: [`buffer`]) while others bridge into the embedding host
//! (eg: [`callback`] and [`stdout`]).

pub mod buffer;
pub mod callback;
pub mod null;
pub mod stdout;
