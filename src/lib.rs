pub mod app;
pub mod broker;
pub mod ofx;
pub mod sheet;
pub mod tracing;
pub mod util;

extern crate lazy_static;

#[cfg(any(test, feature = "testlib"))]
pub mod testlib;
