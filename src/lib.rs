#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

mod error;

pub mod acquisition;
pub mod calibration;
pub mod codec;
pub mod config;
pub mod device;
pub mod interface;
pub mod params;
pub mod protocol;
pub mod registers;

pub use crate::acquisition::AcquisitionMode;
pub use crate::calibration::{CalibrationKind, CalibrationReport};
pub use crate::codec::Sample;
pub use crate::config::Config;
pub use crate::device::Ads1256;
pub use crate::error::{Error, Result};
