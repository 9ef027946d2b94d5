//! Error handling primitives for the ADS1256 driver.

use crate::acquisition::AcquisitionMode;

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Any error reported by the underlying bus interface.
    Interface(E),
    /// The provided configuration parameters are invalid.
    InvalidConfig,
    /// The request needs the bus while another acquisition mode still holds it.
    ///
    /// Stop the active acquisition before switching modes or touching registers.
    ModeConflict {
        /// Mode currently holding the chip-select bracket.
        active: AcquisitionMode,
        /// Mode (or `Idle` for register access) the caller asked for.
        requested: AcquisitionMode,
    },
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Interface(err)
    }
}
