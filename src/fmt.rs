//! Crate internal logging macros
//!
//! Forward to `defmt` when `defmt-impl` is enabled, to the `log` facade when `log` is enabled,
//! and expand to nothing otherwise.
#![allow(unused_macros)]

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt-impl")]
            ::defmt::trace!($s $(, $x)*);
            #[cfg(all(feature = "log", not(feature = "defmt-impl")))]
            ::log::trace!($s $(, $x)*);
            #[cfg(not(any(feature = "log", feature = "defmt-impl")))]
            let _ = ($( & $x ),*);
        }
    };
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt-impl")]
            ::defmt::debug!($s $(, $x)*);
            #[cfg(all(feature = "log", not(feature = "defmt-impl")))]
            ::log::debug!($s $(, $x)*);
            #[cfg(not(any(feature = "log", feature = "defmt-impl")))]
            let _ = ($( & $x ),*);
        }
    };
}

pub(crate) use debug;
pub(crate) use trace;
