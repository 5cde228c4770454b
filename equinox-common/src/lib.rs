#![cfg_attr(not(test), no_std)]

extern crate alloc;

use core::{fmt::Display, str::FromStr};

pub mod category;
pub mod characteristic;
pub mod macros;
pub mod service;

#[doc(hidden)]
pub use compact_str as _compact_str;
#[doc(hidden)]
pub use serde as _serde;

mod setup_code;
pub use setup_code::*;

/// Something identified by an Apple-assigned HAP type.
pub trait HapType: Copy {
    fn short_uuid(&self) -> ShortUuid;
}

/// HAP type in its short form, eg. `3E` for the accessory information service.
///
/// Short UUIDs expand to full UUIDs by prefixing them onto the Apple base,
/// `0000003E-0000-1000-8000-0026BB765291`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShortUuid(pub u32);

impl ShortUuid {
    pub const BASE_SUFFIX: &'static str = "-0000-1000-8000-0026BB765291";

    pub const fn full(self) -> FullUuid {
        FullUuid(self)
    }
}

impl Display for ShortUuid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

impl FromStr for ShortUuid {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = match s.len() {
            36 => match s.split_at_checked(8) {
                Some((short, suffix)) if suffix.eq_ignore_ascii_case(Self::BASE_SUFFIX) => short,
                _ => return Err("not based on the HAP base uuid"),
            },
            1..=8 => s,
            _ => return Err("expected 1-8 hex digits or a full uuid"),
        };

        if !short.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err("expected hex digits");
        }

        u32::from_str_radix(short, 16)
            .map(ShortUuid)
            .map_err(|_| "expected hex digits")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullUuid(ShortUuid);

impl Display for FullUuid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:08X}{}", self.0.0, ShortUuid::BASE_SUFFIX)
    }
}
