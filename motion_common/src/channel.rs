//! Logical channels and digital IO addressing.
//!
//! A [`Channel`] is the only identity callers use for an axis or IO line.
//! Motion axes map one-to-one onto vendor axis numbers. Digital IO channels
//! resolve to a containing word or byte plus a bit position:
//!
//! | Layout | Address |
//! |--------|---------|
//! | `Word { bits_per_slot }` | `slot = ch / bits_per_slot`, `bit = ch % bits_per_slot` |
//! | `Byte` | `byte = ch / 8`, `offset = ch % 8` |
//!
//! Reading a bit reads the whole container and masks; writing a bit is a
//! read-modify-write of the container so sibling bits are left untouched.

use crate::consts::{BITS_PER_BYTE, MAX_BITS_PER_SLOT};
use crate::error::{MotionError, MotionResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical axis or IO channel number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Channel(u32);

impl Channel {
    /// Create a channel from its number.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Channel number.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Channel number as a `usize` for table lookups.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Check the channel against a configured count.
    ///
    /// `kind` names the channel family in the error ("axis", "digital input", ...).
    pub fn check(self, count: usize, kind: &str) -> MotionResult<Self> {
        if self.as_usize() < count {
            Ok(self)
        } else {
            Err(MotionError::invalid(format!(
                "{kind} channel {} out of range (configured {count})",
                self.0
            )))
        }
    }
}

impl From<u32> for Channel {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a backend packs digital IO bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoLayout {
    /// Word-oriented: fixed number of bits per slot (commonly 16).
    Word {
        /// Bits held by one slot
        bits_per_slot: u32,
    },
    /// Byte-oriented: 8 bits per byte address.
    Byte,
}

impl IoLayout {
    /// Bits held by one container.
    #[inline]
    pub const fn width(self) -> u32 {
        match self {
            Self::Word { bits_per_slot } => bits_per_slot,
            Self::Byte => BITS_PER_BYTE,
        }
    }

    /// Validate the layout width.
    pub fn validate(self) -> MotionResult<Self> {
        let width = self.width();
        if width == 0 || width > MAX_BITS_PER_SLOT {
            return Err(MotionError::invalid(format!(
                "bits per slot must be in 1..={MAX_BITS_PER_SLOT} (got {width})"
            )));
        }
        Ok(self)
    }

    /// Resolve a channel to its container address.
    ///
    /// The layout must have passed [`IoLayout::validate`].
    pub const fn address(self, channel: Channel) -> IoAddress {
        let ch = channel.index();
        match self {
            Self::Word { bits_per_slot } => IoAddress::Slot {
                slot: ch / bits_per_slot,
                bit: ch % bits_per_slot,
            },
            Self::Byte => IoAddress::Byte {
                byte: ch / BITS_PER_BYTE,
                offset: ch % BITS_PER_BYTE,
            },
        }
    }
}

/// Container address of a digital IO bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoAddress {
    /// Word-oriented address.
    Slot {
        /// Word index
        slot: u32,
        /// Bit within the word
        bit: u32,
    },
    /// Byte-oriented address.
    Byte {
        /// Byte index
        byte: u32,
        /// Bit within the byte
        offset: u32,
    },
}

impl IoAddress {
    /// Index of the containing word or byte.
    #[inline]
    pub const fn container(self) -> u32 {
        match self {
            Self::Slot { slot, .. } => slot,
            Self::Byte { byte, .. } => byte,
        }
    }

    /// Bit position inside the container.
    #[inline]
    pub const fn bit(self) -> u32 {
        match self {
            Self::Slot { bit, .. } => bit,
            Self::Byte { offset, .. } => offset,
        }
    }

    #[inline]
    const fn mask(self) -> u32 {
        1u32 << self.bit()
    }

    /// Extract this bit from the container value.
    #[inline]
    pub const fn read(self, container: u32) -> bool {
        container & self.mask() != 0
    }

    /// Return the container value with this bit set to `value`.
    #[inline]
    pub const fn write(self, container: u32, value: bool) -> u32 {
        if value {
            container | self.mask()
        } else {
            container & !self.mask()
        }
    }
}
