// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use crate::attributes::Attributes;
use crate::datatype::{Datatype, low_mask};

/// Facts derived from a register, a bitfield or a multi-register bitfield.
///
/// Every derivation is a pure function of the (already validated) schema
/// element.
pub trait Field {
    /// Number of bits the element covers.
    fn width(&self) -> u32;

    /// Position of the lowest covered bit. Registers and multi-register
    /// fields always start at bit 0.
    fn offset(&self) -> u32 {
        0
    }

    /// Run of `width` ones positioned at `offset`.
    fn mask(&self) -> u64 {
        low_mask(self.width()) << self.offset()
    }

    /// The datatype values of the element are read and written as.
    fn datatype(&self) -> Datatype;

    /// The effective (resolved) access restrictions.
    fn attributes(&self) -> Attributes;

    fn is_readonly(&self) -> bool {
        self.attributes().is_readonly()
    }

    fn is_writeonly(&self) -> bool {
        self.attributes().is_writeonly()
    }

    fn is_reserved(&self) -> bool {
        self.attributes().is_reserved()
    }
}
