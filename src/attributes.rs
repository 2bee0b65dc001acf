// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use bitflags::bitflags;

bitflags! {
    /// Declared access restrictions of a register or field.
    ///
    /// Restrictions only ever accumulate: a field's effective attributes are
    /// the union of its own and those of every register it is drawn from.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Attributes: u8 {
        /// The value may be read but not written.
        const READONLY = 1 << 0;
        /// The value may be written but not read.
        const WRITEONLY = 1 << 1;
        /// The bits carry no meaning and should be neither read nor written.
        const RESERVED = 1 << 2;
    }
}

impl Attributes {
    /// No restrictions.
    pub const NONE: Self = Self::empty();

    #[must_use]
    pub const fn is_readonly(self) -> bool {
        self.contains(Self::READONLY)
    }

    #[must_use]
    pub const fn is_writeonly(self) -> bool {
        self.contains(Self::WRITEONLY)
    }

    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.contains(Self::RESERVED)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Attributes {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Attributes {{ readonly: {}, writeonly: {}, reserved: {} }}",
            self.is_readonly(),
            self.is_writeonly(),
            self.is_reserved(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_accumulates() {
        let attrs = Attributes::READONLY.union(Attributes::RESERVED);
        assert!(attrs.is_readonly());
        assert!(attrs.is_reserved());
        assert!(!attrs.is_writeonly());
        assert!(!Attributes::NONE.is_readonly());
        assert_eq!(Attributes::default(), Attributes::NONE);
    }
}
