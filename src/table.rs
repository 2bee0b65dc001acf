// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Deduplicated, address-sorted register tables.
//!
//! A register table is the single source of truth for where a register's
//! raw word lives in a caller-supplied buffer: the word of the register at
//! table position `i` is `raw[i]`.

use alloc::borrow::Cow;
use alloc::collections::BTreeMap;
use alloc::collections::btree_map::Entry;
use alloc::vec::Vec;
use core::ops::Range;

use crate::content::AnyContent;
use crate::datatype::{Datatype, Unsigned};
use crate::error::{AccessError, SchemaError};
use crate::register::Register;

/// The deduplicated, address-ascending list of registers referenced by a
/// set of fields.
///
/// All registers of a table share one storage datatype, which is the
/// element type of the raw buffers the table indexes.
///
/// ```rust
/// use regfld::{Content, Datatype, Register, RegisterTable};
///
/// const A: Register = Register::new(4, 0, Datatype::U8);
/// const B: Register = Register::new(1, 0, Datatype::U8);
///
/// let table = RegisterTable::build([Content::new(&A, 0, 3), Content::whole(&B)])?;
/// assert_eq!(table.addresses().collect::<Vec<_>>(), [1, 4]);
/// assert_eq!(table.index_of(&A), Some(1));
/// # Ok::<(), regfld::SchemaError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterTable<'a> {
    registers: Cow<'a, [Register]>,
}

impl<'a> RegisterTable<'a> {
    /// Collects the registers underlying `fields` (every member register of
    /// a multi-register field) into a table.
    pub fn build<'f, I>(fields: I) -> Result<RegisterTable<'static>, SchemaError>
    where
        I: IntoIterator,
        I::Item: Into<AnyContent<'f>>,
    {
        let mut registers = Vec::new();
        for field in fields {
            registers.extend(field.into().registers().copied());
        }
        RegisterTable::from_registers(registers)
    }

    /// Deduplicates and sorts `registers` into a table.
    ///
    /// Registers sharing an address must be identical; all registers must
    /// share one storage datatype.
    pub fn from_registers<I>(registers: I) -> Result<RegisterTable<'static>, SchemaError>
    where
        I: IntoIterator<Item = Register>,
    {
        let mut by_address = BTreeMap::new();
        let mut datatype: Option<Datatype> = None;
        for register in registers {
            let expected = *datatype.get_or_insert(register.datatype());
            if register.datatype() != expected {
                return Err(SchemaError::MixedDatatypes {
                    address: register.address(),
                    expected,
                    found: register.datatype(),
                });
            }
            match by_address.entry(register.address()) {
                Entry::Vacant(entry) => {
                    entry.insert(register);
                }
                Entry::Occupied(entry) => {
                    if *entry.get() != register {
                        return Err(SchemaError::ConflictingRegister {
                            address: register.address(),
                        });
                    }
                }
            }
        }

        let table = RegisterTable {
            registers: Cow::Owned(by_address.into_values().collect()),
        };
        #[cfg(feature = "defmt")]
        defmt::trace!(
            "register table: {} registers, datatype {}",
            table.len(),
            table.datatype()
        );
        Ok(table)
    }

    /// Checks that `registers` are strictly ascending by address and share
    /// one storage datatype, as a table requires.
    pub const fn check_sorted(registers: &[Register]) -> Result<(), SchemaError> {
        let mut i = 1;
        while i < registers.len() {
            let (prev, next) = (&registers[i - 1], &registers[i]);
            if next.datatype() as u8 != prev.datatype() as u8 {
                return Err(SchemaError::MixedDatatypes {
                    address: next.address(),
                    expected: prev.datatype(),
                    found: next.datatype(),
                });
            }
            if next.address() <= prev.address() {
                return Err(SchemaError::UnsortedRegisters {
                    address: next.address(),
                });
            }
            i += 1;
        }
        Ok(())
    }

    /// Wraps an already sorted, deduplicated list of registers without
    /// copying it.
    pub const fn try_from_sorted(registers: &'a [Register]) -> Result<Self, SchemaError> {
        if let Err(err) = Self::check_sorted(registers) {
            return Err(err);
        }
        Ok(Self {
            registers: Cow::Borrowed(registers),
        })
    }

    /// Like [`RegisterTable::try_from_sorted`], but panics if the registers
    /// are not strictly ascending or mix datatypes; in a const item this is
    /// a compile error.
    #[must_use]
    pub const fn from_sorted(registers: &'a [Register]) -> Self {
        if let Err(err) = Self::check_sorted(registers) {
            panic!("{}", err.message());
        }
        Self {
            registers: Cow::Borrowed(registers),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    #[must_use]
    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    /// The storage datatype shared by every register, or `None` for an
    /// empty table.
    #[must_use]
    pub fn datatype(&self) -> Option<Datatype> {
        self.registers.first().map(Register::datatype)
    }

    /// Position of `register` in the table, i.e. the index of its word in a
    /// raw buffer.
    #[must_use]
    pub fn index_of(&self, register: &Register) -> Option<usize> {
        self.index_of_address(register.address())
            .filter(|&index| self.registers[index].same_location(register))
    }

    /// Position of the register at `address`.
    #[must_use]
    pub fn index_of_address(&self, address: u64) -> Option<usize> {
        self.registers
            .binary_search_by_key(&address, Register::address)
            .ok()
    }

    #[must_use]
    pub fn contains(&self, register: &Register) -> bool {
        self.index_of(register).is_some()
    }

    /// Addresses in table order.
    pub fn addresses(&self) -> impl Iterator<Item = u64> + '_ {
        self.registers.iter().map(Register::address)
    }

    /// Addresses in table order, converted to the bus address type `A`.
    pub fn address_array<A: Unsigned>(&self) -> Result<Vec<A>, SchemaError> {
        let limit = A::DATATYPE.value_mask();
        self.addresses()
            .map(|address| {
                if address > limit {
                    return Err(SchemaError::AddressOutOfRange {
                        address,
                        datatype: A::DATATYPE,
                    });
                }
                Ok(A::from_bits(address))
            })
            .collect()
    }

    /// Verifies that every register `field` draws from is in the table.
    pub fn check<'f>(&self, field: impl Into<AnyContent<'f>>) -> Result<(), SchemaError> {
        field
            .into()
            .registers()
            .find(|register| !self.contains(register))
            .map_or(Ok(()), |register| {
                Err(SchemaError::RegisterNotInTable {
                    address: register.address(),
                })
            })
    }

    /// Partitions the table into maximal runs of consecutive addresses,
    /// in ascending address order.
    #[must_use]
    pub fn group_contiguous(&self) -> Vec<ContiguousGroup<'_>> {
        let mut groups = Vec::new();
        let mut start = 0;
        for index in 1..=self.registers.len() {
            let breaks = self.registers.get(index).is_none_or(|next| {
                self.registers[index - 1].address().checked_add(1) != Some(next.address())
            });
            if breaks && index > start {
                groups.push(ContiguousGroup {
                    start,
                    registers: &self.registers[start..index],
                });
                start = index;
            }
        }
        #[cfg(feature = "defmt")]
        defmt::trace!(
            "{} registers in {} contiguous groups",
            self.len(),
            groups.len()
        );
        groups
    }

    /// A raw buffer holding every register's reset value, in table order.
    pub fn reset_buffer<W: Unsigned>(&self) -> Result<Vec<W>, AccessError> {
        if let Some(register) = self.datatype()
            && register != W::DATATYPE
        {
            return Err(AccessError::WordMismatch {
                register,
                word: W::DATATYPE,
            });
        }
        Ok(self
            .registers
            .iter()
            .map(|register| W::from_bits(register.reset_value()))
            .collect())
    }

    #[must_use]
    pub fn into_owned(self) -> RegisterTable<'static> {
        RegisterTable {
            registers: Cow::Owned(self.registers.into_owned()),
        }
    }
}

/// A maximal run of registers with consecutive addresses, i.e. registers
/// that may be transferred as one burst.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContiguousGroup<'t> {
    start: usize,
    registers: &'t [Register],
}

impl<'t> ContiguousGroup<'t> {
    /// Table position of the group's first register.
    #[must_use]
    pub fn start_index(&self) -> usize {
        self.start
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    // Groups are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn registers(&self) -> &'t [Register] {
        self.registers
    }

    #[must_use]
    pub fn first_address(&self) -> u64 {
        self.registers[0].address()
    }

    /// Table positions covered by the group; slicing a raw buffer with this
    /// range yields the group's words.
    #[must_use]
    pub fn index_range(&self) -> Range<usize> {
        self.start..self.start + self.registers.len()
    }

    pub fn addresses(&self) -> impl Iterator<Item = u64> + 't {
        self.registers.iter().map(Register::address)
    }
}
