// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A macro to define bitflags in a structured way.
#[macro_export]
#[doc(hidden)]
macro_rules! quadmark_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            pub(crate) bits: $ty,
        }

        impl $name {
            /// An empty set of flags.
            pub const EMPTY: Self = Self { bits: 0 };

            /// Creates a new bitflag set from the given raw bits.
            /// Bits not corresponding to any defined flag are kept.
            pub const fn from_bits_truncate(bits: $ty) -> Self {
                Self { bits }
            }

            /// Returns the raw value of the bitflag set.
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// Returns `true` if all flags in `other` are contained within `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Returns `true` if any flag in `other` is contained within `self`.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Inserts the flags in `other` into `self`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }

            /// Removes the flags in `other` from `self`.
            pub fn remove(&mut self, other: Self) {
                self.bits &= !other.bits;
            }

            // Define the individual flag constants
            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*
        }

        // Implement bitwise operators
        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, other: Self) -> Self {
                Self { bits: self.bits & other.bits }
            }
        }

        impl core::ops::Not for $name {
            type Output = Self;
            fn not(self) -> Self {
                Self { bits: !self.bits }
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, other: Self) {
                self.bits |= other.bits;
            }
        }

        // Optimized Debug implementation (no runtime allocations)
        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut bits = self.bits;
                let mut first_flag = true;

                write!(f, "{} {{ ", stringify!($name))?;

                $(
                    if ($flag_value != 0) && (bits & $flag_value) == $flag_value {
                        if !first_flag {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}", stringify!($flag_name))?;
                        bits &= !$flag_value;
                        first_flag = false;
                    }
                )*

                if bits != 0 {
                    if !first_flag {
                        write!(f, " | ")?;
                    }
                    write!(f, "UNKNOWN({:#x})", bits)?;
                    first_flag = false;
                }

                if self.bits == 0 && first_flag {
                    write!(f, "EMPTY")?;
                }

                write!(f, " }}")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::quadmark_bitflags;

    quadmark_bitflags! {
        /// TestFlags for macro verification
        pub struct TestFlags: u32 {
            const FLAG_A = 1 << 0;
            const FLAG_B = 1 << 1;
            const FLAG_C = 1 << 2;
        }
    }

    #[test]
    fn empty_flags() {
        let flags = TestFlags::EMPTY;
        assert_eq!(flags.bits(), 0);
        assert!(flags.contains(TestFlags::EMPTY));
        assert!(!flags.contains(TestFlags::FLAG_A));
        assert_eq!(format!("{:?}", flags), "TestFlags { EMPTY }");
    }

    #[test]
    fn multiple_flags() {
        let flags = TestFlags::FLAG_A | TestFlags::FLAG_C;
        assert_eq!(flags.bits(), 0b101);
        assert!(flags.contains(TestFlags::FLAG_A));
        assert!(!flags.contains(TestFlags::FLAG_B));
        assert_eq!(format!("{:?}", flags), "TestFlags { FLAG_A | FLAG_C }");
    }

    #[test]
    fn from_bits_truncate_keeps_unknown_bits() {
        let flags = TestFlags::from_bits_truncate(0b1001);
        assert_eq!(flags.bits(), 0b1001);
        assert_eq!(format!("{:?}", flags), "TestFlags { FLAG_A | UNKNOWN(0x8) }");
    }

    #[test]
    fn insert_and_remove() {
        let mut flags = TestFlags::FLAG_A;
        flags.insert(TestFlags::FLAG_B);
        assert!(flags.contains(TestFlags::FLAG_A | TestFlags::FLAG_B));
        flags.remove(TestFlags::FLAG_A);
        assert_eq!(flags.bits(), TestFlags::FLAG_B.bits());
    }

    #[test]
    fn intersects() {
        let flags = TestFlags::FLAG_A | TestFlags::FLAG_B;
        assert!(flags.intersects(TestFlags::FLAG_B | TestFlags::FLAG_C));
        assert!(!flags.intersects(TestFlags::FLAG_C));
    }
}
