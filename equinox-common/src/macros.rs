/// Declares an enum of HAP types, each variant tagged with its short UUID.
///
/// The generated enum serializes as the upper-case hex short UUID (`"3E"`), which is the form
/// used in the accessory database, and deserializes from either the short or the full form.
#[macro_export]
macro_rules! hap_type {
    (
        $( #[ $meta:meta ] )*
        pub enum $ident:ident {
            $( $( #[ $vmeta:meta ] )* $variant:ident = $uuid:literal ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $( #[ $meta ] )*
        pub enum $ident {
            $( $( #[ $vmeta ] )* $variant ),*
        }

        impl $ident {
            pub const ALL: &'static [Self] = &[ $( Self::$variant ),* ];

            pub fn from_short_uuid(uuid: $crate::ShortUuid) -> Option<Self> {
                match uuid.0 {
                    $( $uuid => Some(Self::$variant), )*
                    _ => None,
                }
            }
        }

        impl $crate::HapType for $ident {
            fn short_uuid(&self) -> $crate::ShortUuid {
                match self {
                    $( Self::$variant => $crate::ShortUuid($uuid) ),*
                }
            }
        }

        impl $crate::_serde::Serialize for $ident {
            fn serialize<S: $crate::_serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::core::result::Result<S::Ok, S::Error> {
                serializer.collect_str(&$crate::HapType::short_uuid(self))
            }
        }

        impl<'de> $crate::_serde::Deserialize<'de> for $ident {
            fn deserialize<D: $crate::_serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::core::result::Result<Self, D::Error> {
                use $crate::_serde::de::Error as _;

                let s = <$crate::_compact_str::CompactString as $crate::_serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                let uuid = s.parse::<$crate::ShortUuid>().map_err(D::Error::custom)?;

                Self::from_short_uuid(uuid)
                    .ok_or_else(|| D::Error::custom(concat!("unknown ", stringify!($ident))))
            }
        }
    };
}
