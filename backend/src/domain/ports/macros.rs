//! Helper macro generating port error enums with snake_case constructors.
//!
//! Each variant becomes a `thiserror` variant plus a constructor taking
//! `impl Into<T>` for every field.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for the generated constructors.
    define_port_error! {
        pub enum SamplePortError {
            Missing => "document is missing",
            Cast { path: String, value: String } => "cannot cast {value} for {path}",
            Overflow { limit: u64 } => "limit {limit} exceeded",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(SamplePortError::missing().to_string(), "document is missing");
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = SamplePortError::cast("price", "cheap");
        assert_eq!(err.to_string(), "cannot cast cheap for price");
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = SamplePortError::overflow(100_u64);
        assert_eq!(err, SamplePortError::Overflow { limit: 100 });
    }
}
