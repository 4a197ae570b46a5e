//! Declarative macros shared by the walker and the run configuration

/// Declare a named register-field enum
///
/// The enum derives `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq` and `Hash`,
/// gets a `name()` with the register field's documented name, an `ALL` slice
/// in declaration order and a `Display` impl that prints the name.
///
/// ```
/// use amdctl::field_enum;
///
/// field_enum! {
///     pub enum LimitField {
///         CurPstateLimit => "CurPstateLimit",
///         PstateMaxVal => "PstateMaxVal",
///     }
/// }
///
/// assert_eq!(LimitField::PstateMaxVal.name(), "PstateMaxVal");
/// assert_eq!(LimitField::ALL.len(), 2);
/// assert_eq!(LimitField::ALL[0].to_string(), "CurPstateLimit");
/// ```
#[macro_export]
macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $str:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant,)*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            pub const fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

/// Log and return early from a walker step when a register transfer fails
///
/// # Example
/// ```ignore
/// let image = try_register!(self.port.read(target), target);
/// ```
#[macro_export]
macro_rules! try_register {
    ($expr:expr, $target:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Register access {} failed: {}", $target, e);
                return Err(e);
            }
        }
    };
}
