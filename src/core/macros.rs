//! Macros for declaring closed state enums.

/// Declare a closed status enum together with its `State` implementation.
///
/// Each variant carries its display label. The optional `final:` list marks
/// terminal variants and the optional `transitions:` table lists the legal
/// successors of each variant; anything not listed is an illegal edge.
///
/// The generated enum derives `Copy`, `Eq`, `Hash` and serde, implements
/// `Display` through the label and exposes every variant in `ALL`.
///
/// # Example
///
/// ```
/// use ohada_execution::state_enum;
/// use ohada_execution::core::State;
///
/// state_enum! {
///     pub enum Visa {
///         Soumis => "Soumis",
///         Accorde => "Accordé",
///         Refuse => "Refusé",
///     }
///     final: [Accorde, Refuse]
///     transitions: {
///         Soumis => [Accorde, Refuse],
///     }
/// }
///
/// assert!(Visa::Soumis.can_transition_to(&Visa::Refuse));
/// assert!(!Visa::Refuse.can_transition_to(&Visa::Soumis));
/// assert_eq!(Visa::Accorde.to_string(), "Accordé");
/// assert_eq!(Visa::ALL.len(), 3);
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $label:literal
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
        $(transitions: {
            $($src:ident => [$($dst:ident),* $(,)?]),* $(,)?
        })?
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),*];
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => $label),*
                }
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    #[allow(unreachable_patterns)]
                    _ => false,
                }
            }

            fn can_transition_to(&self, next: &Self) -> bool {
                let _ = next;
                match self {
                    $($(Self::$src => matches!(next, $(Self::$dst)|*),)*)?
                    #[allow(unreachable_patterns)]
                    _ => false,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::core::State::name(self))
            }
        }
    };
}
