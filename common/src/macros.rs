//! Common macros used by the `pngz` crates.

#[macro_export]
/// Return an [`Err`] containing `$err` as a [`Report`](crate::error::Report) with optional `$attachment`s.
macro_rules! bail_attach {
    ($err:expr $(, $($attachment:expr),+)? $(,)?) => {
        return Err($crate::report_attach!($err $(, $($attachment),+)?))?
    };
}

#[macro_export]
/// Ensure `$cond` is `true`, or return an [`Err`] containing `$err` as a [`Report`](crate::error::Report) with optional
/// `$attachment`s.
macro_rules! ensure_attach {
    ($cond:expr, $err:expr $(, $($attachment:expr),+)? $(,)?) => {{
        let cond: bool = $cond;
        if !cond {
            $crate::bail_attach!($err, concat!("condition failed: ", stringify!($cond)) $(, $($attachment),+)?);
        }
    }};
}

#[macro_export]
/// Ensure `$left == $right`, or return an [`Err`] containing `$err` as a [`Report`](crate::error::Report) with both
/// values and optional `$attachment`s.
///
/// Both operands must implement [`Debug`](std::fmt::Debug) and are evaluated exactly once.
macro_rules! ensure_eq_attach {
    ($left:expr, $right:expr, $err:expr $(, $($attachment:expr),+)? $(,)?) => {{
        match (&$left, &$right) {
            (left, right) => {
                if left != right {
                    $crate::bail_attach!(
                        $err,
                        format!(
                            "condition failed: {} == {} (left: {left:?}, right: {right:?})",
                            stringify!($left),
                            stringify!($right),
                        )
                        $(, $($attachment),+)?
                    );
                }
            }
        }
    }};
}

#[macro_export]
/// Ensure `$expr` matches `$pat`, or return an [`Err`] containing `$err` as a [`Report`](crate::error::Report) with
/// optional `$attachment`s.
macro_rules! ensure_matches_attach {
    ($expr:expr, $pat:pat, $err:expr $(, $($attachment:expr),+)? $(,)?) => {
        let $pat = $expr else {
            $crate::bail_attach!($err, concat!("condition failed: let ", stringify!($pat), " = ", stringify!($expr))
                                 $(, $($attachment),+)?);
        };
    };
}

#[macro_export]
/// Create a [`Report`](crate::error::Report) contaning `$err` with optional `$attachment`s.
macro_rules! report_attach {
    ($err:expr $(, $($attachment:expr),+)? $(,)?) => {
        $crate::error::Report::from($err)
            $($(.attach_printable($attachment))+)?
    };
}

#[cfg(test)]
mod test {
    use crate::error::{ReportStack, ReportableError};
    use crate::Result;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("mismatch")]
    struct Mismatch;

    impl ReportableError for Mismatch {
        type Stack = ReportStack;
    }

    fn check_eq(left: u32, right: u32) -> Result<(), Mismatch> {
        ensure_eq_attach!(left, right, Mismatch, "checking test values");
        Ok(())
    }

    #[test]
    fn ensure_eq_attach_ok() {
        check_eq(7, 7).unwrap();
    }

    #[test]
    fn ensure_eq_attach_mismatch() {
        let err = check_eq(7, 8).unwrap_err();
        assert_eq!(err.get_ref(), &Mismatch);
        let debug = format!("{err:?}");
        assert!(debug.contains("left: 7, right: 8"), "{debug}");
        assert!(debug.contains("checking test values"), "{debug}");
    }
}
