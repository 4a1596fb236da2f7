//! Macros for building action arguments.

/// Build [`Args`](crate::Args) from JSON-convertible expressions.
///
/// Each argument goes through `serde_json::json!`. Single-token arguments
/// (literals, variables, inline `{..}` objects and `[..]` arrays) take the
/// first arm. Otherwise every argument is parsed as an ordinary expression, so
/// `args![-1, user.id, count + 1]` works too. A call mixing inline JSON objects
/// with multi-token expressions needs the expressions parenthesized:
/// `args![{ "k": 1 }, (count + 1)]`.
///
/// # Example
///
/// ```ignore
/// use redux_keys::args;
///
/// let none = args![];
/// let one = args![5];
/// let two = args!["milk", { "qty": 2 }];
/// assert_eq!(two.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:tt),+ $(,)?) => {
        $crate::Args::from_values([$($crate::__private::json!($value)),+])
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::from_values([$($crate::__private::json!($value)),+])
    };
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    #[test]
    fn test_args_macro_shapes() {
        assert!(args![].is_empty());

        let n = 3;
        let built = args![n, "x", { "k": [1, 2] }];
        assert_eq!(built.len(), 3);
        assert_eq!(built.value(0), Some(&json!(3)));
        assert_eq!(built.value(1), Some(&json!("x")));
        assert_eq!(built.value(2), Some(&json!({ "k": [1, 2] })));
    }

    #[test]
    fn test_args_macro_takes_expressions() {
        struct User {
            id: u64,
        }
        let user = User { id: 9 };
        let count = 2;

        let built = args![-1, user.id, count + 1, "done"];
        assert_eq!(built.len(), 4);
        assert_eq!(built.value(0), Some(&json!(-1)));
        assert_eq!(built.value(1), Some(&json!(9)));
        assert_eq!(built.value(2), Some(&json!(3)));
        assert_eq!(built.value(3), Some(&json!("done")));

        let mixed = args![{ "k": 1 }, (count + 1)];
        assert_eq!(mixed.value(1), Some(&json!(3)));
    }
}
