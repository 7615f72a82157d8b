/// Build call-site [`Args`](crate::Args).
///
/// Positional values come first, separated by commas; keyword values follow
/// a `;` as `name = value`. The `;` may be omitted when there are only
/// keywords.
///
/// # Examples
///
/// ```
/// use templatify::{args, Args};
///
/// assert_eq!(args![], Args::new());
/// assert_eq!(args![1, "two"], Args::new().arg(1).arg("two"));
/// assert_eq!(args!(name = "World"), Args::new().kwarg("name", "World"));
/// assert_eq!(
///     args![1; name = "World", n = 2],
///     Args::new().arg(1).kwarg("name", "World").kwarg("n", 2),
/// );
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    (; $($key:ident = $value:expr),* $(,)?) => {
        $crate::Args::new()
            $(.kwarg(::core::stringify!($key), $value))*
    };
    ($($key:ident = $value:expr),+ $(,)?) => {
        $crate::args!(; $($key = $value),+)
    };
    ($($arg:expr),+ ; $($key:ident = $value:expr),* $(,)?) => {
        $crate::Args::new()
            $(.arg($arg))+
            $(.kwarg(::core::stringify!($key), $value))*
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::Args::new()
            $(.arg($arg))+
    };
}

#[cfg(test)]
mod tests {
    use crate::{Args, Value};

    #[test]
    fn test_args() {
        assert_eq!(args!(), Args::new());

        // Only positional
        assert_eq!(args!(1), Args::new().arg(1));
        assert_eq!(args!(1, "2",), Args::new().arg(1).arg("2"));

        // Only keywords
        assert_eq!(args!(a = 1), Args::new().kwarg("a", 1));
        assert_eq!(args!(; a = 1, b = "x"), Args::new().kwarg("a", 1).kwarg("b", "x"));

        // Mixed
        assert_eq!(
            args!(Value::None, 2.5; a = true),
            Args::new().arg(Value::None).arg(2.5).kwarg("a", true)
        );
    }
}
