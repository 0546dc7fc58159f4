mod attrs;

use attrs::TestAttr;
use syn::{parse_macro_input, ItemFn};

/// Runs a test inside a `patchwork::Session`.
///
/// The function takes the session as its only argument. The session is
/// started before the body runs and finished after it, even when the body
/// panics: deferred assertions are evaluated and every patch is reversed.
///
/// ```ignore
/// #[patchwork::test]
/// #[test]
/// fn getcwd_is_called(session: patchwork::Session) {
///     session
///         .mock_callable("os", "getcwd")
///         .unwrap()
///         .to_return_value("/")
///         .unwrap();
/// }
/// ```
///
/// `runtime(path::to::function)` makes the session resolve dotted paths
/// against the returned runtime; `debug` prints the expansion.
#[proc_macro_attribute]
pub fn test(
    attribute: proc_macro::TokenStream,
    input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let attr = match TestAttr::parse(attribute.into()) {
        Ok(attr) => attr,
        Err(err) => return err.write_errors().into(),
    };
    let output = test::transform(&attr, parse_macro_input!(input as ItemFn))
        .unwrap_or_else(syn::Error::into_compile_error);
    if attr.debug.is_present() {
        println!("{}", output);
    }
    output.into()
}
