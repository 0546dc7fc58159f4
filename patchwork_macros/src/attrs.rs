use darling::{ast::NestedMeta, FromMeta};
use syn::Meta;

#[derive(FromMeta, Default)]
pub(crate) struct TestAttr {
    pub debug: darling::util::Flag,
    pub runtime: Option<RuntimeFn>,
}

/// Path of a function returning the `patchwork::Runtime` the session
/// resolves dotted paths against.
pub(crate) struct RuntimeFn(pub syn::Path);

impl FromMeta for RuntimeFn {
    fn from_list(list: &[NestedMeta]) -> darling::Result<Self> {
        match list {
            [NestedMeta::Meta(Meta::Path(path))] => Ok(RuntimeFn(path.clone())),
            _ => Err(darling::Error::custom(
                "expected a single function path like runtime(crate::runtime)",
            )),
        }
    }
}

impl TestAttr {
    pub fn parse(tokens: proc_macro2::TokenStream) -> darling::Result<Self> {
        Self::from_list(&NestedMeta::parse_meta_list(tokens)?)
    }
}
