use crate::mocks::Interception;
use crate::patch::Patch;
use crate::target::check_private;
use crate::{Attributes, Error, IntoTarget, MockOptions, Result, Session, Target, Value};

impl Session {
    /// Replaces a non-callable attribute with `value` until the session
    /// finishes.
    pub fn patch_attribute(
        &self,
        target: impl IntoTarget,
        attribute: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        self.patch_attribute_with(target, attribute, value, MockOptions::default())
    }

    pub fn patch_attribute_with(
        &self,
        target: impl IntoTarget,
        attribute: &str,
        value: impl Into<Value>,
        options: MockOptions,
    ) -> Result<()> {
        self.ensure_active()?;
        let target = target.into_target(self.runtime())?;
        check_private(attribute, options.allow_private)?;
        check_patchable(&target, attribute)?;
        let patch = Patch::apply(&target, attribute, value.into())?;
        self.with_state(|state| {
            state.mocks.push(Interception::Patch(patch));
            Ok(())
        })
    }
}

fn check_patchable(target: &Target, attribute: &str) -> Result<()> {
    if let Target::StrictMock(mock) = target {
        return match mock.template_callable(attribute) {
            Some(true) => Err(Error::Usage(format!(
                "Attribute '{attribute}' of {} is callable on its template. \
                 Use mock_callable() instead.",
                target.repr()
            ))),
            None if mock.template().is_some() => Err(Error::NonExistentAttribute {
                mock: target.repr(),
                attribute: attribute.to_string(),
            }),
            _ => Ok(()),
        };
    }
    match target.get_attr(attribute)? {
        Value::Class(class) => Err(Error::Usage(format!(
            "Attribute '{attribute}' of {} is the class {}. Use mock_constructor() instead.",
            target.repr(),
            class.qualified_name()
        ))),
        value if value.is_callable() => Err(Error::Usage(format!(
            "Attribute '{attribute}' of {} is callable. Use mock_callable() instead.",
            target.repr()
        ))),
        _ => Ok(()),
    }
}
