use crate::{Error, Result};

type Check = Box<dyn FnOnce() -> Result<()> + Send>;

/// Checks registered while a test runs and evaluated when it ends.
#[derive(Default)]
pub(crate) struct Assertions(Vec<Check>);

impl Assertions {
    pub fn register(&mut self, check: impl FnOnce() -> Result<()> + Send + 'static) {
        self.0.push(Box::new(check));
    }

    /// Runs every check in registration order and returns all failures.
    /// The sink is empty afterwards.
    pub fn evaluate(&mut self) -> Vec<Error> {
        self.0
            .drain(..)
            .filter_map(|check| check().err())
            .collect()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
